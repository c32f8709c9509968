// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding box.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A box whose faces are parallel to the coordinate planes.
///
/// A freshly created box is void: it contains nothing until the first point
/// is added.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl Aabb {
    /// Creates a void box.
    pub fn new() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    /// Creates a box from two opposite corners (in any order).
    pub fn from_corners(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Creates the smallest box containing all `points`.
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut aabb = Self::new();
        for p in points {
            aabb.add_point(p);
        }
        aabb
    }

    /// Returns `true` if no point has been added.
    #[inline]
    pub fn is_void(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Resets the box to the void state.
    pub fn set_void(&mut self) {
        *self = Self::new();
    }

    #[inline]
    pub fn min(&self) -> &Point3<f64> {
        &self.min
    }

    #[inline]
    pub fn max(&self) -> &Point3<f64> {
        &self.max
    }

    /// Expands the box to include a point.
    #[inline]
    pub fn add_point(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Expands the box to include another box.
    pub fn add(&mut self, other: &Aabb) {
        if other.is_void() {
            return;
        }
        self.add_point(&other.min);
        self.add_point(&other.max);
    }

    /// Grows the box by `|delta|` in every direction. Void boxes stay void.
    pub fn enlarge(&mut self, delta: f64) {
        if self.is_void() {
            return;
        }
        let d = Vector3::repeat(delta.abs());
        self.min -= d;
        self.max += d;
    }

    /// Center of the box, or `None` when void.
    pub fn center(&self) -> Option<Point3<f64>> {
        if self.is_void() {
            return None;
        }
        Some(nalgebra::center(&self.min, &self.max))
    }

    /// Half size along each coordinate axis, or `None` when void.
    pub fn half_extents(&self) -> Option<Vector3<f64>> {
        if self.is_void() {
            return None;
        }
        Some((self.max - self.min) * 0.5)
    }

    /// Returns `true` if the point lies strictly outside the box.
    /// Every point is outside a void box.
    pub fn is_out_point(&self, p: &Point3<f64>) -> bool {
        if self.is_void() {
            return true;
        }
        p.x < self.min.x
            || p.x > self.max.x
            || p.y < self.min.y
            || p.y > self.max.y
            || p.z < self.min.z
            || p.z > self.max.z
    }

    /// Returns `true` if the two boxes are disjoint.
    pub fn is_out(&self, other: &Aabb) -> bool {
        if self.is_void() || other.is_void() {
            return true;
        }
        other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y
            || other.max.z < self.min.z
            || other.min.z > self.max.z
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new()
    }
}
