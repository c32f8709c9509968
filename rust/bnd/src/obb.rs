// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Oriented bounding box.
//!
//! An [`Obb`] is a center, three orthonormal axes and one half extent per
//! axis. It is rebuilt from point clouds (see [`Obb::rebuild`]), merged with
//! other boxes or points, and answers overlap queries with the separating
//! axis theorem without touching the underlying geometry.
//!
//! A box with negative half extents is *void* (contains nothing). The
//! canonical void box has all three half extents equal to `-1`.

use std::fmt;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::error::{Error, Result};
use crate::fit::{self, Frame};
use crate::precision::ANGULAR;

/// Cosine above which two unit axes are treated as parallel.
const PARALLEL_COS: f64 = 1.0 - 1e-12;

/// Relative slack applied to point containment so that points lying on the
/// boundary (up to rounding) count as inside.
const CONTAINMENT_SLACK: f64 = 1e-12;

/// Allowed deviation from unit length and from orthogonality of explicit axes.
const ORTHOGONALITY_TOLERANCE: f64 = 1e-9;

/// Oriented bounding box.
///
/// # Example
///
/// ```
/// use nalgebra::Point3;
/// use sewkit_bnd::Obb;
///
/// let points = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(2.0, 2.0, 0.1),
/// ];
/// let obb = Obb::from_points(&points, None, false);
/// assert!(!obb.is_void());
/// assert!(points.iter().all(|p| !obb.is_out_point(p)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obb {
    center: Point3<f64>,
    axes: [Vector3<f64>; 3],
    half_extents: [f64; 3],
    is_aabb: bool,
}

impl Obb {
    /// Creates a void box.
    pub fn new() -> Self {
        Self {
            center: Point3::origin(),
            axes: fit::world_frame(),
            half_extents: [-1.0; 3],
            is_aabb: false,
        }
    }

    /// Creates a box from explicit components.
    ///
    /// Axis directions are normalized. Returns an error if an axis has zero
    /// length, the axes are not pairwise orthogonal, or a half extent is
    /// negative.
    pub fn from_components(
        center: Point3<f64>,
        x_dir: Vector3<f64>,
        y_dir: Vector3<f64>,
        z_dir: Vector3<f64>,
        x_half: f64,
        y_half: f64,
        z_half: f64,
    ) -> Result<Self> {
        let mut axes = [x_dir, y_dir, z_dir];
        for (i, axis) in axes.iter_mut().enumerate() {
            *axis = axis.try_normalize(ANGULAR).ok_or(Error::DegenerateAxis(i))?;
        }
        let obb = Self {
            center,
            axes,
            half_extents: [x_half, y_half, z_half],
            is_aabb: false,
        };
        obb.check_components()?;
        Ok(obb)
    }

    /// Orthonormal axes and non-negative half extents.
    fn check_components(&self) -> Result<()> {
        for axis in &self.axes {
            if (axis.norm() - 1.0).abs() > ORTHOGONALITY_TOLERANCE {
                return Err(Error::NonOrthogonalAxes);
            }
        }
        for (i, j) in [(0, 1), (0, 2), (1, 2)] {
            if self.axes[i].dot(&self.axes[j]).abs() > ORTHOGONALITY_TOLERANCE {
                return Err(Error::NonOrthogonalAxes);
            }
        }
        for (axis, &value) in self.half_extents.iter().enumerate() {
            if value.is_nan() || value < 0.0 {
                return Err(Error::NegativeHalfExtent { axis, value });
            }
        }
        Ok(())
    }

    /// Creates a box equal to an axis-aligned box. A void input gives a void
    /// box.
    pub fn from_aabb(aabb: &Aabb) -> Self {
        match (aabb.center(), aabb.half_extents()) {
            (Some(center), Some(half)) => Self {
                center,
                axes: fit::world_frame(),
                half_extents: [half.x, half.y, half.z],
                is_aabb: true,
            },
            _ => Self::new(),
        }
    }

    /// Creates a box covering `points`. See [`Obb::rebuild`].
    pub fn from_points(points: &[Point3<f64>], tolerances: Option<&[f64]>, optimal: bool) -> Self {
        let mut obb = Self::new();
        obb.rebuild(points, tolerances, optimal);
        obb
    }

    /// Recomputes the box so that it covers every point.
    ///
    /// With `tolerances` (one per point) the box also covers the sphere of
    /// that radius around each point. `optimal` widens the frame search for
    /// a tighter box at a higher cost; its volume never exceeds the volume of
    /// the default search for the same input.
    ///
    /// No points give a void box; a single distinct point gives an
    /// axis-aligned box at that point.
    ///
    /// # Panics
    ///
    /// Panics if `tolerances` has a different length than `points`.
    pub fn rebuild(&mut self, points: &[Point3<f64>], tolerances: Option<&[f64]>, optimal: bool) {
        self.refit(points, tolerances, optimal, &[]);
    }

    fn refit(
        &mut self,
        points: &[Point3<f64>],
        tolerances: Option<&[f64]>,
        optimal: bool,
        seeds: &[Frame],
    ) {
        match fit::fit_points(points, tolerances, optimal, seeds) {
            Some(fit) => {
                self.center = fit.center;
                self.axes = fit.axes;
                self.half_extents = fit.half_extents;
                self.is_aabb = fit.axis_aligned;
            }
            None => self.set_void(),
        }
    }

    /// Returns `true` if the box is void.
    #[inline]
    pub fn is_void(&self) -> bool {
        self.half_extents.iter().any(|&h| h < 0.0)
    }

    /// Makes the box void.
    pub fn set_void(&mut self) {
        *self = Self::new();
    }

    /// Whether the box is known to be axis aligned. This is a hint set by
    /// the constructors, not derived from the axes.
    #[inline]
    pub fn is_aabb(&self) -> bool {
        self.is_aabb
    }

    /// Overrides the axis-aligned hint.
    pub fn set_aabb(&mut self, flag: bool) {
        self.is_aabb = flag;
    }

    /// Center of the box.
    #[inline]
    pub fn center(&self) -> &Point3<f64> {
        &self.center
    }

    /// Moves the box without changing its axes or extents.
    pub fn set_center(&mut self, center: Point3<f64>) {
        self.center = center;
    }

    /// The three unit axes, in x, y, z order.
    #[inline]
    pub fn axes(&self) -> &[Vector3<f64>; 3] {
        &self.axes
    }

    /// First axis.
    #[inline]
    pub fn x_axis(&self) -> &Vector3<f64> {
        &self.axes[0]
    }

    /// Second axis.
    #[inline]
    pub fn y_axis(&self) -> &Vector3<f64> {
        &self.axes[1]
    }

    /// Third axis.
    #[inline]
    pub fn z_axis(&self) -> &Vector3<f64> {
        &self.axes[2]
    }

    /// Half extents along the three axes. Negative for a void box.
    #[inline]
    pub fn half_extents(&self) -> [f64; 3] {
        self.half_extents
    }

    /// Half extent along the first axis.
    #[inline]
    pub fn x_half(&self) -> f64 {
        self.half_extents[0]
    }

    /// Half extent along the second axis.
    #[inline]
    pub fn y_half(&self) -> f64 {
        self.half_extents[1]
    }

    /// Half extent along the third axis.
    #[inline]
    pub fn z_half(&self) -> f64 {
        self.half_extents[2]
    }

    /// Sets the first axis and its half extent. The caller keeps the three
    /// axes orthogonal.
    pub fn set_x_component(&mut self, dir: &Vector3<f64>, half: f64) {
        self.set_component(0, dir, half);
    }

    /// Sets the second axis and its half extent.
    pub fn set_y_component(&mut self, dir: &Vector3<f64>, half: f64) {
        self.set_component(1, dir, half);
    }

    /// Sets the third axis and its half extent.
    pub fn set_z_component(&mut self, dir: &Vector3<f64>, half: f64) {
        self.set_component(2, dir, half);
    }

    /// Negative or NaN `half` is clamped to zero; use [`Obb::set_void`] to
    /// empty a box.
    fn set_component(&mut self, index: usize, dir: &Vector3<f64>, half: f64) {
        debug_assert!(dir.norm_squared() > ANGULAR, "degenerate axis direction");
        self.axes[index] = dir.normalize();
        self.half_extents[index] = half.max(0.0);
        self.is_aabb = false;
    }

    /// Squared length of the space diagonal, `4 * (hx² + hy² + hz²)`.
    /// Zero for a void box.
    pub fn square_extent(&self) -> f64 {
        if self.is_void() {
            return 0.0;
        }
        4.0 * self.half_extents.iter().map(|h| h * h).sum::<f64>()
    }

    /// Volume of the box. Zero for a void box.
    pub fn volume(&self) -> f64 {
        if self.is_void() {
            return 0.0;
        }
        8.0 * self.half_extents.iter().product::<f64>()
    }

    /// Grows every half extent by `|delta|`. Void boxes stay void.
    pub fn enlarge(&mut self, delta: f64) {
        if self.is_void() {
            return;
        }
        for h in &mut self.half_extents {
            *h += delta.abs();
        }
    }

    /// Returns corner `index` of the box.
    ///
    /// Bit 0, 1 and 2 of `index` select the sign along the x, y and z axis
    /// (0 = negative, 1 = positive).
    ///
    /// # Panics
    ///
    /// Panics if `index >= 8`.
    pub fn vertex(&self, index: usize) -> Result<Point3<f64>> {
        assert!(index < 8, "corner index {index} out of range 0..8");
        if self.is_void() {
            return Err(Error::VoidBox);
        }
        let mut p = self.center;
        for (bit, axis) in self.axes.iter().enumerate() {
            let h = self.half_extents[bit];
            let sign = if index & (1 << bit) == 0 { -1.0 } else { 1.0 };
            p += axis * (sign * h);
        }
        Ok(p)
    }

    /// Returns the eight corners in bit-indexed order:
    /// 0=(-,-,-), 1=(+,-,-), 2=(-,+,-), 3=(+,+,-),
    /// 4=(-,-,+), 5=(+,-,+), 6=(-,+,+), 7=(+,+,+).
    pub fn vertices(&self) -> Result<[Point3<f64>; 8]> {
        if self.is_void() {
            return Err(Error::VoidBox);
        }
        let mut corners = [Point3::origin(); 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            *corner = self.vertex(i)?;
        }
        Ok(corners)
    }

    /// Coordinates of `p` in the box frame, relative to the center.
    #[inline]
    fn to_local(&self, p: &Point3<f64>) -> Vector3<f64> {
        let d = p - self.center;
        Vector3::new(d.dot(&self.axes[0]), d.dot(&self.axes[1]), d.dot(&self.axes[2]))
    }

    fn slack(&self, local: &Vector3<f64>) -> f64 {
        let scale = self.center.coords.amax() + local.amax() + self.half_extents.iter().sum::<f64>();
        CONTAINMENT_SLACK * (1.0 + scale)
    }

    /// Returns `true` if the point lies outside the box. Every point is
    /// outside a void box.
    pub fn is_out_point(&self, p: &Point3<f64>) -> bool {
        if self.is_void() {
            return true;
        }
        let local = self.to_local(p);
        let slack = self.slack(&local);
        (0..3).any(|i| local[i].abs() > self.half_extents[i] + slack)
    }

    /// Returns `true` if the two boxes are guaranteed to be disjoint.
    ///
    /// Separating axis test over the 3 axes of each box and the 9 cross
    /// products of axis pairs; near-parallel pairs are skipped. A `false`
    /// result means the boxes may overlap. A void box is out of everything.
    pub fn is_out(&self, other: &Obb) -> bool {
        if self.is_void() || other.is_void() {
            return true;
        }
        let t = other.center - self.center;

        let separates = |axis: &Vector3<f64>| {
            let ra: f64 = (0..3)
                .map(|k| self.half_extents[k] * self.axes[k].dot(axis).abs())
                .sum();
            let rb: f64 = (0..3)
                .map(|k| other.half_extents[k] * other.axes[k].dot(axis).abs())
                .sum();
            t.dot(axis).abs() > ra + rb
        };

        if self.axes.iter().any(&separates) || other.axes.iter().any(&separates) {
            return true;
        }

        for a in &self.axes {
            for b in &other.axes {
                let axis = a.cross(b);
                if axis.norm_squared() < ANGULAR {
                    continue;
                }
                if separates(&axis) {
                    return true;
                }
            }
        }

        false
    }

    /// Returns `true` if `other` lies entirely inside this box. Always
    /// `false` when either box is void.
    pub fn is_completely_inside(&self, other: &Obb) -> bool {
        if self.is_void() || other.is_void() {
            return false;
        }

        if self.shares_frame_with(other) {
            let t = other.center - self.center;
            return (0..3).all(|i| {
                let axis = &self.axes[i];
                let reach: f64 = (0..3)
                    .map(|k| other.half_extents[k] * other.axes[k].dot(axis).abs())
                    .sum();
                let local = Vector3::new(t.dot(axis), reach, 0.0);
                t.dot(axis).abs() + reach <= self.half_extents[i] + self.slack(&local)
            });
        }

        match other.vertices() {
            Ok(corners) => corners.iter().all(|c| !self.is_out_point(c)),
            Err(_) => false,
        }
    }

    /// Every axis of `other` is parallel to some axis of `self`.
    fn shares_frame_with(&self, other: &Obb) -> bool {
        other
            .axes
            .iter()
            .all(|b| self.axes.iter().any(|a| a.dot(b).abs() >= PARALLEL_COS))
    }

    /// Rebuilds the box so that it also covers `other`.
    ///
    /// If `other` is already inside, the box is left untouched. Otherwise the
    /// box is refitted around the corners of both boxes, with both current
    /// orientations among the candidate frames, so the result always covers
    /// both inputs.
    pub fn add(&mut self, other: &Obb) {
        if other.is_void() {
            return;
        }
        if self.is_void() {
            *self = *other;
            return;
        }
        if self.is_completely_inside(other) {
            return;
        }

        let (Ok(mine), Ok(theirs)) = (self.vertices(), other.vertices()) else {
            return;
        };
        let mut corners = Vec::with_capacity(16);
        corners.extend_from_slice(&mine);
        corners.extend_from_slice(&theirs);
        let seeds = [self.axes, other.axes];
        self.refit(&corners, None, false, &seeds);
    }

    /// Rebuilds the box so that it also covers `p`.
    pub fn add_point(&mut self, p: &Point3<f64>) {
        if self.is_void() {
            self.center = *p;
            self.axes = fit::world_frame();
            self.half_extents = [0.0; 3];
            self.is_aabb = true;
            return;
        }
        if !self.is_out_point(p) {
            return;
        }

        let Ok(mine) = self.vertices() else {
            return;
        };
        let mut points = Vec::with_capacity(9);
        points.extend_from_slice(&mine);
        points.push(*p);
        let seeds = [self.axes];
        self.refit(&points, None, false, &seeds);
    }

    /// Pretty-printed JSON dump of the box.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parses a box previously written by [`Obb::to_json`].
    ///
    /// A box with every half extent negative parses as the canonical void
    /// box. Otherwise the components are checked like in
    /// [`Obb::from_components`].
    pub fn from_json(json: &str) -> Result<Self> {
        let obb: Self =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        if obb.half_extents.iter().all(|&h| h < 0.0) {
            return Ok(Self::new());
        }
        obb.check_components()?;
        Ok(obb)
    }
}

impl Default for Obb {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Obb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_void() {
            return f.write_str("Void box.");
        }
        let c = &self.center;
        writeln!(f, "Oriented bounding box")?;
        writeln!(f, "Center: {} {} {}", c.x, c.y, c.z)?;
        for (name, axis) in ["X", "Y", "Z"].iter().zip(&self.axes) {
            writeln!(f, "{}-axis: {} {} {}", name, axis.x, axis.y, axis.z)?;
        }
        for (name, h) in ["X", "Y", "Z"].iter().zip(&self.half_extents) {
            writeln!(f, "Half {}: {}", name, h)?;
        }
        Ok(())
    }
}
