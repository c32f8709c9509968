// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parametric surface patches consumed by [`FastSewing`](crate::FastSewing).

use std::f64::consts::{FRAC_PI_2, TAU};

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A rectangular parametric patch `(u, v) -> point`.
///
/// Implementations are sampled from several threads at once.
pub trait SurfaceProvider: Sync {
    /// Parameter range `[u_min, u_max, v_min, v_max]`.
    fn bounds(&self) -> [f64; 4];

    /// Point at parameters `(u, v)`.
    fn value(&self, u: f64, v: f64) -> Point3<f64>;
}

/// Parallelogram `origin + u * u_dir + v * v_dir`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarPatch {
    pub origin: Point3<f64>,
    pub u_dir: Vector3<f64>,
    pub v_dir: Vector3<f64>,
    pub bounds: [f64; 4],
}

impl PlanarPatch {
    /// Unit-parameter patch spanning `origin .. origin + u_dir + v_dir`.
    pub fn new(origin: Point3<f64>, u_dir: Vector3<f64>, v_dir: Vector3<f64>) -> Self {
        Self {
            origin,
            u_dir,
            v_dir,
            bounds: [0.0, 1.0, 0.0, 1.0],
        }
    }

    /// Axis-aligned rectangle in the plane `z = z`.
    pub fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64, z: f64) -> Self {
        Self::new(
            Point3::new(x0, y0, z),
            Vector3::new(x1 - x0, 0.0, 0.0),
            Vector3::new(0.0, y1 - y0, 0.0),
        )
    }

    pub fn with_bounds(mut self, bounds: [f64; 4]) -> Self {
        self.bounds = bounds;
        self
    }
}

impl SurfaceProvider for PlanarPatch {
    fn bounds(&self) -> [f64; 4] {
        self.bounds
    }

    fn value(&self, u: f64, v: f64) -> Point3<f64> {
        self.origin + self.u_dir * u + self.v_dir * v
    }
}

/// Part of a sphere parameterized by longitude `u` and latitude `v`
/// (radians, latitude in `[-pi/2, pi/2]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphericalPatch {
    pub center: Point3<f64>,
    pub radius: f64,
    pub bounds: [f64; 4],
}

impl SphericalPatch {
    /// The whole sphere. Its two latitude sides collapse onto the poles.
    pub fn full(center: Point3<f64>, radius: f64) -> Self {
        Self {
            center,
            radius,
            bounds: [0.0, TAU, -FRAC_PI_2, FRAC_PI_2],
        }
    }

    pub fn new(center: Point3<f64>, radius: f64, bounds: [f64; 4]) -> Self {
        Self {
            center,
            radius,
            bounds,
        }
    }
}

impl SurfaceProvider for SphericalPatch {
    fn bounds(&self) -> [f64; 4] {
        self.bounds
    }

    fn value(&self, u: f64, v: f64) -> Point3<f64> {
        let (su, cu) = u.sin_cos();
        let (sv, cv) = v.sin_cos();
        self.center + Vector3::new(cv * cu, cv * su, sv) * self.radius
    }
}
