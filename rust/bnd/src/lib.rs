// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # sewkit bounding volumes
//!
//! Axis-aligned ([`Aabb`]) and oriented ([`Obb`]) bounding boxes used to
//! reject non-interfering geometry cheaply before exact work is done.
//!
//! Oriented boxes are fitted to point clouds with a ditetrahedron frame
//! search, optionally widened (principal axes plus a local rotation search)
//! for a tighter fit, and tested against each other with the separating axis
//! theorem.

pub mod aabb;
pub mod error;
mod fit;
pub mod obb;
pub mod precision;

pub use aabb::Aabb;
pub use error::{Error, Result};
pub use obb::Obb;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
