// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Numerical tolerances shared by the bounding box code.

/// Distance below which two points are considered coincident.
pub const CONFUSION: f64 = 1e-7;

/// Squared-norm threshold for treating a direction (or a cross product of
/// two unit directions) as degenerate.
pub const ANGULAR: f64 = 1e-12;

/// Distance below which all points of a set collapse to a single point.
pub const COINCIDENT: f64 = 1e-12;
