// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for bounding box operations.

/// Result type alias for bounding box operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or querying bounding boxes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An explicit half extent was negative (or not a number).
    #[error("half extent along axis {axis} must be >= 0, got {value}")]
    NegativeHalfExtent { axis: usize, value: f64 },

    /// An explicit axis direction had (near) zero length.
    #[error("axis {0} has zero length")]
    DegenerateAxis(usize),

    /// Explicit axis directions were not pairwise orthogonal, or parsed axes
    /// were not unit length.
    #[error("box axes are not orthonormal")]
    NonOrthogonalAxes,

    /// The operation requires a non-void box.
    #[error("operation requires a non-void box")]
    VoidBox,

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
