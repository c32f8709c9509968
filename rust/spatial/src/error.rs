// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for spatial indexing and sewing.

/// Result type alias for spatial operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building an index or sewing patches.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A cell size was zero, negative or not finite.
    #[error("cell size along axis {axis} must be finite and > 0, got {value}")]
    InvalidCellSize { axis: usize, value: f64 },

    /// A merge tolerance was zero, negative or not finite.
    #[error("tolerance must be finite and > 0, got {0}")]
    InvalidTolerance(f64),

    /// Sewing was requested without any surface.
    #[error("no surfaces to sew")]
    EmptyInput,
}
