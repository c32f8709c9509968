// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # sewkit spatial
//!
//! A sparse uniform grid ([`CellFilter`]) answering "which targets lie near
//! this window" queries, plus the tools built on it:
//!
//! - [`NearestPointInspector`] and [`CoincidentPointsInspector`] to match
//!   grid candidates against a query point,
//! - [`PointMerger`] for tolerance-based vertex deduplication,
//! - [`FastSewing`] to sew rectangular parametric patches into a shell with
//!   shared vertices and edges and per-face oriented boxes.

pub mod cell_filter;
pub mod config;
pub mod error;
pub mod inspector;
pub mod merger;
pub mod sewing;
pub mod surface;

pub use cell_filter::{CellFilter, CellKey, InspectAction, Inspector};
pub use config::SewingConfig;
pub use error::{Error, Result};
pub use inspector::{CoincidentPointsInspector, NearestPointInspector};
pub use merger::{merge_coincident_points, PointMerger};
pub use sewing::{FastSewing, SewingIssue, SewnEdge, SewnFace, SewnShell};
pub use surface::{PlanarPatch, SphericalPatch, SurfaceProvider};
