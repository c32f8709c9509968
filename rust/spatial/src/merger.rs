// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerance-based point deduplication on top of [`CellFilter`].

use nalgebra::Point3;
use tracing::debug;

use crate::cell_filter::CellFilter;
use crate::error::{Error, Result};
use crate::inspector::NearestPointInspector;

/// Unique point store: a point closer than the tolerance to a stored point
/// resolves to that point instead of being inserted.
///
/// Cells are as large as the tolerance, so a query window spans at most
/// 3 cells per axis.
#[derive(Debug, Clone)]
pub struct PointMerger {
    points: Vec<Point3<f64>>,
    filter: CellFilter,
    tolerance: f64,
}

impl PointMerger {
    /// Creates an empty merger. `tolerance` must be finite and > 0.
    pub fn new(tolerance: f64) -> Result<Self> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(Error::InvalidTolerance(tolerance));
        }
        Ok(Self {
            points: Vec::new(),
            filter: CellFilter::with_cell_size(tolerance)?,
            tolerance,
        })
    }

    /// Creates an empty merger with room for `capacity` points.
    pub fn with_capacity(tolerance: f64, capacity: usize) -> Result<Self> {
        let mut merger = Self::new(tolerance)?;
        merger.points.reserve(capacity);
        Ok(merger)
    }

    /// Index of a stored point within tolerance of `p`.
    pub fn find(&self, p: &Point3<f64>) -> Option<usize> {
        let mut inspector = NearestPointInspector::new(&self.points, *p, self.tolerance);
        let (min, max) = inspector.window();
        self.filter.inspect(&min, &max, &mut inspector);
        inspector.result()
    }

    /// Returns the index of the stored point matching `p`, inserting `p` when
    /// there is none. The flag is `true` if `p` was inserted.
    pub fn find_or_insert(&mut self, p: Point3<f64>) -> (usize, bool) {
        if let Some(existing) = self.find(&p) {
            return (existing, false);
        }
        let index = self.points.len();
        self.points.push(p);
        self.filter.add(index, &p);
        (index, true)
    }

    /// Stored points in insertion order.
    #[inline]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Consumes the merger, returning the unique points.
    pub fn into_points(self) -> Vec<Point3<f64>> {
        self.points
    }
}

/// Maps every input point to its representative among the unique points.
///
/// Representatives are numbered in order of first appearance, and the first
/// stored point within tolerance wins. Returns `(unique_points, mapping)`.
pub fn merge_coincident_points(
    points: &[Point3<f64>],
    tolerance: f64,
) -> Result<(Vec<Point3<f64>>, Vec<usize>)> {
    let mut merger = PointMerger::with_capacity(tolerance, points.len())?;
    let mapping: Vec<usize> = points
        .iter()
        .map(|p| merger.find_or_insert(*p).0)
        .collect();

    debug!(
        input = points.len(),
        unique = merger.len(),
        tolerance,
        "merged coincident points"
    );
    Ok((merger.into_points(), mapping))
}
