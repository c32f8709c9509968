// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uniform grid ("cell filter") over 3D points.
//!
//! Space is divided into axis-aligned cells of a fixed size. Each added
//! target is stored in the single cell containing its point. A windowed query
//! hands every target registered in a cell touched by the window to an
//! [`Inspector`], which decides what a match is.
//!
//! The filter does not own point coordinates: targets are typically indices
//! into a caller-owned point array.

use nalgebra::Point3;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Integer coordinates of a grid cell.
pub type CellKey = (i64, i64, i64);

/// Decision returned by an inspector for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InspectAction {
    /// Keep scanning.
    Continue,
    /// An acceptable match was found; the scan ends immediately.
    Stop,
}

/// Visitor called once per candidate target found by
/// [`CellFilter::inspect`].
pub trait Inspector<T> {
    fn inspect(&mut self, target: T) -> InspectAction;
}

impl<T, F> Inspector<T> for F
where
    F: FnMut(T) -> InspectAction,
{
    fn inspect(&mut self, target: T) -> InspectAction {
        self(target)
    }
}

/// A sparse uniform grid mapping cells to the targets added in them.
///
/// # Example
///
/// ```
/// use nalgebra::Point3;
/// use sewkit_spatial::{CellFilter, InspectAction};
///
/// let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(5.0, 5.0, 5.0)];
/// let mut filter = CellFilter::with_cell_size(0.1).unwrap();
/// for (i, p) in points.iter().enumerate() {
///     filter.add(i, p);
/// }
///
/// let mut seen = Vec::new();
/// filter.inspect(
///     &Point3::new(-0.05, -0.05, -0.05),
///     &Point3::new(0.05, 0.05, 0.05),
///     &mut |i: usize| {
///         seen.push(i);
///         InspectAction::Continue
///     },
/// );
/// assert_eq!(seen, vec![0]);
/// ```
#[derive(Debug, Clone)]
pub struct CellFilter<T = usize> {
    cell_size: [f64; 3],
    cells: FxHashMap<CellKey, SmallVec<[T; 4]>>,
    len: usize,
}

impl<T: Copy> CellFilter<T> {
    /// Creates a filter with one cell size per axis.
    ///
    /// Every size must be finite and strictly positive.
    pub fn new(size_x: f64, size_y: f64, size_z: f64) -> Result<Self> {
        let cell_size = [size_x, size_y, size_z];
        for (axis, &value) in cell_size.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidCellSize { axis, value });
            }
        }
        Ok(Self {
            cell_size,
            cells: FxHashMap::default(),
            len: 0,
        })
    }

    /// Creates a filter with cubic cells.
    pub fn with_cell_size(size: f64) -> Result<Self> {
        Self::new(size, size, size)
    }

    /// Cell size along each axis.
    #[inline]
    pub fn cell_size(&self) -> [f64; 3] {
        self.cell_size
    }

    /// Number of targets added.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no target was added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-empty cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Removes every target.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.len = 0;
    }

    /// Cell containing `p`: `floor(p[i] / size[i])` on each axis.
    #[inline]
    pub fn cell_of(&self, p: &Point3<f64>) -> CellKey {
        (
            (p.x / self.cell_size[0]).floor() as i64,
            (p.y / self.cell_size[1]).floor() as i64,
            (p.z / self.cell_size[2]).floor() as i64,
        )
    }

    /// Registers `target` in the cell containing `p`.
    pub fn add(&mut self, target: T, p: &Point3<f64>) {
        debug_assert!(
            p.coords.iter().all(|c| c.is_finite()),
            "cannot index a non-finite point"
        );
        let cell = self.cell_of(p);
        self.cells.entry(cell).or_default().push(target);
        self.len += 1;
    }

    /// Calls `inspector` for every target registered in a cell overlapping
    /// the window `[min, max]` (boundary cells included).
    ///
    /// Cells are visited in unspecified order. The scan ends as soon as the
    /// inspector returns [`InspectAction::Stop`], even in the middle of a
    /// cell. Returns `true` if the scan was stopped that way.
    pub fn inspect<I>(&self, min: &Point3<f64>, max: &Point3<f64>, inspector: &mut I) -> bool
    where
        I: Inspector<T> + ?Sized,
    {
        let lo = self.cell_of(min);
        let hi = self.cell_of(max);
        if lo.0 > hi.0 || lo.1 > hi.1 || lo.2 > hi.2 {
            return false;
        }

        let span = |a: i64, b: i64| (b as i128 - a as i128 + 1) as u128;
        let window_cells = span(lo.0, hi.0)
            .saturating_mul(span(lo.1, hi.1))
            .saturating_mul(span(lo.2, hi.2));

        // A huge window over a sparse grid: filter the occupied cells instead
        // of walking every cell in the window.
        if window_cells > self.cells.len() as u128 {
            for (cell, targets) in &self.cells {
                let inside = (lo.0..=hi.0).contains(&cell.0)
                    && (lo.1..=hi.1).contains(&cell.1)
                    && (lo.2..=hi.2).contains(&cell.2);
                if inside && Self::visit(targets, inspector) {
                    return true;
                }
            }
            return false;
        }

        for x in lo.0..=hi.0 {
            for y in lo.1..=hi.1 {
                for z in lo.2..=hi.2 {
                    if let Some(targets) = self.cells.get(&(x, y, z)) {
                        if Self::visit(targets, inspector) {
                            return true;
                        }
                    }
                }
            }
        }

        false
    }

    fn visit<I>(targets: &[T], inspector: &mut I) -> bool
    where
        I: Inspector<T> + ?Sized,
    {
        targets
            .iter()
            .any(|&t| inspector.inspect(t) == InspectAction::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(filter: &CellFilter, min: Point3<f64>, max: Point3<f64>) -> Vec<usize> {
        let mut found = Vec::new();
        filter.inspect(&min, &max, &mut |i: usize| {
            found.push(i);
            InspectAction::Continue
        });
        found.sort_unstable();
        found
    }

    #[test]
    fn rejects_bad_cell_sizes() {
        assert!(matches!(
            CellFilter::<usize>::new(1.0, 0.0, 1.0),
            Err(Error::InvalidCellSize { axis: 1, .. })
        ));
        assert!(matches!(
            CellFilter::<usize>::new(1.0, 1.0, -2.0),
            Err(Error::InvalidCellSize { axis: 2, .. })
        ));
        assert!(CellFilter::<usize>::with_cell_size(f64::NAN).is_err());
        assert!(CellFilter::<usize>::with_cell_size(f64::INFINITY).is_err());
    }

    #[test]
    fn cell_of_floors_negative_coordinates() {
        let filter = CellFilter::<usize>::new(1.0, 0.5, 2.0).unwrap();
        assert_eq!(filter.cell_size(), [1.0, 0.5, 2.0]);
        assert!(filter.is_empty());
        assert_eq!(filter.cell_of(&Point3::new(0.5, 0.5, 0.5)), (0, 1, 0));
        assert_eq!(filter.cell_of(&Point3::new(-0.5, -0.1, -3.0)), (-1, -1, -2));
    }

    #[test]
    fn one_cell_per_target() {
        let mut filter = CellFilter::with_cell_size(1.0).unwrap();
        filter.add(0, &Point3::new(0.1, 0.1, 0.1));
        filter.add(1, &Point3::new(0.9, 0.2, 0.3));
        filter.add(2, &Point3::new(1.1, 0.1, 0.1));
        assert_eq!(filter.len(), 3);
        assert_eq!(filter.cell_count(), 2);
    }

    #[test]
    fn window_includes_boundary_cells() {
        let mut filter = CellFilter::with_cell_size(1.0).unwrap();
        filter.add(0, &Point3::new(0.5, 0.5, 0.5));
        filter.add(1, &Point3::new(1.5, 0.5, 0.5));
        filter.add(2, &Point3::new(3.5, 0.5, 0.5));

        // Window touches cell 1 only at its lower face
        assert_eq!(
            collect(&filter, Point3::new(0.2, 0.2, 0.2), Point3::new(1.0, 0.8, 0.8)),
            vec![0, 1]
        );
        // Degenerate window probes a single cell
        let p = Point3::new(3.5, 0.5, 0.5);
        assert_eq!(collect(&filter, p, p), vec![2]);
    }

    #[test]
    fn inverted_window_finds_nothing() {
        let mut filter = CellFilter::with_cell_size(1.0).unwrap();
        filter.add(0, &Point3::origin());
        assert!(collect(&filter, Point3::new(2.0, 2.0, 2.0), Point3::origin()).is_empty());
    }

    #[test]
    fn stop_ends_scan_immediately() {
        let mut filter = CellFilter::with_cell_size(10.0).unwrap();
        for i in 0..5 {
            filter.add(i, &Point3::new(i as f64 * 0.1, 0.0, 0.0));
        }
        let mut calls = 0;
        let stopped = filter.inspect(&Point3::origin(), &Point3::new(1.0, 0.0, 0.0), &mut |_| {
            calls += 1;
            InspectAction::Stop
        });
        assert!(stopped);
        assert_eq!(calls, 1);
    }

    #[test]
    fn huge_window_uses_occupied_cells() {
        let mut filter = CellFilter::with_cell_size(1e-6).unwrap();
        filter.add(0, &Point3::new(-100.0, 0.0, 0.0));
        filter.add(1, &Point3::new(100.0, 50.0, -20.0));
        filter.add(2, &Point3::new(1e6, 0.0, 0.0));
        assert_eq!(
            collect(
                &filter,
                Point3::new(-1000.0, -1000.0, -1000.0),
                Point3::new(1000.0, 1000.0, 1000.0)
            ),
            vec![0, 1]
        );
    }

    #[test]
    fn clear_empties_filter() {
        let mut filter = CellFilter::with_cell_size(1.0).unwrap();
        filter.add(7, &Point3::origin());
        filter.clear();
        assert!(filter.is_empty());
        assert_eq!(filter.cell_count(), 0);
        assert!(collect(&filter, Point3::origin(), Point3::origin()).is_empty());
    }
}
