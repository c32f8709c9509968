// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inspectors that match grid candidates against a query point.

use nalgebra::{Point3, Vector3};

use crate::cell_filter::{InspectAction, Inspector};

/// Finds a point within tolerance of a target, first match wins.
///
/// The inspector disarms itself once it has accepted a candidate, so any
/// later call within the same query returns [`InspectAction::Stop`] without
/// looking at the point. Call [`rearm`](Self::rearm) before the next query.
#[derive(Debug)]
pub struct NearestPointInspector<'a> {
    points: &'a [Point3<f64>],
    target: Point3<f64>,
    tolerance: f64,
    tolerance_sq: f64,
    result: Option<usize>,
    armed: bool,
}

impl<'a> NearestPointInspector<'a> {
    /// Creates an armed inspector looking for `target` among `points`.
    pub fn new(points: &'a [Point3<f64>], target: Point3<f64>, tolerance: f64) -> Self {
        let tolerance = tolerance.abs();
        Self {
            points,
            target,
            tolerance,
            tolerance_sq: tolerance * tolerance,
            result: None,
            armed: true,
        }
    }

    /// Clears the result and re-arms the inspector for a new target.
    pub fn rearm(&mut self, target: Point3<f64>) {
        self.target = target;
        self.result = None;
        self.armed = true;
    }

    /// Query window `[target - tol, target + tol]` to pass to
    /// [`CellFilter::inspect`](crate::CellFilter::inspect).
    pub fn window(&self) -> (Point3<f64>, Point3<f64>) {
        let shift = Vector3::repeat(self.tolerance);
        (self.target - shift, self.target + shift)
    }

    #[inline]
    pub fn target(&self) -> &Point3<f64> {
        &self.target
    }

    /// Index of the accepted point, `None` if nothing was within tolerance.
    #[inline]
    pub fn result(&self) -> Option<usize> {
        self.result
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl Inspector<usize> for NearestPointInspector<'_> {
    fn inspect(&mut self, candidate: usize) -> InspectAction {
        if !self.armed {
            return InspectAction::Stop;
        }
        if (self.points[candidate] - self.target).norm_squared() <= self.tolerance_sq {
            self.result = Some(candidate);
            self.armed = false;
            return InspectAction::Stop;
        }
        InspectAction::Continue
    }
}

/// Collects every point whose coordinates each differ from the current
/// point by at most the tolerance.
///
/// Unlike [`NearestPointInspector`] it never stops a scan and owns a copy of
/// the points it matches against.
#[derive(Debug, Clone)]
pub struct CoincidentPointsInspector {
    points: Vec<Point3<f64>>,
    current: Point3<f64>,
    tolerance: f64,
    tolerance_sq: f64,
    results: Vec<usize>,
}

impl CoincidentPointsInspector {
    pub fn new(tolerance: f64) -> Self {
        let tolerance = tolerance.abs();
        Self {
            points: Vec::new(),
            current: Point3::origin(),
            tolerance,
            tolerance_sq: tolerance * tolerance,
            results: Vec::new(),
        }
    }

    /// Appends a point; its index is the previous number of points.
    pub fn add(&mut self, p: Point3<f64>) -> usize {
        self.points.push(p);
        self.points.len() - 1
    }

    pub fn set_current(&mut self, p: Point3<f64>) {
        self.current = p;
    }

    /// Query window around the current point.
    pub fn window(&self) -> (Point3<f64>, Point3<f64>) {
        let shift = Vector3::repeat(self.tolerance);
        (self.current - shift, self.current + shift)
    }

    /// Indices matched since the last [`clear_results`](Self::clear_results).
    pub fn results(&self) -> &[usize] {
        &self.results
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }
}

impl Inspector<usize> for CoincidentPointsInspector {
    fn inspect(&mut self, candidate: usize) -> InspectAction {
        let d = self.current - self.points[candidate];
        if d.iter().all(|c| c * c <= self.tolerance_sq) {
            self.results.push(candidate);
        }
        InspectAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_filter::CellFilter;

    #[test]
    fn nearest_inspector_disarms_after_match() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(0.001, 0.0, 0.0)];
        let mut inspector = NearestPointInspector::new(&points, Point3::origin(), 0.01);

        assert_eq!(inspector.inspect(1), InspectAction::Stop);
        assert_eq!(inspector.result(), Some(1));
        assert!(!inspector.is_armed());

        // Disarmed: a later candidate is not even considered
        assert_eq!(inspector.inspect(0), InspectAction::Stop);
        assert_eq!(inspector.result(), Some(1));

        inspector.rearm(Point3::new(5.0, 0.0, 0.0));
        assert!(inspector.is_armed());
        assert_eq!(inspector.result(), None);
        assert_eq!(inspector.inspect(0), InspectAction::Continue);
        assert_eq!(inspector.result(), None);
    }

    #[test]
    fn nearest_inspector_window() {
        let inspector = NearestPointInspector::new(&[], Point3::new(1.0, 2.0, 3.0), -0.5);
        let (min, max) = inspector.window();
        assert_eq!(min, Point3::new(0.5, 1.5, 2.5));
        assert_eq!(max, Point3::new(1.5, 2.5, 3.5));
    }

    #[test]
    fn coincident_inspector_collects_all_matches() {
        let mut inspector = CoincidentPointsInspector::new(0.1);
        let mut filter = CellFilter::with_cell_size(0.1).unwrap();
        for p in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.05, 0.05, 0.05),
            Point3::new(0.09, 0.0, 0.0),
            Point3::new(0.3, 0.0, 0.0),
        ] {
            let id = inspector.add(p);
            filter.add(id, &p);
        }

        inspector.set_current(Point3::origin());
        let (min, max) = inspector.window();
        assert!(!filter.inspect(&min, &max, &mut inspector));

        let mut found = inspector.results().to_vec();
        found.sort_unstable();
        assert_eq!(found, vec![0, 1, 2]);

        inspector.clear_results();
        assert!(inspector.results().is_empty());
    }
}
