// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frame search for oriented box fitting.
//!
//! Candidate frames come from a ditetrahedron construction (DiTO): extreme
//! points along a fixed set of sample directions give a large base triangle,
//! and the two points farthest above and below its plane close two tetrahedra.
//! Every (face normal, face edge) pair of those solids is a candidate frame.
//! The optimal mode adds more sample directions, the principal axes of the
//! covariance matrix and a local rotation search around the best frame.
//!
//! Frames are ranked by box volume, each full extent floored at
//! [`CONFUSION`](crate::precision::CONFUSION) so flat and linear point sets
//! are ranked by area and length instead of all scoring zero.

use nalgebra::{Matrix3, Point3, Rotation3, SymmetricEigen, Unit, Vector3};

use crate::precision::{ANGULAR, COINCIDENT, CONFUSION};

/// Three right-handed orthonormal axes.
pub(crate) type Frame = [Vector3<f64>; 3];

/// Sample directions used by both modes: coordinate axes and cube diagonals.
const BASE_DIRECTIONS: [[f64; 3]; 7] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, 1.0, -1.0],
    [1.0, -1.0, 1.0],
    [1.0, -1.0, -1.0],
];

/// Extra sample directions for the optimal mode: cube edge diagonals.
const EDGE_DIRECTIONS: [[f64; 3]; 6] = [
    [1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, 1.0, -1.0],
];

/// Relative score gain below which a candidate does not replace the best.
const SCORE_NOISE: f64 = 1e-12;

const REFINE_START_ANGLE: f64 = 0.1;
const REFINE_MIN_ANGLE: f64 = 1e-4;
const REFINE_MAX_EVALUATIONS: usize = 256;

/// Result of fitting a box to a point set.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fit {
    pub center: Point3<f64>,
    pub axes: Frame,
    pub half_extents: [f64; 3],
    /// The world frame won the search.
    pub axis_aligned: bool,
}

/// Fits an oriented box around `points`.
///
/// `seeds` are extra frames that are always evaluated (used when merging
/// boxes so the existing orientations stay available). Returns `None` for an
/// empty point set.
///
/// # Panics
///
/// Panics if `tolerances` is given with a length different from `points`.
pub(crate) fn fit_points(
    points: &[Point3<f64>],
    tolerances: Option<&[f64]>,
    optimal: bool,
    seeds: &[Frame],
) -> Option<Fit> {
    let first = *points.first()?;
    if let Some(tols) = tolerances {
        assert_eq!(
            tols.len(),
            points.len(),
            "one tolerance per point is required"
        );
    }

    if points
        .iter()
        .all(|p| (p - first).norm_squared() <= COINCIDENT * COINCIDENT)
    {
        let pad = tolerances
            .map(|tols| tols.iter().fold(0.0_f64, |m, t| m.max(t.abs())))
            .unwrap_or(0.0);
        return Some(Fit {
            center: first,
            axes: world_frame(),
            half_extents: [pad; 3],
            axis_aligned: true,
        });
    }

    let mut search = Search::new(points, tolerances, first);
    for seed in seeds {
        search.consider(seed, false);
    }
    for frame in ditetrahedron_frames(points, &BASE_DIRECTIONS) {
        search.consider(&frame, false);
    }

    if optimal {
        let extended: Vec<[f64; 3]> = BASE_DIRECTIONS
            .iter()
            .chain(EDGE_DIRECTIONS.iter())
            .copied()
            .collect();
        for frame in ditetrahedron_frames(points, &extended) {
            search.consider(&frame, false);
        }
        if let Some(frame) = principal_frame(points) {
            search.consider(&frame, false);
        }
        search.refine();
    }

    tracing::trace!(
        points = points.len(),
        optimal,
        evaluated = search.evaluated,
        score = search.best.score,
        "fitted oriented box"
    );

    Some(search.finish())
}

/// Box volume of a frame's projected extents, each extent floored.
fn score(min: &[f64; 3], max: &[f64; 3]) -> f64 {
    (0..3)
        .map(|i| (max[i] - min[i]).max(CONFUSION))
        .product()
}

pub(crate) fn world_frame() -> Frame {
    [Vector3::x(), Vector3::y(), Vector3::z()]
}

/// Gram-Schmidt on two directions; the third axis completes a right-handed
/// frame.
pub(crate) fn orthonormalize(a: &Vector3<f64>, b: &Vector3<f64>) -> Option<Frame> {
    let x = a.try_normalize(ANGULAR)?;
    let y = (b - x * x.dot(b)).try_normalize(ANGULAR)?;
    Some([x, y, x.cross(&y)])
}

/// Frame with one axis along `normal` and another along the part of `edge`
/// orthogonal to it.
fn frame_from_normal_edge(normal: &Vector3<f64>, edge: &Vector3<f64>) -> Option<Frame> {
    orthonormalize(edge, &normal.cross(edge))
}

/// Any frame having `dir` as its first axis.
fn frame_from_direction(dir: &Vector3<f64>) -> Option<Frame> {
    let abs = dir.abs();
    let helper = if abs.x <= abs.y && abs.x <= abs.z {
        Vector3::x()
    } else if abs.y <= abs.z {
        Vector3::y()
    } else {
        Vector3::z()
    };
    orthonormalize(dir, &helper)
}

struct Candidate {
    frame: Frame,
    min: [f64; 3],
    max: [f64; 3],
    score: f64,
    axis_aligned: bool,
}

struct Search<'a> {
    points: &'a [Point3<f64>],
    tolerances: Option<&'a [f64]>,
    /// Projections are taken relative to this point to limit cancellation
    /// with large coordinates.
    origin: Point3<f64>,
    best: Candidate,
    evaluated: usize,
}

impl<'a> Search<'a> {
    fn new(points: &'a [Point3<f64>], tolerances: Option<&'a [f64]>, origin: Point3<f64>) -> Self {
        let mut search = Self {
            points,
            tolerances,
            origin,
            best: Candidate {
                frame: world_frame(),
                min: [0.0; 3],
                max: [0.0; 3],
                score: f64::INFINITY,
                axis_aligned: true,
            },
            evaluated: 0,
        };
        search.best = search.evaluate(world_frame(), true);
        search
    }

    fn evaluate(&mut self, frame: Frame, axis_aligned: bool) -> Candidate {
        self.evaluated += 1;
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];

        for (j, p) in self.points.iter().enumerate() {
            let d = p - self.origin;
            let tol = self.tolerances.map_or(0.0, |t| t[j].abs());
            for i in 0..3 {
                let proj = d.dot(&frame[i]);
                min[i] = min[i].min(proj - tol);
                max[i] = max[i].max(proj + tol);
            }
        }

        Candidate {
            frame,
            score: score(&min, &max),
            min,
            max,
            axis_aligned,
        }
    }

    /// Evaluates a frame and keeps it if it beats the current best by more
    /// than rounding noise. Returns whether it was kept.
    fn consider(&mut self, frame: &Frame, axis_aligned: bool) -> bool {
        let Some(frame) = orthonormalize(&frame[0], &frame[1]) else {
            return false;
        };
        let candidate = self.evaluate(frame, axis_aligned);
        if candidate.score < self.best.score * (1.0 - SCORE_NOISE) {
            self.best = candidate;
            true
        } else {
            false
        }
    }

    /// Coordinate descent over small rotations about the axes of the best
    /// frame, halving the angle whenever no rotation improves the score.
    fn refine(&mut self) {
        let mut step = REFINE_START_ANGLE;
        let budget = self.evaluated + REFINE_MAX_EVALUATIONS;

        while step > REFINE_MIN_ANGLE && self.evaluated < budget {
            let mut improved = false;
            for k in 0..3 {
                for angle in [step, -step] {
                    let axis = Unit::new_normalize(self.best.frame[k]);
                    let rotation = Rotation3::from_axis_angle(&axis, angle);
                    let frame = self.best.frame.map(|a| rotation * a);
                    improved |= self.consider(&frame, false);
                }
            }
            if !improved {
                step *= 0.5;
            }
        }
    }

    fn finish(self) -> Fit {
        let best = self.best;
        let mut center = self.origin;
        let mut half_extents = [0.0; 3];
        for i in 0..3 {
            center += best.frame[i] * (0.5 * (best.min[i] + best.max[i]));
            half_extents[i] = (0.5 * (best.max[i] - best.min[i])).max(0.0);
        }
        Fit {
            center,
            axes: best.frame,
            half_extents,
            axis_aligned: best.axis_aligned,
        }
    }
}

/// Indices of the points with minimal and maximal projection on each
/// direction.
fn extreme_pairs(points: &[Point3<f64>], directions: &[[f64; 3]]) -> Vec<(usize, usize)> {
    directions
        .iter()
        .map(|d| {
            let dir = Vector3::new(d[0], d[1], d[2]);
            let mut lo = (0, f64::INFINITY);
            let mut hi = (0, f64::NEG_INFINITY);
            for (i, p) in points.iter().enumerate() {
                let proj = p.coords.dot(&dir);
                if proj < lo.1 {
                    lo = (i, proj);
                }
                if proj > hi.1 {
                    hi = (i, proj);
                }
            }
            (lo.0, hi.0)
        })
        .collect()
}

/// Pushes one frame per edge of triangle `(a, b, c)`, all sharing its
/// normal.
fn push_face_frames(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, frames: &mut Vec<Frame>) {
    let ab = b - a;
    let bc = c - b;
    let ca = a - c;
    let normal = ab.cross(&(c - a));
    if normal.norm_squared() <= ANGULAR * ab.norm_squared() * ca.norm_squared() {
        return;
    }
    for edge in [ab, bc, ca] {
        if let Some(frame) = frame_from_normal_edge(&normal, &edge) {
            frames.push(frame);
        }
    }
}

fn ditetrahedron_frames(points: &[Point3<f64>], directions: &[[f64; 3]]) -> Vec<Frame> {
    let mut frames = Vec::new();

    // Longest extreme pair spans the base triangle
    let Some((i0, i1)) = extreme_pairs(points, directions)
        .into_iter()
        .max_by(|a, b| {
            let da = (points[a.1] - points[a.0]).norm_squared();
            let db = (points[b.1] - points[b.0]).norm_squared();
            da.total_cmp(&db)
        })
    else {
        return frames;
    };
    let p0 = points[i0];
    let p1 = points[i1];
    let base = p1 - p0;
    let base_len_sq = base.norm_squared();
    if base_len_sq <= COINCIDENT * COINCIDENT {
        return frames;
    }
    if let Some(frame) = frame_from_direction(&base) {
        frames.push(frame);
    }

    // Point farthest from the base line closes the triangle
    let (i2, dist_sq) = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, (p - p0).cross(&base).norm_squared() / base_len_sq))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((i0, 0.0));
    if dist_sq <= COINCIDENT * COINCIDENT {
        return frames;
    }
    let p2 = points[i2];
    push_face_frames(&p0, &p1, &p2, &mut frames);

    let Some(normal) = base.cross(&(p2 - p0)).try_normalize(ANGULAR) else {
        return frames;
    };
    let mut above = (i0, 0.0);
    let mut below = (i0, 0.0);
    for (i, p) in points.iter().enumerate() {
        let h = (p - p0).dot(&normal);
        if h > above.1 {
            above = (i, h);
        }
        if h < below.1 {
            below = (i, h);
        }
    }
    for (i, h) in [above, below] {
        if h.abs() <= COINCIDENT {
            continue;
        }
        let q = points[i];
        push_face_frames(&p0, &p1, &q, &mut frames);
        push_face_frames(&p1, &p2, &q, &mut frames);
        push_face_frames(&p2, &p0, &q, &mut frames);
    }

    frames
}

/// Principal axes of the point covariance matrix.
fn principal_frame(points: &[Point3<f64>]) -> Option<Frame> {
    let n = points.len() as f64;
    let centroid = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / n;

    let mut cov = Matrix3::zeros();
    for p in points {
        let d = p.coords - centroid;
        cov += d * d.transpose();
    }
    cov /= n;

    let eigen = SymmetricEigen::new(cov);
    let vectors = eigen.eigenvectors;
    orthonormalize(&vectors.column(0).into_owned(), &vectors.column(1).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn box_corners(rotation: &Rotation3<f64>, half: [f64; 3]) -> Vec<Point3<f64>> {
        (0..8)
            .map(|i| {
                let local = Vector3::new(
                    if i & 1 == 0 { -half[0] } else { half[0] },
                    if i & 2 == 0 { -half[1] } else { half[1] },
                    if i & 4 == 0 { -half[2] } else { half[2] },
                );
                Point3::from(rotation * local) + Vector3::new(3.0, -1.0, 2.0)
            })
            .collect()
    }

    fn volume(fit: &Fit) -> f64 {
        8.0 * fit.half_extents.iter().product::<f64>()
    }

    #[test]
    fn orthonormalize_is_right_handed() {
        let frame = orthonormalize(&Vector3::new(2.0, 0.0, 0.0), &Vector3::new(1.0, 1.0, 0.0))
            .unwrap();
        assert_relative_eq!(frame[0], Vector3::x());
        assert_relative_eq!(frame[1], Vector3::y());
        assert_relative_eq!(frame[2], Vector3::z());
        assert!(orthonormalize(&Vector3::x(), &Vector3::new(3.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn recovers_rotated_box() {
        let rotation = Rotation3::from_euler_angles(0.3, -0.7, 1.1);
        let points = box_corners(&rotation, [2.0, 1.0, 0.5]);
        let fit = fit_points(&points, None, true, &[]).unwrap();
        assert_relative_eq!(volume(&fit), 8.0, epsilon = 1e-6);
        assert_relative_eq!(fit.center, Point3::new(3.0, -1.0, 2.0), epsilon = 1e-9);
        assert!(!fit.axis_aligned);
    }

    #[test]
    fn axis_aligned_input_keeps_world_frame() {
        let points = box_corners(&Rotation3::identity(), [1.0, 2.0, 3.0]);
        let fit = fit_points(&points, None, true, &[]).unwrap();
        assert!(fit.axis_aligned);
        assert_eq!(fit.axes, world_frame());
        assert_relative_eq!(volume(&fit), 48.0, epsilon = 1e-9);
    }

    #[test]
    fn single_point_is_padded_by_tolerance() {
        let points = [Point3::new(1.0, 2.0, 3.0); 3];
        let fit = fit_points(&points, Some(&[0.1, 0.3, 0.2]), false, &[]).unwrap();
        assert!(fit.axis_aligned);
        assert_eq!(fit.half_extents, [0.3; 3]);
        assert_eq!(fit.center, points[0]);
    }

    #[test]
    fn empty_input_has_no_fit() {
        assert!(fit_points(&[], None, true, &[]).is_none());
    }

    #[test]
    fn collinear_points_fit_a_segment() {
        let dir = Vector3::new(1.0, 2.0, -1.0).normalize();
        let points: Vec<_> = (0..10)
            .map(|i| Point3::origin() + dir * (i as f64))
            .collect();
        let fit = fit_points(&points, None, false, &[]).unwrap();
        let mut halves = fit.half_extents;
        halves.sort_by(f64::total_cmp);
        assert_relative_eq!(halves[2], 4.5, epsilon = 1e-9);
        assert!(halves[0] < 1e-9 && halves[1] < 1e-9);
    }

    #[test]
    fn optimal_never_loses_to_default() {
        let rotation = Rotation3::from_euler_angles(0.9, 0.2, -0.4);
        let mut points = box_corners(&rotation, [3.0, 1.5, 0.25]);
        // Interior and near-surface noise
        for i in 0..40 {
            let t = i as f64 * 0.37;
            let local = Vector3::new(2.9 * t.sin(), 1.4 * (1.3 * t).cos(), 0.2 * (0.7 * t).sin());
            points.push(Point3::from(rotation * local));
        }
        let default = fit_points(&points, None, false, &[]).unwrap();
        let optimal = fit_points(&points, None, true, &[]).unwrap();
        assert!(volume(&optimal) <= volume(&default) + 1e-9);
    }
}
