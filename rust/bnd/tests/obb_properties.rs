// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use nalgebra::{Point3, Rotation3, Vector3};
use sewkit_bnd::{Aabb, Obb};

/// Deterministic pseudo-random cloud.
fn cloud(seed: u64, count: usize, rotation: &Rotation3<f64>, half: [f64; 3]) -> Vec<Point3<f64>> {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    };
    (0..count)
        .map(|_| {
            let local = Vector3::new(next() * half[0], next() * half[1], next() * half[2]);
            Point3::new(5.0, -3.0, 12.0) + rotation * local
        })
        .collect()
}

fn test_rotations() -> Vec<Rotation3<f64>> {
    vec![
        Rotation3::identity(),
        Rotation3::from_euler_angles(0.3, 0.0, 0.0),
        Rotation3::from_euler_angles(0.5, -0.8, 1.2),
        Rotation3::from_euler_angles(-1.1, 0.25, 2.9),
    ]
}

#[test]
fn rebuilt_box_contains_every_input_point() {
    for (k, rotation) in test_rotations().iter().enumerate() {
        let points = cloud(k as u64 + 1, 200, rotation, [4.0, 1.0, 0.3]);
        for optimal in [false, true] {
            let obb = Obb::from_points(&points, None, optimal);
            for p in &points {
                assert!(!obb.is_out_point(p), "point {p:?} outside (optimal={optimal})");
            }
        }
    }
}

#[test]
fn tolerances_pad_each_point() {
    let points = cloud(7, 50, &Rotation3::from_euler_angles(0.2, 0.4, 0.6), [2.0, 2.0, 1.0]);
    let tolerances: Vec<f64> = (0..points.len()).map(|i| 0.01 * (i % 5) as f64).collect();
    let obb = Obb::from_points(&points, Some(&tolerances), false);

    for (p, &tol) in points.iter().zip(&tolerances) {
        for axis in obb.axes() {
            assert!(!obb.is_out_point(&(p + axis * tol)));
            assert!(!obb.is_out_point(&(p - axis * tol)));
        }
    }
}

#[test]
fn optimal_is_never_looser() {
    for (k, rotation) in test_rotations().iter().enumerate() {
        for half in [[4.0, 1.0, 0.3], [1.0, 1.0, 1.0], [3.0, 2.0, 0.0]] {
            let points = cloud(100 + k as u64, 120, rotation, half);
            let default = Obb::from_points(&points, None, false);
            let optimal = Obb::from_points(&points, None, true);
            assert!(
                optimal.volume() <= default.volume() + 1e-9,
                "optimal {} > default {}",
                optimal.volume(),
                default.volume()
            );
        }
    }
}

#[test]
fn degenerate_inputs() {
    let empty = Obb::from_points(&[], None, true);
    assert!(empty.is_void());

    let p = Point3::new(1.0, -2.0, 3.5);
    let single = Obb::from_points(&[p, p, p], None, false);
    assert!(!single.is_void());
    assert!(single.is_aabb());
    assert_eq!(*single.center(), p);
    assert_eq!(single.half_extents(), [0.0; 3]);
    assert!(!single.is_out_point(&p));
}

#[test]
fn axes_stay_orthonormal() {
    let points = cloud(3, 80, &Rotation3::from_euler_angles(1.0, 2.0, 3.0), [1.0, 2.0, 3.0]);
    let obb = Obb::from_points(&points, None, true);
    let axes = obb.axes();
    for i in 0..3 {
        assert_relative_eq!(axes[i].norm(), 1.0, epsilon = 1e-12);
        for j in (i + 1)..3 {
            assert!(axes[i].dot(&axes[j]).abs() < 1e-12);
        }
    }
    assert!(obb.half_extents().iter().all(|&h| h >= 0.0));
}

#[test]
fn overlapping_aligned_boxes_are_not_out() {
    let a = Obb::from_aabb(&Aabb::from_corners(Point3::origin(), Point3::new(2.0, 2.0, 2.0)));
    let b = Obb::from_aabb(&Aabb::from_corners(
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(3.0, 3.0, 3.0),
    ));
    assert!(!a.is_out(&b));
    assert!(!b.is_out(&a));

    let gap = Obb::from_aabb(&Aabb::from_corners(
        Point3::new(2.5, 0.0, 0.0),
        Point3::new(3.0, 2.0, 2.0),
    ));
    assert!(a.is_out(&gap));
}

#[test]
fn rotated_boxes_sharing_volume_are_not_out() {
    for rotation in test_rotations() {
        let a = Obb::from_points(&cloud(11, 60, &rotation, [2.0, 1.0, 0.5]), None, false);
        let rotated = rotation * Rotation3::from_euler_angles(0.7, 0.1, -0.3);
        let b = Obb::from_points(&cloud(12, 60, &rotated, [1.0, 1.0, 1.0]), None, false);
        // Both clouds are centered on the same point
        assert!(!a.is_out(&b));
        assert!(!b.is_out(&a));
    }
}

#[test]
fn merged_box_never_shrinks() {
    let rotation = Rotation3::from_euler_angles(0.4, 0.1, 0.0);
    let big = Obb::from_points(&cloud(21, 100, &rotation, [3.0, 3.0, 3.0]), None, false);

    let mut merged = big;
    let inner = Obb::from_points(&cloud(22, 30, &rotation, [0.5, 0.5, 0.5]), None, false);
    merged.add(&inner);
    assert_eq!(merged, big);

    let far = Obb::from_points(
        &cloud(23, 30, &rotation, [0.5, 0.5, 0.5])
            .into_iter()
            .map(|p| p + Vector3::new(10.0, 0.0, 0.0))
            .collect::<Vec<_>>(),
        None,
        false,
    );
    merged.add(&far);
    assert!(merged.volume() >= big.volume());
    for corner in big.vertices().unwrap().iter().chain(far.vertices().unwrap().iter()) {
        assert!(!merged.is_out_point(corner));
    }
}

#[test]
fn incremental_points_match_cover() {
    let points = cloud(31, 40, &Rotation3::from_euler_angles(0.0, 0.6, 0.2), [2.0, 0.5, 0.5]);
    let mut obb = Obb::new();
    for p in &points {
        obb.add_point(p);
    }
    for p in &points {
        assert!(!obb.is_out_point(p));
    }
}
