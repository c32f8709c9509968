// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fast sewing of rectangular parametric patches into a shell.
//!
//! Every patch contributes its four corners as vertices and its four sides
//! as edges. Corners closer than the tolerance become the same vertex, and
//! sides joining the same vertices with matching midpoints become the same
//! edge. Each face also gets an oriented bounding box so that the shell can
//! answer coarse interference queries.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use sewkit_bnd::Obb;
use smallvec::SmallVec;

use crate::config::SewingConfig;
use crate::error::{Error, Result};
use crate::merger::PointMerger;
use crate::surface::SurfaceProvider;

/// Problem found on one input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SewingIssue {
    /// Parameter range is not finite; the surface was skipped.
    InfiniteSurface { surface: usize },
    /// Parameter range is inverted; the surface was skipped.
    InvalidBounds { surface: usize },
    /// All sides collapsed or fewer than two distinct corners. The face is
    /// still part of the shell.
    DegeneratedFace { surface: usize },
}

/// An edge of the sewn shell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SewnEdge {
    /// End vertices, in the order of the face that created the edge.
    pub vertices: [usize; 2],
    /// Parametric midpoint of the side that created the edge.
    pub midpoint: Point3<f64>,
    /// Faces using this edge. A seam lists the same face twice.
    pub faces: Vec<usize>,
    /// Both ends and the midpoint coincide.
    pub degenerate: bool,
}

/// A face of the sewn shell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SewnFace {
    /// Index of the surface passed to [`FastSewing::add`].
    pub source: usize,
    /// Corner vertices `(u0,v0) (u1,v0) (u1,v1) (u0,v1)`.
    pub vertices: [usize; 4],
    /// Sides `v = v0`, `u = u1`, `v = v1`, `u = u0`.
    pub edges: [usize; 4],
    /// Box around the whole surface, enlarged by the tolerance.
    pub bounding_box: Obb,
}

/// Result of [`FastSewing::perform`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct SewnShell {
    pub vertices: Vec<Point3<f64>>,
    pub edges: Vec<SewnEdge>,
    pub faces: Vec<SewnFace>,
    pub issues: Vec<SewingIssue>,
}

impl SewnShell {
    /// Non-degenerate edges used by exactly one face.
    pub fn free_edges(&self) -> Vec<usize> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.degenerate && e.faces.len() == 1)
            .map(|(i, _)| i)
            .collect()
    }

    /// Edges used by two or more face sides.
    pub fn shared_edges(&self) -> Vec<usize> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.faces.len() >= 2)
            .map(|(i, _)| i)
            .collect()
    }

    /// Returns `false` when the boxes of faces `a` and `b` are disjoint.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn may_interfere(&self, a: usize, b: usize) -> bool {
        !self.faces[a]
            .bounding_box
            .is_out(&self.faces[b].bounding_box)
    }

    /// Pairs `(a, b)`, `a < b`, of faces whose boxes intersect.
    pub fn interfering_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for a in 0..self.faces.len() {
            for b in a + 1..self.faces.len() {
                if self.may_interfere(a, b) {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }

    /// Box covering every face box. Void for an empty shell.
    pub fn bounding_box(&self) -> Obb {
        let mut obb = Obb::new();
        for face in &self.faces {
            obb.add(&face.bounding_box);
        }
        obb
    }
}

/// Builder that sews rectangular patches sharing corners and sides.
///
/// # Example
///
/// ```
/// use sewkit_spatial::{FastSewing, PlanarPatch};
///
/// let mut sewing = FastSewing::new(1e-6).unwrap();
/// sewing.add(PlanarPatch::rectangle(0.0, 0.0, 1.0, 1.0, 0.0));
/// sewing.add(PlanarPatch::rectangle(1.0, 0.0, 2.0, 1.0, 0.0));
///
/// let shell = sewing.perform().unwrap();
/// assert_eq!(shell.vertices.len(), 6);
/// assert_eq!(shell.shared_edges().len(), 1);
/// ```
pub struct FastSewing<'a> {
    config: SewingConfig,
    surfaces: Vec<Box<dyn SurfaceProvider + 'a>>,
}

/// Samples of one surface, computed independently of the others.
enum Sampled {
    Skipped(SewingIssue),
    Face {
        corners: [Point3<f64>; 4],
        midpoints: [Point3<f64>; 4],
        bounding_box: Obb,
    },
}

impl<'a> FastSewing<'a> {
    /// Creates a sewing with default settings and the given tolerance.
    pub fn new(tolerance: f64) -> Result<Self> {
        Self::with_config(SewingConfig {
            tolerance,
            ..SewingConfig::default()
        })
    }

    pub fn with_config(config: SewingConfig) -> Result<Self> {
        if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
            return Err(Error::InvalidTolerance(config.tolerance));
        }
        Ok(Self {
            config: config.normalized(),
            surfaces: Vec::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &SewingConfig {
        &self.config
    }

    /// Queues a surface; returns its index, used as [`SewnFace::source`].
    pub fn add<S>(&mut self, surface: S) -> usize
    where
        S: SurfaceProvider + 'a,
    {
        self.surfaces.push(Box::new(surface));
        self.surfaces.len() - 1
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Sews every queued surface.
    pub fn perform(&self) -> Result<SewnShell> {
        if self.surfaces.is_empty() {
            return Err(Error::EmptyInput);
        }
        let config = self.config;

        // PHASE 1: evaluate surfaces, independent per face
        let sampled: Vec<Sampled> = if config.parallel {
            self.surfaces
                .par_iter()
                .enumerate()
                .map(|(i, s)| sample_surface(i, s.as_ref(), &config))
                .collect()
        } else {
            self.surfaces
                .iter()
                .enumerate()
                .map(|(i, s)| sample_surface(i, s.as_ref(), &config))
                .collect()
        };

        // PHASE 2: merge vertices and edges in insertion order
        let mut builder = ShellBuilder::new(config.tolerance, self.surfaces.len())?;
        for (source, sample) in sampled.into_iter().enumerate() {
            match sample {
                Sampled::Skipped(issue) => {
                    tracing::warn!(surface = source, ?issue, "Skipping surface");
                    builder.shell.issues.push(issue);
                }
                Sampled::Face {
                    corners,
                    midpoints,
                    bounding_box,
                } => builder.add_face(source, &corners, &midpoints, bounding_box),
            }
        }

        let shell = builder.finish();
        tracing::info!(
            surfaces = self.surfaces.len(),
            faces = shell.faces.len(),
            vertices = shell.vertices.len(),
            edges = shell.edges.len(),
            free_edges = shell.free_edges().len(),
            issues = shell.issues.len(),
            "Sewing complete"
        );
        Ok(shell)
    }
}

fn sample_surface(index: usize, surface: &dyn SurfaceProvider, config: &SewingConfig) -> Sampled {
    let [u0, u1, v0, v1] = surface.bounds();
    if ![u0, u1, v0, v1].iter().all(|b| b.is_finite()) {
        return Sampled::Skipped(SewingIssue::InfiniteSurface { surface: index });
    }
    if u0 > u1 || v0 > v1 {
        return Sampled::Skipped(SewingIssue::InvalidBounds { surface: index });
    }

    let (um, vm) = ((u0 + u1) * 0.5, (v0 + v1) * 0.5);
    let corners = [
        surface.value(u0, v0),
        surface.value(u1, v0),
        surface.value(u1, v1),
        surface.value(u0, v1),
    ];
    let midpoints = [
        surface.value(um, v0),
        surface.value(u1, vm),
        surface.value(um, v1),
        surface.value(u0, vm),
    ];

    // Coarse n x n grid at even indices, midpoints in between
    let m = 2 * config.face_samples - 1;
    let step = |lo: f64, hi: f64, k: usize| lo + (hi - lo) * k as f64 / (m - 1) as f64;
    let mut grid = Vec::with_capacity(m * m);
    for i in 0..m {
        for j in 0..m {
            grid.push(surface.value(step(u0, u1, i), step(v0, v1, j)));
        }
    }
    let mut bounding_box = Obb::from_points(&grid, None, config.optimal_boxes);
    bounding_box.enlarge(config.tolerance + max_sag(&grid, m));

    Sampled::Face {
        corners,
        midpoints,
        bounding_box,
    }
}

/// Largest distance between a midpoint of the refined `m x m` grid and the
/// mean of the coarse samples around it.
///
/// On a smooth surface this is about four times the distance between the
/// surface and the chords of the refined grid, so a box fitted to the refined
/// grid and enlarged by it contains the whole face.
fn max_sag(grid: &[Point3<f64>], m: usize) -> f64 {
    let around = |k: usize| if k % 2 == 1 { [k - 1, k + 1] } else { [k, k] };
    let mut sag = 0.0_f64;
    for i in 0..m {
        for j in 0..m {
            if i % 2 == 0 && j % 2 == 0 {
                continue;
            }
            let mut mean = Vector3::zeros();
            for a in around(i) {
                for b in around(j) {
                    mean += grid[a * m + b].coords;
                }
            }
            sag = sag.max((grid[i * m + j].coords - mean / 4.0).norm());
        }
    }
    sag
}

struct ShellBuilder {
    vertices: PointMerger,
    /// Unordered vertex pair to the non-degenerate edges joining it.
    edge_index: FxHashMap<(usize, usize), SmallVec<[usize; 2]>>,
    tolerance_sq: f64,
    shell: SewnShell,
}

impl ShellBuilder {
    fn new(tolerance: f64, capacity: usize) -> Result<Self> {
        Ok(Self {
            vertices: PointMerger::with_capacity(tolerance, capacity * 4)?,
            edge_index: FxHashMap::default(),
            tolerance_sq: tolerance * tolerance,
            shell: SewnShell {
                faces: Vec::with_capacity(capacity),
                ..SewnShell::default()
            },
        })
    }

    fn add_face(
        &mut self,
        source: usize,
        corners: &[Point3<f64>; 4],
        midpoints: &[Point3<f64>; 4],
        bounding_box: Obb,
    ) {
        let face = self.shell.faces.len();
        let vertices = corners.map(|c| self.vertices.find_or_insert(c).0);

        let mut edges = [0; 4];
        let mut degenerate_sides = 0;
        for side in 0..4 {
            let pair = [vertices[side], vertices[(side + 1) % 4]];
            let (edge, degenerate) = self.add_edge(face, pair, midpoints[side]);
            edges[side] = edge;
            degenerate_sides += usize::from(degenerate);
        }

        let mut distinct: SmallVec<[usize; 4]> = SmallVec::from_slice(&vertices);
        distinct.sort_unstable();
        distinct.dedup();
        if degenerate_sides == 4 || distinct.len() < 2 {
            tracing::warn!(surface = source, "Degenerated face");
            self.shell
                .issues
                .push(SewingIssue::DegeneratedFace { surface: source });
        }

        tracing::trace!(surface = source, face, ?vertices, ?edges, "Sewed face");
        self.shell.faces.push(SewnFace {
            source,
            vertices,
            edges,
            bounding_box,
        });
    }

    /// Returns the edge for one face side and whether it is degenerate.
    fn add_edge(&mut self, face: usize, pair: [usize; 2], midpoint: Point3<f64>) -> (usize, bool) {
        let [a, b] = pair;
        let points = self.vertices.points();
        let degenerate = a == b && (midpoint - points[a]).norm_squared() <= self.tolerance_sq;

        if !degenerate {
            let key = (a.min(b), a.max(b));
            let candidates = self.edge_index.get(&key).into_iter().flatten();
            for &edge in candidates {
                let existing = &mut self.shell.edges[edge];
                if (existing.midpoint - midpoint).norm_squared() <= self.tolerance_sq {
                    existing.faces.push(face);
                    return (edge, false);
                }
            }
        }

        let edge = self.shell.edges.len();
        self.shell.edges.push(SewnEdge {
            vertices: pair,
            midpoint,
            faces: vec![face],
            degenerate,
        });
        if !degenerate {
            self.edge_index
                .entry((a.min(b), a.max(b)))
                .or_default()
                .push(edge);
        }
        (edge, degenerate)
    }

    fn finish(self) -> SewnShell {
        SewnShell {
            vertices: self.vertices.into_points(),
            ..self.shell
        }
    }
}
