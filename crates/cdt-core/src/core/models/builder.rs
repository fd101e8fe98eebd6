use super::ids::VertexId;
use super::manifold::Manifold;
use super::topology::Topology;
use super::triangulation::{FoliatedTriangulation, TriangulationError};
use crate::core::utils::geometry::{angle_at, project_to_sphere, slice_level, triangle_area};
use nalgebra::Point3;
use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;
use thiserror::Error;
use tracing::{debug, info};

/// Only 2+1 dimensional triangulations can be built.
pub const SUPPORTED_DIMENSION: u32 = 3;

const MAX_FLIP_SWEEPS: usize = 16;
const FLIP_EPSILON: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Simplices and timeslices should be greater or equal to 2 (got {simplices} simplices, {timeslices} timeslices)")]
    InvalidSize { simplices: usize, timeslices: usize },

    #[error("Dimension {0} is not supported; only 3 dimensions are implemented")]
    UnsupportedDimension(u32),

    #[error("Invalid embedding parameter '{name}': {value} must be positive")]
    InvalidEmbedding { name: &'static str, value: f64 },

    #[error("Constructed triangulation is not foliated")]
    NotFoliated,

    #[error(transparent)]
    Triangulation(#[from] TriangulationError),
}

/// Builds the initial foliated triangulation of a simulation.
///
/// Every timeslice carries a copy of the same spatial 2-triangulation and
/// consecutive slices are joined by splitting each triangular prism into a
/// (3,1), a (2,2) and a (1,3) tetrahedron.
#[derive(Debug, Clone)]
pub struct ManifoldBuilder {
    topology: Topology,
    simplices: usize,
    timeslices: usize,
    dimension: u32,
    initial_radius: f64,
    foliation_spacing: f64,
}

impl ManifoldBuilder {
    pub fn new(topology: Topology, simplices: usize, timeslices: usize) -> Self {
        Self {
            topology,
            simplices,
            timeslices,
            dimension: SUPPORTED_DIMENSION,
            initial_radius: 1.0,
            foliation_spacing: 1.0,
        }
    }

    pub fn dimension(mut self, dimension: u32) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn initial_radius(mut self, radius: f64) -> Self {
        self.initial_radius = radius;
        self
    }

    pub fn foliation_spacing(mut self, spacing: f64) -> Self {
        self.foliation_spacing = spacing;
        self
    }

    fn validate(&self) -> Result<(), BuildError> {
        if self.simplices < 2 || self.timeslices < 2 {
            return Err(BuildError::InvalidSize {
                simplices: self.simplices,
                timeslices: self.timeslices,
            });
        }
        if self.dimension != SUPPORTED_DIMENSION {
            return Err(BuildError::UnsupportedDimension(self.dimension));
        }
        for (name, value) in [
            ("initial-radius", self.initial_radius),
            ("foliation-spacing", self.foliation_spacing),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(BuildError::InvalidEmbedding { name, value });
            }
        }
        Ok(())
    }

    /// Target number of triangles in each spatial slice.
    fn target_faces(&self) -> usize {
        self.simplices / (3 * (self.timeslices - 1))
    }

    /// Constructs the triangulation and wraps it in a [`Manifold`].
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the parameters are out of range or the
    /// result fails validation.
    pub fn build(&self) -> Result<Manifold, BuildError> {
        self.validate()?;
        let last_slice = i32::try_from(self.timeslices).map_err(|_| BuildError::InvalidSize {
            simplices: self.simplices,
            timeslices: self.timeslices,
        })?;

        let surface = match self.topology {
            Topology::Spherical => {
                let mut surface = SpatialSurface::sphere((self.target_faces() / 2 + 2).max(6));
                let flips = surface.flip_towards_delaunay();
                debug!(flips, "Relaxed spatial sphere with edge flips.");
                surface
            }
            Topology::Toroidal => SpatialSurface::torus((self.target_faces() / 2).max(9)),
        };
        debug!(
            vertices = surface.points.len(),
            triangles = surface.triangles.len(),
            "Built spatial slice."
        );

        let mut triangulation =
            FoliatedTriangulation::new(self.topology, self.initial_radius, self.foliation_spacing);

        let mut slices: Vec<Vec<VertexId>> = Vec::with_capacity(self.timeslices);
        for t in 1..=last_slice {
            let level = slice_level(t, self.initial_radius, self.foliation_spacing);
            let ids = surface
                .points
                .iter()
                .map(|p| triangulation.add_vertex(self.embed(p, level), t))
                .collect();
            slices.push(ids);
        }

        for pair in slices.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            for triangle in &surface.triangles {
                let mut sorted = *triangle;
                sorted.sort_unstable();
                let [a, b, c] = sorted;
                triangulation.add_cell([lower[a], lower[b], lower[c], upper[c]])?;
                triangulation.add_cell([lower[a], lower[b], upper[b], upper[c]])?;
                triangulation.add_cell([lower[a], upper[a], upper[b], upper[c]])?;
            }
        }

        if !triangulation.is_foliated() {
            return Err(BuildError::NotFoliated);
        }
        let manifold = Manifold::new(triangulation)?;

        if manifold.n3() != self.simplices {
            info!(
                requested = self.simplices,
                actual = manifold.n3(),
                "Initial triangulation size differs from the requested number of simplices."
            );
        }
        Ok(manifold)
    }

    fn embed(&self, point: &Point3<f64>, level: f64) -> Point3<f64> {
        match self.topology {
            Topology::Spherical => Point3::from(point.coords * level),
            Topology::Toroidal => Point3::new(point.x, point.y, level),
        }
    }
}

/// A closed 2-triangulation used as the template for every timeslice.
///
/// Spherical points lie on the unit sphere; toroidal points lie in the unit
/// square at `z = 0`, with opposite sides identified.
#[derive(Debug, Clone)]
struct SpatialSurface {
    points: Vec<Point3<f64>>,
    triangles: Vec<[usize; 3]>,
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

impl SpatialSurface {
    /// Refines an octahedron by splitting the largest triangle until the
    /// surface has `target_vertices` vertices.
    fn sphere(target_vertices: usize) -> Self {
        let mut surface = Self {
            points: vec![
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(-1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, -1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(0.0, 0.0, -1.0),
            ],
            triangles: vec![
                [0, 2, 4],
                [2, 1, 4],
                [1, 3, 4],
                [3, 0, 4],
                [2, 0, 5],
                [1, 2, 5],
                [3, 1, 5],
                [0, 3, 5],
            ],
        };

        while surface.points.len() < target_vertices {
            let Some(largest) = surface
                .triangles
                .iter()
                .enumerate()
                .map(|(i, t)| (i, surface.area(t)))
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i)
            else {
                break;
            };
            let [a, b, c] = surface.triangles[largest];
            let centroid = Point3::from(
                (surface.points[a].coords + surface.points[b].coords + surface.points[c].coords)
                    / 3.0,
            );
            let p = surface.points.len();
            surface.points.push(project_to_sphere(&centroid, 1.0));
            surface.triangles[largest] = [a, b, p];
            surface.triangles.push([b, c, p]);
            surface.triangles.push([c, a, p]);
        }
        surface
    }

    /// An `n × m` periodic grid with every square cut along its diagonal.
    fn torus(target_vertices: usize) -> Self {
        let n = ((target_vertices as f64).sqrt().round() as usize).max(3);
        let m = target_vertices.div_ceil(n).max(3);
        let index = |i: usize, j: usize| (i % n) * m + (j % m);

        let mut points = Vec::with_capacity(n * m);
        for i in 0..n {
            for j in 0..m {
                points.push(Point3::new(i as f64 / n as f64, j as f64 / m as f64, 0.0));
            }
        }
        let mut triangles = Vec::with_capacity(2 * n * m);
        for i in 0..n {
            for j in 0..m {
                triangles.push([index(i, j), index(i + 1, j), index(i + 1, j + 1)]);
                triangles.push([index(i, j), index(i + 1, j + 1), index(i, j + 1)]);
            }
        }
        Self { points, triangles }
    }

    fn area(&self, triangle: &[usize; 3]) -> f64 {
        let [a, b, c] = *triangle;
        triangle_area(&self.points[a], &self.points[b], &self.points[c])
    }

    fn edge_map(&self) -> BTreeMap<(usize, usize), Vec<usize>> {
        let mut edges: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
        for (i, &[a, b, c]) in self.triangles.iter().enumerate() {
            for (u, w) in [(a, b), (b, c), (c, a)] {
                edges.entry(ordered(u, w)).or_default().push(i);
            }
        }
        edges
    }

    /// Flips edges whose opposite angles sum to more than π, for at most
    /// `MAX_FLIP_SWEEPS` sweeps. Returns the number of flips performed.
    ///
    /// A flip is skipped when the new edge already exists, so the surface
    /// stays a simplicial complex.
    fn flip_towards_delaunay(&mut self) -> usize {
        let mut total = 0;
        for _ in 0..MAX_FLIP_SWEEPS {
            let edges = self.edge_map();
            let mut touched = vec![false; self.triangles.len()];
            let mut created: BTreeSet<(usize, usize)> = BTreeSet::new();
            let mut flips = 0;

            for (&(u, w), owners) in &edges {
                let &[t1, t2] = owners.as_slice() else {
                    continue;
                };
                if touched[t1] || touched[t2] {
                    continue;
                }
                let third = |t: usize| self.triangles[t].into_iter().find(|&v| v != u && v != w);
                let (Some(c), Some(d)) = (third(t1), third(t2)) else {
                    continue;
                };
                let diagonal = ordered(c, d);
                if c == d || edges.contains_key(&diagonal) || created.contains(&diagonal) {
                    continue;
                }
                let p = &self.points;
                let opposite = angle_at(&p[c], &p[u], &p[w]) + angle_at(&p[d], &p[u], &p[w]);
                if opposite <= PI + FLIP_EPSILON {
                    continue;
                }
                self.triangles[t1] = [u, c, d];
                self.triangles[t2] = [w, d, c];
                touched[t1] = true;
                touched[t2] = true;
                created.insert(diagonal);
                flips += 1;
            }

            total += flips;
            if flips == 0 {
                break;
            }
        }
        total
    }
}
