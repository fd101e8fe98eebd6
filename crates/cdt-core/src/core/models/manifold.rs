use super::cell::{Cell, CellType, Edge, Face};
use super::geometry::{Geometry, GeometryDelta};
use super::ids::{CellId, VertexId};
use super::topology::Topology;
use super::triangulation::{FoliatedTriangulation, TriangulationError};
use std::collections::BTreeMap;
use tracing::trace;

/// A foliated triangulation together with its cached simplex counts.
///
/// The cached [`Geometry`] is kept current by applying the exact local change
/// computed for every cell replacement, so simulations never need to recount
/// the whole triangulation between moves.
#[derive(Debug, Clone)]
pub struct Manifold {
    triangulation: FoliatedTriangulation,
    geometry: Geometry,
}

/// The record of an uncommitted cell replacement.
///
/// Produced by [`Manifold::replace_cells`]; it must be passed back to either
/// [`Manifold::commit`] or [`Manifold::revert`].
#[derive(Debug, Clone)]
#[must_use = "a cell replacement must be committed or reverted"]
pub struct CellReplacement {
    removed: Vec<Cell>,
    added: Vec<CellId>,
    added_kinds: Vec<CellType>,
    touched: Vec<VertexId>,
    orphaned: Vec<VertexId>,
    delta: GeometryDelta,
}

impl CellReplacement {
    /// Exact change in simplex counts caused by the replacement.
    pub fn delta(&self) -> &GeometryDelta {
        &self.delta
    }

    pub fn added_kinds(&self) -> &[CellType] {
        &self.added_kinds
    }

    pub fn added(&self) -> &[CellId] {
        &self.added
    }

    /// Vertices left without incident cells; they are deleted on commit.
    pub fn orphaned(&self) -> &[VertexId] {
        &self.orphaned
    }

    /// Every vertex of a removed or added cell.
    pub fn touched(&self) -> &[VertexId] {
        &self.touched
    }
}

#[derive(Default)]
struct LocalCounts {
    edges_tl: i64,
    edges_sl: i64,
    faces: i64,
    vertices: i64,
}

impl Manifold {
    /// Wraps a triangulation after checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure reported by
    /// [`FoliatedTriangulation::check_validity`].
    pub fn new(triangulation: FoliatedTriangulation) -> Result<Self, TriangulationError> {
        triangulation.check_validity()?;
        let geometry = Geometry::from(&triangulation);
        Ok(Self {
            triangulation,
            geometry,
        })
    }

    pub fn triangulation(&self) -> &FoliatedTriangulation {
        &self.triangulation
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn topology(&self) -> Topology {
        self.triangulation.topology()
    }

    pub fn n3(&self) -> usize {
        self.geometry.n3
    }

    pub fn n0(&self) -> usize {
        self.geometry.n0
    }

    pub fn min_time(&self) -> i32 {
        self.triangulation.min_time()
    }

    pub fn max_time(&self) -> i32 {
        self.triangulation.max_time()
    }

    pub fn initial_radius(&self) -> f64 {
        self.triangulation.initial_radius()
    }

    pub fn foliation_spacing(&self) -> f64 {
        self.triangulation.foliation_spacing()
    }

    pub fn volume_per_timeslice(&self) -> BTreeMap<i32, usize> {
        self.triangulation.volume_per_timeslice()
    }

    /// Recounts the cached geometry from the triangulation.
    pub fn update(&mut self) {
        self.geometry = Geometry::from(&self.triangulation);
    }

    pub fn is_valid(&self) -> bool {
        self.triangulation.is_valid()
    }

    /// Full consistency check: structural validity plus agreement between the
    /// cached geometry and a fresh recount.
    pub fn check_consistency(&self) -> Result<(), TriangulationError> {
        self.triangulation.check_validity()?;
        let recount = Geometry::from(&self.triangulation);
        if recount != self.geometry {
            return Err(TriangulationError::Invalid(format!(
                "cached geometry [{}] disagrees with recount [{}]",
                self.geometry, recount
            )));
        }
        Ok(())
    }

    pub(crate) fn add_vertex(&mut self, point: nalgebra::Point3<f64>, timevalue: i32) -> VertexId {
        self.triangulation.add_vertex(point, timevalue)
    }

    pub(crate) fn remove_detached_vertex(&mut self, v: VertexId) -> Result<(), TriangulationError> {
        self.triangulation.remove_vertex(v).map(|_| ())
    }

    /// Removes `remove` and inserts cells on each vertex quadruple in `add`,
    /// measuring the exact change in simplex counts.
    ///
    /// The cached geometry is not touched until [`commit`](Self::commit).
    ///
    /// # Errors
    ///
    /// If any removal or insertion fails, everything done so far is undone
    /// and the triangulation error is returned.
    pub fn replace_cells(
        &mut self,
        remove: &[CellId],
        add: &[[VertexId; 4]],
    ) -> Result<CellReplacement, TriangulationError> {
        let mut removed_cells: Vec<Cell> = Vec::with_capacity(remove.len());
        for &id in remove {
            let cell = self
                .triangulation
                .cell(id)
                .ok_or(TriangulationError::CellNotFound(id))?;
            removed_cells.push(cell.clone());
        }
        let proposed: Vec<Cell> = add
            .iter()
            .map(|&vertices| Cell::new(vertices, CellType::Error))
            .collect();

        let mut touched: Vec<VertexId> = removed_cells
            .iter()
            .chain(proposed.iter())
            .flat_map(|c| c.vertices)
            .collect();
        touched.sort_unstable();
        touched.dedup();

        let mut edges: Vec<Edge> = removed_cells
            .iter()
            .chain(proposed.iter())
            .flat_map(|c| c.edges())
            .collect();
        edges.sort_unstable();
        edges.dedup();

        let mut faces: Vec<Face> = removed_cells
            .iter()
            .chain(proposed.iter())
            .flat_map(|c| c.faces())
            .collect();
        faces.sort_unstable();
        faces.dedup();

        let before = self.local_counts(&touched, &edges, &faces);

        for &id in remove {
            self.triangulation.remove_cell(id);
        }
        let mut added: Vec<CellId> = Vec::with_capacity(add.len());
        for vertices in add {
            match self.triangulation.add_cell(*vertices) {
                Ok(id) => added.push(id),
                Err(e) => {
                    trace!(error = %e, "Cell insertion failed, restoring removed cells.");
                    self.undo(&added, &removed_cells)?;
                    return Err(e);
                }
            }
        }

        let after = self.local_counts(&touched, &edges, &faces);

        let added_kinds: Vec<CellType> = added
            .iter()
            .filter_map(|&id| self.triangulation.cell(id).map(|c| c.kind))
            .collect();
        let kind_delta = |kind: CellType| {
            added_kinds.iter().filter(|&&k| k == kind).count() as i64
                - removed_cells.iter().filter(|c| c.kind == kind).count() as i64
        };

        let delta = GeometryDelta {
            n3: added.len() as i64 - removed_cells.len() as i64,
            n3_31: kind_delta(CellType::ThreeOne),
            n3_22: kind_delta(CellType::TwoTwo),
            n3_13: kind_delta(CellType::OneThree),
            n2: after.faces - before.faces,
            n1: (after.edges_tl + after.edges_sl) - (before.edges_tl + before.edges_sl),
            n1_tl: after.edges_tl - before.edges_tl,
            n1_sl: after.edges_sl - before.edges_sl,
            n0: after.vertices - before.vertices,
        };

        let orphaned: Vec<VertexId> = touched
            .iter()
            .copied()
            .filter(|&v| !self.triangulation.is_attached(v))
            .collect();

        Ok(CellReplacement {
            removed: removed_cells,
            added,
            added_kinds,
            touched,
            orphaned,
            delta,
        })
    }

    /// Finalizes a replacement: deletes orphaned vertices and updates the
    /// cached geometry by the measured delta.
    pub fn commit(&mut self, replacement: CellReplacement) -> Result<(), TriangulationError> {
        for &v in &replacement.orphaned {
            self.triangulation.remove_vertex(v)?;
        }
        match self.geometry.checked_apply(&replacement.delta) {
            Some(geometry) => self.geometry = geometry,
            None => self.update(),
        }
        Ok(())
    }

    /// Undoes a replacement, restoring the removed cells.
    ///
    /// Restored cells receive fresh IDs; vertex IDs are unchanged.
    pub fn revert(&mut self, replacement: CellReplacement) -> Result<(), TriangulationError> {
        self.undo(&replacement.added, &replacement.removed)
    }

    fn undo(&mut self, added: &[CellId], removed: &[Cell]) -> Result<(), TriangulationError> {
        for &id in added {
            self.triangulation.remove_cell(id);
        }
        for cell in removed {
            self.triangulation.add_cell(cell.vertices)?;
        }
        Ok(())
    }

    fn local_counts(&self, vertices: &[VertexId], edges: &[Edge], faces: &[Face]) -> LocalCounts {
        let mut counts = LocalCounts::default();
        for edge in edges {
            if self.triangulation.edge_exists(edge[0], edge[1]) {
                if self.triangulation.is_timelike(edge) {
                    counts.edges_tl += 1;
                } else {
                    counts.edges_sl += 1;
                }
            }
        }
        counts.faces = faces
            .iter()
            .filter(|f| self.triangulation.face_exists(f))
            .count() as i64;
        counts.vertices = vertices
            .iter()
            .filter(|&&v| self.triangulation.is_attached(v))
            .count() as i64;
        counts
    }
}
