use super::cell::{Cell, CellType, Edge, Face, make_face};
use super::ids::{CellId, VertexId};
use super::topology::Topology;
use super::vertex::Vertex;
use crate::core::utils::geometry::{embedding_level, slice_level};
use nalgebra::Point3;
use rayon::prelude::*;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// Relative tolerance used when recovering timevalues from the embedding.
pub const TOLERANCE: f64 = 0.01;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TriangulationError {
    #[error("Vertex {0:?} not found in triangulation")]
    VertexNotFound(VertexId),

    #[error("Cell {0:?} not found in triangulation")]
    CellNotFound(CellId),

    #[error("Cell has repeated vertices")]
    DegenerateCell,

    #[error("A cell with vertices {0:?} already exists")]
    DuplicateCell([VertexId; 4]),

    #[error("Face {0:?} is already shared by two cells")]
    NonManifoldFace(Face),

    #[error("Vertex {0:?} still has incident cells")]
    VertexInUse(VertexId),

    #[error("Invalid triangulation: {0}")]
    Invalid(String),
}

/// A simplicial 3-manifold whose vertices are partitioned into timeslices.
///
/// Cells live in a generational arena and are cross-indexed two ways: every
/// triangular face maps to the (one or two) cells containing it, and every
/// vertex maps to the set of its incident cells. All mutation goes through
/// [`add_cell`](Self::add_cell) and [`remove_cell`](Self::remove_cell), which
/// keep both indices consistent with the arena.
#[derive(Debug, Clone)]
pub struct FoliatedTriangulation {
    topology: Topology,
    initial_radius: f64,
    foliation_spacing: f64,
    vertices: SlotMap<VertexId, Vertex>,
    cells: SlotMap<CellId, Cell>,
    faces: HashMap<Face, Vec<CellId>>,
    incidence: SecondaryMap<VertexId, HashSet<CellId>>,
}

impl FoliatedTriangulation {
    /// Creates an empty triangulation.
    ///
    /// # Arguments
    ///
    /// * `topology` - The global topology the triangulation will have.
    /// * `initial_radius` - Radius (or height) of the first timeslice.
    /// * `foliation_spacing` - Distance between consecutive timeslices.
    pub fn new(topology: Topology, initial_radius: f64, foliation_spacing: f64) -> Self {
        Self {
            topology,
            initial_radius,
            foliation_spacing,
            vertices: SlotMap::with_key(),
            cells: SlotMap::with_key(),
            faces: HashMap::new(),
            incidence: SecondaryMap::new(),
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn initial_radius(&self) -> f64 {
        self.initial_radius
    }

    pub fn foliation_spacing(&self) -> f64 {
        self.foliation_spacing
    }

    // --- Mutation ---

    /// Inserts an isolated vertex. It must be attached to cells before the
    /// triangulation is considered valid again.
    pub fn add_vertex(&mut self, point: Point3<f64>, timevalue: i32) -> VertexId {
        let id = self.vertices.insert(Vertex::new(point, timevalue));
        self.incidence.insert(id, HashSet::new());
        id
    }

    /// Removes a vertex that no longer has any incident cells.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::VertexInUse`] if cells still reference it.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<Vertex, TriangulationError> {
        match self.incidence.get(id) {
            None => return Err(TriangulationError::VertexNotFound(id)),
            Some(cells) if !cells.is_empty() => return Err(TriangulationError::VertexInUse(id)),
            Some(_) => {}
        }
        self.incidence.remove(id);
        self.vertices
            .remove(id)
            .ok_or(TriangulationError::VertexNotFound(id))
    }

    /// Adds a tetrahedron, classifying it from its vertices' timevalues.
    ///
    /// # Errors
    ///
    /// Fails without modifying the triangulation if a vertex is unknown, the
    /// vertices are not distinct, the same cell already exists, or one of its
    /// faces is already shared by two cells.
    pub fn add_cell(&mut self, vertices: [VertexId; 4]) -> Result<CellId, TriangulationError> {
        let mut timevalues = [0; 4];
        for (slot, &v) in timevalues.iter_mut().zip(vertices.iter()) {
            *slot = self
                .vertices
                .get(v)
                .ok_or(TriangulationError::VertexNotFound(v))?
                .timevalue;
        }
        let cell = Cell::new(vertices, CellType::classify(timevalues));
        if !cell.has_distinct_vertices() {
            return Err(TriangulationError::DegenerateCell);
        }
        if self.find_cell(&cell.vertices).is_some() {
            return Err(TriangulationError::DuplicateCell(cell.vertices));
        }
        for face in cell.faces() {
            if self.faces.get(&face).is_some_and(|c| c.len() >= 2) {
                return Err(TriangulationError::NonManifoldFace(face));
            }
        }

        let faces = cell.faces();
        let cell_vertices = cell.vertices;
        let id = self.cells.insert(cell);
        for face in faces {
            self.faces.entry(face).or_default().push(id);
        }
        for v in cell_vertices {
            if let Some(set) = self.incidence.get_mut(v) {
                set.insert(id);
            }
        }
        Ok(id)
    }

    /// Removes a tetrahedron and detaches it from both indices.
    pub fn remove_cell(&mut self, id: CellId) -> Option<Cell> {
        let cell = self.cells.remove(id)?;
        for face in cell.faces() {
            if let Some(cells) = self.faces.get_mut(&face) {
                cells.retain(|&c| c != id);
                if cells.is_empty() {
                    self.faces.remove(&face);
                }
            }
        }
        for v in cell.vertices {
            if let Some(set) = self.incidence.get_mut(v) {
                set.remove(&id);
            }
        }
        Some(cell)
    }

    // --- Element access ---

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    pub fn timevalue(&self, id: VertexId) -> Option<i32> {
        self.vertices.get(id).map(|v| v.timevalue)
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices.iter()
    }

    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.cells.iter()
    }

    pub fn number_of_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn number_of_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn number_of_faces(&self) -> usize {
        self.faces.len()
    }

    /// Returns the IDs of all cells of the given type, in arena order.
    pub fn cells_of_type(&self, kind: CellType) -> Vec<CellId> {
        self.cells
            .iter()
            .filter(|(_, c)| c.kind == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// Looks up the cell with exactly these four vertices.
    pub fn find_cell(&self, vertices: &[VertexId; 4]) -> Option<CellId> {
        let mut sorted = *vertices;
        sorted.sort_unstable();
        let [a, b, c, _] = sorted;
        self.faces
            .get(&[a, b, c])?
            .iter()
            .copied()
            .find(|&id| self.cells.get(id).is_some_and(|cell| cell.vertices == sorted))
    }

    // --- Adjacency ---

    /// Whether the vertex exists and has at least one incident cell.
    pub fn is_attached(&self, v: VertexId) -> bool {
        self.incidence.get(v).is_some_and(|s| !s.is_empty())
    }

    /// Cells incident to a vertex, sorted by key for reproducible iteration.
    pub fn incident_cells(&self, v: VertexId) -> Vec<CellId> {
        let mut cells: Vec<CellId> = self
            .incidence
            .get(v)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        cells.sort_unstable();
        cells
    }

    /// Cells containing both endpoints of an edge, sorted by key.
    pub fn cells_around_edge(&self, edge: &Edge) -> Vec<CellId> {
        let (Some(a), Some(b)) = (self.incidence.get(edge[0]), self.incidence.get(edge[1])) else {
            return Vec::new();
        };
        let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        let mut cells: Vec<CellId> = small.intersection(large).copied().collect();
        cells.sort_unstable();
        cells
    }

    pub fn edge_exists(&self, a: VertexId, b: VertexId) -> bool {
        match (self.incidence.get(a), self.incidence.get(b)) {
            (Some(sa), Some(sb)) => {
                let (small, large) = if sa.len() <= sb.len() { (sa, sb) } else { (sb, sa) };
                small.iter().any(|c| large.contains(c))
            }
            _ => false,
        }
    }

    pub fn face_exists(&self, face: &Face) -> bool {
        self.faces.contains_key(&make_face(face[0], face[1], face[2]))
    }

    /// Cells sharing the given face: one on the boundary, two in the interior.
    pub fn face_cells(&self, face: &Face) -> &[CellId] {
        self.faces
            .get(&make_face(face[0], face[1], face[2]))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The cell on the other side of `face` from `cell`, if any.
    pub fn neighbor(&self, cell: CellId, face: &Face) -> Option<CellId> {
        self.face_cells(face).iter().copied().find(|&c| c != cell)
    }

    /// Distinct vertices sharing an edge with `v`, sorted by key.
    pub fn vertex_neighbors(&self, v: VertexId) -> Vec<VertexId> {
        let mut neighbors: Vec<VertexId> = self
            .incident_cells(v)
            .into_iter()
            .filter_map(|c| self.cells.get(c))
            .flat_map(|cell| cell.vertices)
            .filter(|&w| w != v)
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    /// Number of edges incident to a vertex.
    pub fn degree(&self, v: VertexId) -> usize {
        self.vertex_neighbors(v).len()
    }

    // --- Edges, faces and the foliation ---

    /// All edges, sorted and deduplicated.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self.cells.values().flat_map(|c| c.edges()).collect();
        edges.par_sort_unstable();
        edges.dedup();
        edges
    }

    /// An edge is timelike when its endpoints lie on different timeslices.
    pub fn is_timelike(&self, edge: &Edge) -> bool {
        match (self.timevalue(edge[0]), self.timevalue(edge[1])) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }

    pub fn timelike_edges(&self) -> Vec<Edge> {
        self.edges()
            .into_iter()
            .filter(|e| self.is_timelike(e))
            .collect()
    }

    pub fn spacelike_edges(&self) -> Vec<Edge> {
        self.edges()
            .into_iter()
            .filter(|e| !self.is_timelike(e))
            .collect()
    }

    /// All faces, sorted.
    pub fn faces(&self) -> Vec<Face> {
        let mut faces: Vec<Face> = self.faces.keys().copied().collect();
        faces.sort_unstable();
        faces
    }

    /// The slice of a face if all three vertices share a timevalue.
    pub fn spacelike_face_time(&self, face: &Face) -> Option<i32> {
        let t = self.timevalue(face[0])?;
        (self.timevalue(face[1])? == t && self.timevalue(face[2])? == t).then_some(t)
    }

    pub fn spacelike_faces(&self) -> Vec<Face> {
        self.faces()
            .into_iter()
            .filter(|f| self.spacelike_face_time(f).is_some())
            .collect()
    }

    pub fn min_time(&self) -> i32 {
        self.vertices.values().map(|v| v.timevalue).min().unwrap_or(0)
    }

    pub fn max_time(&self) -> i32 {
        self.vertices.values().map(|v| v.timevalue).max().unwrap_or(0)
    }

    /// Number of spacelike faces (the spatial volume) on each timeslice.
    ///
    /// Every slice between `min_time` and `max_time` appears, even if empty.
    pub fn volume_per_timeslice(&self) -> BTreeMap<i32, usize> {
        let mut volumes: BTreeMap<i32, usize> = BTreeMap::new();
        if self.vertices.is_empty() {
            return volumes;
        }
        for t in self.min_time()..=self.max_time() {
            volumes.insert(t, 0);
        }
        for face in self.faces.keys() {
            if let Some(t) = self.spacelike_face_time(face) {
                *volumes.entry(t).or_default() += 1;
            }
        }
        volumes
    }

    /// Radius (spherical) or height (toroidal) of a timeslice in the embedding.
    pub fn slice_level(&self, timevalue: i32) -> f64 {
        slice_level(timevalue, self.initial_radius, self.foliation_spacing)
    }

    /// Recovers the timevalue a point would have from its embedding alone.
    pub fn expected_timevalue(&self, point: &Point3<f64>) -> i32 {
        let level = embedding_level(self.topology, point);
        ((level - self.initial_radius) / self.foliation_spacing).round() as i32 + 1
    }

    /// Checks that every vertex's embedding agrees with its timevalue.
    pub fn is_foliated(&self) -> bool {
        let vertices: Vec<&Vertex> = self.vertices.values().collect();
        vertices.par_iter().all(|v| {
            let level = embedding_level(self.topology, &v.point);
            (level - self.slice_level(v.timevalue)).abs() <= TOLERANCE * self.foliation_spacing
        })
    }

    // --- Validation ---

    /// Verifies the structural and causal invariants of the triangulation.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::Invalid`] describing the first violation
    /// found: an unclassifiable or degenerate cell, a face shared by more than
    /// two cells, an index entry out of sync with the cell arena, or an
    /// orphaned vertex.
    pub fn check_validity(&self) -> Result<(), TriangulationError> {
        let cells: Vec<(CellId, &Cell)> = self.cells.iter().collect();

        let bad_cell = cells.par_iter().find_any(|(_, cell)| {
            !cell.kind.is_valid()
                || !cell.has_distinct_vertices()
                || cell.vertices.iter().any(|&v| !self.vertices.contains_key(v))
        });
        if let Some((id, cell)) = bad_cell {
            return Err(TriangulationError::Invalid(format!(
                "cell {:?} of type {} is not a causal tetrahedron",
                id, cell.kind
            )));
        }

        for (id, cell) in &cells {
            let timevalues = cell.vertices.map(|v| self.vertices[v].timevalue);
            if CellType::classify(timevalues) != cell.kind {
                return Err(TriangulationError::Invalid(format!(
                    "cell {:?} has a stale classification",
                    id
                )));
            }
            for face in cell.faces() {
                if !self.face_cells(&face).contains(id) {
                    return Err(TriangulationError::Invalid(format!(
                        "face {:?} of cell {:?} is missing from the face index",
                        face, id
                    )));
                }
            }
            for v in cell.vertices {
                if !self.incidence.get(v).is_some_and(|s| s.contains(id)) {
                    return Err(TriangulationError::Invalid(format!(
                        "vertex {:?} does not list incident cell {:?}",
                        v, id
                    )));
                }
            }
        }

        for (face, owners) in &self.faces {
            if owners.is_empty() || owners.len() > 2 {
                return Err(TriangulationError::Invalid(format!(
                    "face {:?} has {} incident cells",
                    face,
                    owners.len()
                )));
            }
            if owners.iter().any(|&c| !self.cells.contains_key(c)) {
                return Err(TriangulationError::Invalid(format!(
                    "face {:?} references a removed cell",
                    face
                )));
            }
        }

        for (v, _) in &self.vertices {
            match self.incidence.get(v) {
                Some(set) if !set.is_empty() => {}
                _ => {
                    return Err(TriangulationError::Invalid(format!(
                        "vertex {:?} has no incident cells",
                        v
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.check_validity().is_ok()
    }

    /// Classifies an arbitrary vertex quadruple without inserting it.
    pub fn classify(&self, vertices: &[VertexId; 4]) -> Option<CellType> {
        let mut timevalues = [0; 4];
        for (slot, &v) in timevalues.iter_mut().zip(vertices.iter()) {
            *slot = self.timevalue(v)?;
        }
        Some(CellType::classify(timevalues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two tetrahedra glued along a spacelike face: a (1,3) below and a (3,1) above.
    fn bipyramid() -> (FoliatedTriangulation, [VertexId; 5], [CellId; 2]) {
        let mut tri = FoliatedTriangulation::new(Topology::Spherical, 1.0, 1.0);
        let bottom = tri.add_vertex(Point3::new(0.0, 0.0, 1.0), 1);
        let x = tri.add_vertex(Point3::new(2.0, 0.0, 0.0), 2);
        let y = tri.add_vertex(Point3::new(0.0, 2.0, 0.0), 2);
        let z = tri.add_vertex(Point3::new(0.0, 0.0, 2.0), 2);
        let top = tri.add_vertex(Point3::new(3.0, 0.0, 0.0), 3);
        let lower = tri.add_cell([bottom, x, y, z]).unwrap();
        let upper = tri.add_cell([top, x, y, z]).unwrap();
        (tri, [bottom, x, y, z, top], [lower, upper])
    }

    #[test]
    fn add_cell_classifies_and_indexes_faces() {
        let (tri, [bottom, x, y, z, top], [lower, upper]) = bipyramid();

        assert_eq!(tri.cell(lower).unwrap().kind, CellType::OneThree);
        assert_eq!(tri.cell(upper).unwrap().kind, CellType::ThreeOne);
        assert_eq!(tri.number_of_faces(), 7);
        assert_eq!(tri.face_cells(&make_face(x, y, z)).len(), 2);
        assert_eq!(tri.neighbor(lower, &make_face(z, y, x)), Some(upper));
        assert_eq!(tri.incident_cells(x).len(), 2);
        assert!(tri.edge_exists(bottom, x));
        assert!(!tri.edge_exists(bottom, top));
        assert!(tri.is_valid());
    }

    #[test]
    fn edges_are_split_into_timelike_and_spacelike() {
        let (tri, ..) = bipyramid();
        assert_eq!(tri.edges().len(), 9);
        assert_eq!(tri.timelike_edges().len(), 6);
        assert_eq!(tri.spacelike_edges().len(), 3);
    }

    #[test]
    fn duplicate_and_degenerate_cells_are_rejected() {
        let (mut tri, [bottom, x, y, z, top], _) = bipyramid();
        assert_eq!(
            tri.add_cell([z, y, x, bottom]),
            Err(TriangulationError::DuplicateCell(
                Cell::new([bottom, x, y, z], CellType::OneThree).vertices
            ))
        );
        assert_eq!(
            tri.add_cell([x, x, y, top]),
            Err(TriangulationError::DegenerateCell)
        );
    }

    #[test]
    fn third_cell_on_a_face_is_rejected() {
        let (mut tri, [_, x, y, z, _], _) = bipyramid();
        let extra = tri.add_vertex(Point3::new(0.0, 0.0, 3.0), 3);
        assert_eq!(
            tri.add_cell([extra, x, y, z]),
            Err(TriangulationError::NonManifoldFace(make_face(x, y, z)))
        );
        assert_eq!(tri.number_of_cells(), 2);
    }

    #[test]
    fn remove_cell_cleans_up_indices() {
        let (mut tri, [_, x, y, z, top], [_, upper]) = bipyramid();
        let removed = tri.remove_cell(upper).unwrap();
        assert_eq!(removed.kind, CellType::ThreeOne);
        assert_eq!(tri.face_cells(&make_face(x, y, z)).len(), 1);
        assert!(tri.incident_cells(top).is_empty());
        assert!(!tri.is_valid(), "orphaned vertex must invalidate the triangulation");
        tri.remove_vertex(top).unwrap();
        assert!(tri.is_valid());
    }

    #[test]
    fn remove_vertex_refuses_vertices_in_use() {
        let (mut tri, [bottom, ..], _) = bipyramid();
        assert_eq!(
            tri.remove_vertex(bottom),
            Err(TriangulationError::VertexInUse(bottom))
        );
    }

    #[test]
    fn volume_per_timeslice_counts_spacelike_faces() {
        let (tri, ..) = bipyramid();
        let volumes = tri.volume_per_timeslice();
        assert_eq!(volumes.get(&1), Some(&0));
        assert_eq!(volumes.get(&2), Some(&1));
        assert_eq!(volumes.get(&3), Some(&0));
        assert_eq!(tri.min_time(), 1);
        assert_eq!(tri.max_time(), 3);
    }

    #[test]
    fn is_foliated_compares_radius_with_timevalue() {
        let (mut tri, ..) = bipyramid();
        assert!(tri.is_foliated());
        tri.add_vertex(Point3::new(0.0, 0.0, 5.0), 2);
        assert!(!tri.is_foliated());
        assert_eq!(tri.expected_timevalue(&Point3::new(0.0, 0.0, 5.0)), 5);
    }

    #[test]
    fn invalid_causal_cell_fails_validation() {
        let mut tri = FoliatedTriangulation::new(Topology::Spherical, 1.0, 1.0);
        let a = tri.add_vertex(Point3::new(1.0, 0.0, 0.0), 1);
        let b = tri.add_vertex(Point3::new(0.0, 1.0, 0.0), 1);
        let c = tri.add_vertex(Point3::new(0.0, 0.0, 1.0), 1);
        let d = tri.add_vertex(Point3::new(0.0, 0.0, 3.0), 3);
        tri.add_cell([a, b, c, d]).unwrap();
        assert!(matches!(
            tri.check_validity(),
            Err(TriangulationError::Invalid(_))
        ));
    }
}
