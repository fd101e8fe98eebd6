use super::ids::VertexId;
use std::fmt;

/// An unordered pair of vertices, stored in ascending key order.
pub type Edge = [VertexId; 2];

/// An unordered triple of vertices, stored in ascending key order.
pub type Face = [VertexId; 3];

pub fn make_edge(a: VertexId, b: VertexId) -> Edge {
    if a <= b { [a, b] } else { [b, a] }
}

pub fn make_face(a: VertexId, b: VertexId, c: VertexId) -> Face {
    let mut face = [a, b, c];
    face.sort_unstable();
    face
}

/// Classification of a tetrahedron by how many of its vertices sit on the
/// lower and upper of the two timeslices it spans.
///
/// The discriminants follow the conventional `(lower, upper)` naming, so a
/// `(3,1)` simplex has three vertices on the earlier slice and one on the later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CellType {
    ThreeOne = 31,
    TwoTwo = 22,
    OneThree = 13,
    /// The cell does not span exactly two adjacent timeslices.
    Error = 0,
}

impl CellType {
    /// Classifies a tetrahedron from the timevalues of its four vertices.
    pub fn classify(timevalues: [i32; 4]) -> Self {
        let min = timevalues.iter().copied().fold(i32::MAX, i32::min);
        let max = timevalues.iter().copied().fold(i32::MIN, i32::max);
        if max - min != 1 {
            return Self::Error;
        }
        match timevalues.iter().filter(|&&t| t == min).count() {
            3 => Self::ThreeOne,
            2 => Self::TwoTwo,
            1 => Self::OneThree,
            _ => Self::Error,
        }
    }

    pub fn as_int(&self) -> u8 {
        *self as u8
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Error)
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::ThreeOne => "(3,1)",
                Self::TwoTwo => "(2,2)",
                Self::OneThree => "(1,3)",
                Self::Error => "(invalid)",
            }
        )
    }
}

/// A tetrahedron of the triangulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Vertex keys in ascending order.
    pub vertices: [VertexId; 4],
    pub kind: CellType,
}

impl Cell {
    pub fn new(mut vertices: [VertexId; 4], kind: CellType) -> Self {
        vertices.sort_unstable();
        Self { vertices, kind }
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    /// The four triangular faces; face `i` is opposite `vertices[i]`.
    pub fn faces(&self) -> [Face; 4] {
        let [a, b, c, d] = self.vertices;
        [[b, c, d], [a, c, d], [a, b, d], [a, b, c]]
    }

    pub fn edges(&self) -> [Edge; 6] {
        let [a, b, c, d] = self.vertices;
        [[a, b], [a, c], [a, d], [b, c], [b, d], [c, d]]
    }

    /// The vertex not on `face`, if `face` belongs to this cell.
    pub fn opposite(&self, face: &Face) -> Option<VertexId> {
        let mut outside = self.vertices.iter().filter(|v| !face.contains(v));
        match (outside.next(), outside.next()) {
            (Some(&v), None) => Some(v),
            _ => None,
        }
    }

    pub fn has_distinct_vertices(&self) -> bool {
        self.vertices.windows(2).all(|w| w[0] != w[1])
    }
}
