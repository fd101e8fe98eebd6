use nalgebra::Point3;

/// A vertex of the foliated triangulation.
///
/// The embedding `point` is only used for export and for recovering the
/// foliation; all move logic is combinatorial and driven by `timevalue`.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub point: Point3<f64>,
    /// Index of the timeslice this vertex lies on, starting at 1.
    pub timevalue: i32,
}

impl Vertex {
    pub fn new(point: Point3<f64>, timevalue: i32) -> Self {
        Self { point, timevalue }
    }
}
