use crate::core::models::topology::Topology;
use nalgebra::{Point3, Vector3};

/// Radius of the sphere (or height of the plane) carrying timeslice `timevalue`.
pub fn slice_level(timevalue: i32, initial_radius: f64, foliation_spacing: f64) -> f64 {
    initial_radius + f64::from(timevalue - 1) * foliation_spacing
}

/// The quantity compared against [`slice_level`] to recover a point's slice:
/// distance from the origin for spheres, height for tori.
pub fn embedding_level(topology: Topology, point: &Point3<f64>) -> f64 {
    match topology {
        Topology::Spherical => point.coords.norm(),
        Topology::Toroidal => point.z,
    }
}

/// Rescales `point` onto the sphere of the given radius about the origin.
///
/// A point at the origin has no direction; it is placed on the +z axis.
pub fn project_to_sphere(point: &Point3<f64>, radius: f64) -> Point3<f64> {
    let norm = point.coords.norm();
    if norm <= f64::EPSILON {
        return Point3::new(0.0, 0.0, radius);
    }
    Point3::from(point.coords * (radius / norm))
}

/// Area of the flat triangle spanned by three points.
pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

/// Interior angle at `apex` of the triangle `(apex, b, c)`.
pub fn angle_at(apex: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let u = b - apex;
    let v = c - apex;
    let denom = u.norm() * v.norm();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (u.dot(&v) / denom).clamp(-1.0, 1.0).acos()
}

pub fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Point3::from(sum / points.len() as f64)
}

/// Centroid of points on the unit-periodic square `[0, 1)²`, keeping `z`.
///
/// Coordinates are unwrapped relative to the first point before averaging so
/// triangles that straddle the identification boundary land inside themselves.
pub fn periodic_centroid(points: &[Point3<f64>]) -> Point3<f64> {
    let Some(first) = points.first() else {
        return Point3::origin();
    };
    let unwrap = |reference: f64, value: f64| {
        let d = value - reference;
        value - d.round()
    };
    let unwrapped: Vec<Point3<f64>> = points
        .iter()
        .map(|p| Point3::new(unwrap(first.x, p.x), unwrap(first.y, p.y), p.z))
        .collect();
    let c = centroid(&unwrapped);
    Point3::new(c.x.rem_euclid(1.0), c.y.rem_euclid(1.0), c.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn slice_level_grows_linearly_with_timevalue() {
        assert!((slice_level(1, 1.0, 1.0) - 1.0).abs() < EPS);
        assert!((slice_level(4, 2.0, 0.5) - 3.5).abs() < EPS);
    }

    #[test]
    fn project_to_sphere_preserves_direction() {
        let p = project_to_sphere(&Point3::new(3.0, 0.0, 4.0), 10.0);
        assert!((p.coords.norm() - 10.0).abs() < EPS);
        assert!((p.x - 6.0).abs() < EPS);
        assert!((p.z - 8.0).abs() < EPS);
    }

    #[test]
    fn project_to_sphere_handles_origin() {
        let p = project_to_sphere(&Point3::origin(), 2.0);
        assert!((p.coords.norm() - 2.0).abs() < EPS);
    }

    #[test]
    fn periodic_centroid_unwraps_boundary_triangles() {
        let pts = [
            Point3::new(0.95, 0.5, 1.0),
            Point3::new(0.05, 0.5, 1.0),
            Point3::new(0.0, 0.6, 1.0),
        ];
        let c = periodic_centroid(&pts);
        assert!(c.x < 0.05 || c.x > 0.95, "centroid escaped the triangle: {c}");
        assert!((c.z - 1.0).abs() < EPS);
    }

    #[test]
    fn angle_of_right_triangle_is_half_pi() {
        let a = Point3::origin();
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        assert!((angle_at(&a, &b, &c) - std::f64::consts::FRAC_PI_2).abs() < EPS);
        assert!((triangle_area(&a, &b, &c) - 0.5).abs() < EPS);
    }
}
