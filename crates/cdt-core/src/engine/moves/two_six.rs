use super::check::{replace_checked, shuffled};
use super::{MoveError, MoveType};
use crate::core::models::cell::{CellType, Face};
use crate::core::models::ids::{CellId, VertexId};
use crate::core::models::manifold::Manifold;
use crate::core::models::topology::Topology;
use crate::core::utils::geometry::{centroid, periodic_centroid, project_to_sphere};
use nalgebra::Point3;
use rand::Rng;
use tracing::instrument;

struct Site {
    remove: [CellId; 2],
    bottom: VertexId,
    top: VertexId,
    face: Face,
    timevalue: i32,
}

/// A (1,3) cell qualifies when its spacelike face is shared with a (3,1)
/// cell one slice further up.
fn site_at(manifold: &Manifold, cell: CellId) -> Option<Site> {
    let tri = manifold.triangulation();
    let c = tri.cell(cell)?;
    let bottom = *c
        .vertices
        .iter()
        .min_by_key(|&&v| tri.timevalue(v).unwrap_or(i32::MAX))?;
    let mut face = [bottom; 3];
    for (slot, v) in face
        .iter_mut()
        .zip(c.vertices.iter().copied().filter(|&v| v != bottom))
    {
        *slot = v;
    }
    let timevalue = tri.spacelike_face_time(&face)?;

    let neighbor = tri.neighbor(cell, &face)?;
    let top = tri.cell(neighbor)?.opposite(&face)?;
    if tri.timevalue(top)? != timevalue + 1 {
        return None;
    }
    Some(Site {
        remove: [cell, neighbor],
        bottom,
        top,
        face,
        timevalue,
    })
}

/// Position for a vertex inserted into `face`, on the face's timeslice.
fn insertion_point(manifold: &Manifold, face: &Face, timevalue: i32) -> Option<Point3<f64>> {
    let tri = manifold.triangulation();
    let mut points = Vec::with_capacity(3);
    for &v in face {
        points.push(tri.vertex(v)?.point);
    }
    Some(match manifold.topology() {
        Topology::Spherical => project_to_sphere(&centroid(&points), tri.slice_level(timevalue)),
        Topology::Toroidal => {
            let c = periodic_centroid(&points);
            Point3::new(c.x, c.y, tri.slice_level(timevalue))
        }
    })
}

/// Splits the spacelike face shared by a (1,3) and a (3,1) cell by inserting
/// a vertex, turning the two cells into six.
#[instrument(level = "trace", skip_all)]
pub fn do_26_move(manifold: &mut Manifold, rng: &mut impl Rng) -> Result<(), MoveError> {
    let candidates = shuffled(
        manifold.triangulation().cells_of_type(CellType::OneThree),
        rng,
    );
    for cell in candidates {
        let Some(site) = site_at(manifold, cell) else {
            continue;
        };
        let Some(point) = insertion_point(manifold, &site.face, site.timevalue) else {
            continue;
        };
        let v = manifold.add_vertex(point, site.timevalue);
        let [x, y, z] = site.face;
        let (a, b) = (site.bottom, site.top);
        let add = [
            [a, v, x, y],
            [a, v, y, z],
            [a, v, x, z],
            [b, v, x, y],
            [b, v, y, z],
            [b, v, x, z],
        ];
        return replace_checked(manifold, MoveType::TwoSix, &site.remove, &add, Some(v));
    }
    Err(MoveError::NoCandidate(MoveType::TwoSix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::moves::test_support::*;

    #[test]
    fn inserts_a_vertex_on_an_interior_slice() {
        let mut manifold = sphere();
        let mut rng = rng();
        let before = *manifold.geometry();
        let volumes_before = manifold.volume_per_timeslice();

        do_26_move(&mut manifold, &mut rng).unwrap();

        let after = manifold.geometry();
        assert_eq!(after.n0, before.n0 + 1);
        assert_eq!(after.n3, before.n3 + 4);
        assert_eq!(after.n3_31, before.n3_31 + 2);
        assert_eq!(after.n3_13, before.n3_13 + 2);
        assert_eq!(after.n1_sl, before.n1_sl + 3);

        let volumes_after = manifold.volume_per_timeslice();
        let grown: Vec<i32> = volumes_after
            .iter()
            .filter(|&(t, v)| volumes_before.get(t) != Some(v))
            .map(|(t, _)| *t)
            .collect();
        assert_eq!(grown.len(), 1);
        assert_eq!(volumes_after[&grown[0]], volumes_before[&grown[0]] + 2);
        assert!(grown[0] > manifold.min_time() && grown[0] < manifold.max_time());
        assert_healthy(&manifold);
    }

    #[test]
    fn toroidal_insertions_stay_in_the_unit_square() {
        let mut manifold = torus();
        let mut rng = rng();
        for _ in 0..20 {
            do_26_move(&mut manifold, &mut rng).unwrap();
        }
        assert!(manifold.triangulation().vertices().all(|(_, v)| {
            (0.0..1.0).contains(&v.point.x) && (0.0..1.0).contains(&v.point.y)
        }));
        assert_healthy(&manifold);
    }

    #[test]
    fn two_slices_have_no_interior_face() {
        let mut manifold =
            crate::core::models::builder::ManifoldBuilder::new(Topology::Spherical, 24, 2)
                .build()
                .unwrap();
        assert_eq!(
            do_26_move(&mut manifold, &mut rng()),
            Err(MoveError::NoCandidate(MoveType::TwoSix))
        );
    }
}
