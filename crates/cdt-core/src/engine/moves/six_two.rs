use super::check::{replace_checked, shuffled};
use super::{MoveError, MoveType};
use crate::core::models::cell::{CellType, make_face};
use crate::core::models::ids::{CellId, VertexId};
use crate::core::models::manifold::Manifold;
use rand::Rng;
use tracing::instrument;

struct Site {
    remove: Vec<CellId>,
    add: [[VertexId; 4]; 2],
}

/// A vertex can be removed when its star is exactly the six cells a (2,6)
/// move creates: three (1,3) cells sharing a vertex below, three (3,1) cells
/// sharing a vertex above, and a spatial link of three vertices that do not
/// already span a face.
fn site_at(manifold: &Manifold, vertex: VertexId) -> Option<Site> {
    let tri = manifold.triangulation();
    let remove = tri.incident_cells(vertex);
    if remove.len() != 6 {
        return None;
    }
    let neighbors = tri.vertex_neighbors(vertex);
    if neighbors.len() != 5 {
        return None;
    }

    let t = tri.timevalue(vertex)?;
    let mut below = Vec::new();
    let mut above = Vec::new();
    let mut spatial = Vec::new();
    for &n in &neighbors {
        match tri.timevalue(n)? - t {
            -1 => below.push(n),
            1 => above.push(n),
            0 => spatial.push(n),
            _ => return None,
        }
    }
    let ([a], [b], [x, y, z]) = (below.as_slice(), above.as_slice(), spatial.as_slice()) else {
        return None;
    };

    for &id in &remove {
        let cell = tri.cell(id)?;
        let apex_ok = match cell.kind {
            CellType::OneThree => cell.contains(*a),
            CellType::ThreeOne => cell.contains(*b),
            _ => false,
        };
        if !apex_ok {
            return None;
        }
    }
    if tri.face_exists(&make_face(*x, *y, *z)) {
        return None;
    }

    Some(Site {
        remove,
        add: [[*a, *x, *y, *z], [*b, *x, *y, *z]],
    })
}

/// Removes a vertex of degree five, merging its six cells into two.
#[instrument(level = "trace", skip_all)]
pub fn do_62_move(manifold: &mut Manifold, rng: &mut impl Rng) -> Result<(), MoveError> {
    let vertices: Vec<VertexId> = manifold.triangulation().vertices().map(|(id, _)| id).collect();
    for vertex in shuffled(vertices, rng) {
        if let Some(site) = site_at(manifold, vertex) {
            return replace_checked(manifold, MoveType::SixTwo, &site.remove, &site.add, None);
        }
    }
    Err(MoveError::NoCandidate(MoveType::SixTwo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::moves::test_support::*;
    use crate::engine::moves::two_six::do_26_move;

    #[test]
    fn undoes_a_26_move() {
        let mut manifold = torus();
        let mut rng = rng();
        let initial = *manifold.geometry();

        do_26_move(&mut manifold, &mut rng).unwrap();
        do_62_move(&mut manifold, &mut rng).unwrap();

        assert_eq!(*manifold.geometry(), initial);
        assert_eq!(manifold.triangulation().number_of_vertices(), initial.n0);
        assert_healthy(&manifold);
    }

    #[test]
    fn fresh_torus_has_no_removable_vertex() {
        let mut manifold = torus();
        assert_eq!(
            do_62_move(&mut manifold, &mut rng()),
            Err(MoveError::NoCandidate(MoveType::SixTwo))
        );
    }
}
