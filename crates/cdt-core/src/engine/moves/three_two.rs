use super::check::{replace_checked, shuffled};
use super::{MoveError, MoveType};
use crate::core::models::cell::{CellType, Edge, make_face};
use crate::core::models::ids::{CellId, VertexId};
use crate::core::models::manifold::Manifold;
use rand::Rng;
use tracing::instrument;

struct Site {
    remove: [CellId; 3],
    add: [[VertexId; 4]; 2],
}

/// Checks whether the timelike `edge` can be removed by a (3,2) move.
///
/// The edge must be surrounded by exactly two (2,2) cells and one (3,1) or
/// (1,3) cell, and the vertex pairs opposite the edge must close into a
/// triangle that is not yet a face.
fn site_at(manifold: &Manifold, edge: &Edge) -> Option<Site> {
    let tri = manifold.triangulation();
    let cells = tri.cells_around_edge(edge);
    let [c0, c1, c2] = cells.as_slice() else {
        return None;
    };
    let remove = [*c0, *c1, *c2];

    let mut twotwo = 0;
    let mut pairs: Vec<[VertexId; 2]> = Vec::with_capacity(3);
    for &id in &remove {
        let cell = tri.cell(id)?;
        if cell.kind == CellType::TwoTwo {
            twotwo += 1;
        }
        let mut others = cell.vertices.iter().copied().filter(|v| !edge.contains(v));
        pairs.push([others.next()?, others.next()?]);
    }
    if twotwo != 2 {
        return None;
    }

    let mut link: Vec<VertexId> = pairs.iter().flatten().copied().collect();
    link.sort_unstable();
    link.dedup();
    let [x, y, z] = link.as_slice() else {
        return None;
    };
    let (x, y, z) = (*x, *y, *z);
    let closes = [x, y, z]
        .iter()
        .all(|v| pairs.iter().filter(|p| p.contains(v)).count() == 2);
    if !closes || tri.face_exists(&make_face(x, y, z)) {
        return None;
    }

    let [a, b] = *edge;
    Some(Site {
        remove,
        add: [[x, y, z, a], [x, y, z, b]],
    })
}

/// Removes a timelike edge shared by three cells, leaving two cells glued
/// along the triangle of its link.
#[instrument(level = "trace", skip_all)]
pub fn do_32_move(manifold: &mut Manifold, rng: &mut impl Rng) -> Result<(), MoveError> {
    let candidates = shuffled(manifold.triangulation().timelike_edges(), rng);
    for edge in candidates {
        if let Some(site) = site_at(manifold, &edge) {
            return replace_checked(manifold, MoveType::ThreeTwo, &site.remove, &site.add, None);
        }
    }
    Err(MoveError::NoCandidate(MoveType::ThreeTwo))
}
