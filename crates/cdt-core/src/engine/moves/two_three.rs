use super::check::{replace_checked, shuffled};
use super::{MoveError, MoveType};
use crate::core::models::cell::{CellType, make_edge};
use crate::core::models::ids::{CellId, VertexId};
use crate::core::models::manifold::Manifold;
use rand::Rng;
use tracing::instrument;

/// A legal (2,3) site: the (2,2) cell, its neighbor, and the cells to insert.
struct Site {
    remove: [CellId; 2],
    add: [[VertexId; 4]; 3],
}

/// Finds a legal (2,3) move through one face of the (2,2) cell `cell`.
///
/// The neighbor across the face must have its opposite vertex on the other
/// timeslice from the cell's own opposite vertex, and the two opposite
/// vertices must not already be joined by an edge.
fn site_at(manifold: &Manifold, cell: CellId) -> Option<Site> {
    let tri = manifold.triangulation();
    let c1 = tri.cell(cell)?;
    for (i, face) in c1.faces().iter().enumerate() {
        let p = c1.vertices[i];
        let Some(neighbor) = tri.neighbor(cell, face) else {
            continue;
        };
        let Some(q) = tri.cell(neighbor).and_then(|c2| c2.opposite(face)) else {
            continue;
        };
        if tri.timevalue(p) == tri.timevalue(q) {
            continue;
        }
        let [p, q] = make_edge(p, q);
        if tri.edge_exists(p, q) {
            continue;
        }
        let [f0, f1, f2] = *face;
        return Some(Site {
            remove: [cell, neighbor],
            add: [[p, q, f0, f1], [p, q, f1, f2], [p, q, f0, f2]],
        });
    }
    None
}

/// Replaces a (2,2) cell and an adjacent (3,1) or (1,3) cell with three
/// cells around a new timelike edge.
#[instrument(level = "trace", skip_all)]
pub fn do_23_move(manifold: &mut Manifold, rng: &mut impl Rng) -> Result<(), MoveError> {
    let candidates = shuffled(
        manifold.triangulation().cells_of_type(CellType::TwoTwo),
        rng,
    );
    for cell in candidates {
        if let Some(site) = site_at(manifold, cell) {
            return replace_checked(manifold, MoveType::TwoThree, &site.remove, &site.add, None);
        }
    }
    Err(MoveError::NoCandidate(MoveType::TwoThree))
}
