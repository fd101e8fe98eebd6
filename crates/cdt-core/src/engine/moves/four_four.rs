use super::check::{replace_checked, shuffled};
use super::{MoveError, MoveType};
use crate::core::models::cell::{CellType, Edge};
use crate::core::models::ids::{CellId, VertexId};
use crate::core::models::manifold::Manifold;
use rand::Rng;
use tracing::instrument;

struct Site {
    remove: Vec<CellId>,
    add: [[VertexId; 4]; 4],
}

/// A spacelike edge can be flipped when it lies in exactly two (3,1) and two
/// (1,3) cells, so its link is the square `p1, top, p2, bottom`, and the new
/// spatial diagonal `p1 p2` is not already an edge.
fn site_at(manifold: &Manifold, edge: &Edge) -> Option<Site> {
    let tri = manifold.triangulation();
    let remove = tri.cells_around_edge(edge);
    if remove.len() != 4 {
        return None;
    }
    let (mut threeone, mut onethree) = (0, 0);
    let mut others: Vec<VertexId> = Vec::with_capacity(8);
    for &id in &remove {
        let cell = tri.cell(id)?;
        match cell.kind {
            CellType::ThreeOne => threeone += 1,
            CellType::OneThree => onethree += 1,
            _ => return None,
        }
        others.extend(cell.vertices.iter().filter(|v| !edge.contains(v)));
    }
    if threeone != 2 || onethree != 2 {
        return None;
    }
    others.sort_unstable();
    others.dedup();
    if others.len() != 4 {
        return None;
    }

    let t = tri.timevalue(edge[0])?;
    let mut spatial = Vec::with_capacity(2);
    let (mut top, mut bottom) = (None, None);
    for &v in &others {
        match tri.timevalue(v)? - t {
            0 => spatial.push(v),
            1 => top = Some(v),
            -1 => bottom = Some(v),
            _ => return None,
        }
    }
    let (&[p1, p2], Some(top), Some(bottom)) = (spatial.as_slice(), top, bottom) else {
        return None;
    };
    if tri.edge_exists(p1, p2) {
        return None;
    }

    let [e0, e1] = *edge;
    Some(Site {
        remove,
        add: [
            [top, p1, p2, e0],
            [top, p1, p2, e1],
            [bottom, p1, p2, e0],
            [bottom, p1, p2, e1],
        ],
    })
}

/// Flips a spacelike edge inside its timeslice, replacing four cells with
/// four others.
#[instrument(level = "trace", skip_all)]
pub fn do_44_move(manifold: &mut Manifold, rng: &mut impl Rng) -> Result<(), MoveError> {
    let candidates = shuffled(manifold.triangulation().spacelike_edges(), rng);
    for edge in candidates {
        if let Some(site) = site_at(manifold, &edge) {
            return replace_checked(manifold, MoveType::FourFour, &site.remove, &site.add, None);
        }
    }
    Err(MoveError::NoCandidate(MoveType::FourFour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::moves::test_support::*;

    #[test]
    fn flips_a_spatial_edge_without_changing_counts() {
        let mut manifold = torus();
        let mut rng = rng();
        let before = *manifold.geometry();
        let edges_before = manifold.triangulation().spacelike_edges();

        do_44_move(&mut manifold, &mut rng).unwrap();

        assert_eq!(*manifold.geometry(), before);
        let edges_after = manifold.triangulation().spacelike_edges();
        assert_eq!(edges_after.len(), edges_before.len());
        assert_ne!(edges_after, edges_before);
        assert_eq!(manifold.volume_per_timeslice().len(), 4);
        assert_healthy(&manifold);
    }
}
