use super::{MoveError, MoveType};
use crate::core::models::ids::{CellId, VertexId};
use crate::core::models::manifold::{CellReplacement, Manifold};
use crate::core::models::triangulation::TriangulationError;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, trace};

pub(super) fn shuffled<T>(mut items: Vec<T>, rng: &mut impl Rng) -> Vec<T> {
    items.shuffle(rng);
    items
}

/// Verifies a pending replacement against the expected effect of `kind`.
///
/// Checks the exact change in simplex counts, that every new cell is a causal
/// tetrahedron, and that no timeslice was emptied by removing vertices.
pub(crate) fn check_move(
    manifold: &Manifold,
    replacement: &CellReplacement,
    kind: MoveType,
) -> Result<(), String> {
    let expected = kind.expected_delta();
    if *replacement.delta() != expected {
        return Err(format!(
            "simplex counts changed by {:?}, expected {:?}",
            replacement.delta(),
            expected
        ));
    }

    if let Some(bad) = replacement.added_kinds().iter().find(|k| !k.is_valid()) {
        return Err(format!("created a cell of type {bad}"));
    }

    let tri = manifold.triangulation();
    for &orphan in replacement.orphaned() {
        let Some(t) = tri.timevalue(orphan) else {
            continue;
        };
        let slice_survives = replacement
            .touched()
            .iter()
            .any(|&v| v != orphan && tri.is_attached(v) && tri.timevalue(v) == Some(t));
        if !slice_survives {
            return Err(format!("removing {orphan:?} would empty timeslice {t}"));
        }
    }
    Ok(())
}

/// Replaces `remove` with cells on `add`, then commits or rolls back
/// depending on [`check_move`].
///
/// `inserted` is a vertex created for this move; it is deleted again if the
/// move is rolled back.
pub(super) fn replace_checked(
    manifold: &mut Manifold,
    kind: MoveType,
    remove: &[CellId],
    add: &[[VertexId; 4]],
    inserted: Option<VertexId>,
) -> Result<(), MoveError> {
    let corrupted = |source: TriangulationError| MoveError::Triangulation { kind, source };

    let replacement = match manifold.replace_cells(remove, add) {
        Ok(r) => r,
        Err(e) => {
            if let Some(v) = inserted {
                manifold.remove_detached_vertex(v).map_err(corrupted)?;
            }
            return Err(corrupted(e));
        }
    };

    match check_move(manifold, &replacement, kind) {
        Ok(()) => {
            trace!(%kind, delta = ?replacement.delta(), "Committing move.");
            manifold.commit(replacement).map_err(corrupted)
        }
        Err(reason) => {
            debug!(%kind, %reason, "Move failed its check, rolling back.");
            manifold.revert(replacement).map_err(corrupted)?;
            if let Some(v) = inserted {
                manifold.remove_detached_vertex(v).map_err(corrupted)?;
            }
            Err(MoveError::CheckFailed { kind, reason })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::cell::CellType;
    use crate::engine::moves::test_support::*;

    #[test]
    fn mismatched_move_is_rolled_back() {
        let mut manifold = sphere();
        let before = *manifold.geometry();
        let tri = manifold.triangulation();
        let cell = tri.cells_of_type(CellType::OneThree)[0];
        let face = tri.cell(cell).unwrap().faces()[0];
        let vertices = tri.cell(cell).unwrap().vertices;

        // Re-inserting the same cell is a valid replacement with a zero delta,
        // which is what a (4,4) does but not a (2,3).
        let result = replace_checked(
            &mut manifold,
            MoveType::TwoThree,
            &[cell],
            &[vertices],
            None,
        );
        assert!(matches!(
            result,
            Err(MoveError::CheckFailed {
                kind: MoveType::TwoThree,
                ..
            })
        ));
        assert_eq!(*manifold.geometry(), before);
        assert!(manifold.triangulation().face_exists(&face));
        assert_healthy(&manifold);

        replace_checked(&mut manifold, MoveType::FourFour, &[], &[], None).unwrap();
        assert_eq!(*manifold.geometry(), before);
    }

    #[test]
    fn rolled_back_insertion_removes_the_new_vertex() {
        let mut manifold = sphere();
        let before = *manifold.geometry();
        let vertex_count = manifold.triangulation().vertices().count();
        let tri = manifold.triangulation();
        let cell = tri.cells_of_type(CellType::OneThree)[0];
        let vertices = tri.cell(cell).unwrap().vertices;
        let point = tri.vertex(vertices[0]).unwrap().point;
        let t = tri.timevalue(vertices[0]).unwrap();

        let inserted = manifold.add_vertex(point, t);
        let result = replace_checked(
            &mut manifold,
            MoveType::TwoSix,
            &[cell],
            &[vertices],
            Some(inserted),
        );

        assert!(matches!(
            result,
            Err(MoveError::CheckFailed {
                kind: MoveType::TwoSix,
                ..
            })
        ));
        assert!(manifold.triangulation().vertex(inserted).is_none());
        assert_eq!(manifold.triangulation().vertices().count(), vertex_count);
        assert_eq!(*manifold.geometry(), before);
        assert_healthy(&manifold);
    }
}
