use super::moves::{MoveType, NUMBER_OF_3D_MOVES};
use serde::Serialize;
use std::fmt;
use std::ops::{AddAssign, Index, IndexMut};

/// One counter per move type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MoveTracker {
    counts: [usize; NUMBER_OF_3D_MOVES],
}

impl MoveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn reset(&mut self) {
        self.counts = [0; NUMBER_OF_3D_MOVES];
    }

    pub fn iter(&self) -> impl Iterator<Item = (MoveType, usize)> + '_ {
        MoveType::ALL.into_iter().zip(self.counts.iter().copied())
    }

    pub fn two_three_moves(&self) -> usize {
        self[MoveType::TwoThree]
    }

    pub fn three_two_moves(&self) -> usize {
        self[MoveType::ThreeTwo]
    }

    pub fn two_six_moves(&self) -> usize {
        self[MoveType::TwoSix]
    }

    pub fn six_two_moves(&self) -> usize {
        self[MoveType::SixTwo]
    }

    pub fn four_four_moves(&self) -> usize {
        self[MoveType::FourFour]
    }
}

impl Index<MoveType> for MoveTracker {
    type Output = usize;

    fn index(&self, kind: MoveType) -> &usize {
        &self.counts[kind.index()]
    }
}

impl IndexMut<MoveType> for MoveTracker {
    fn index_mut(&mut self, kind: MoveType) -> &mut usize {
        &mut self.counts[kind.index()]
    }
}

impl AddAssign for MoveTracker {
    fn add_assign(&mut self, other: Self) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts) {
            *mine += theirs;
        }
    }
}

impl AddAssign<&MoveTracker> for MoveTracker {
    fn add_assign(&mut self, other: &MoveTracker) {
        *self += *other;
    }
}

/// Bookkeeping for a strategy run.
///
/// `proposed`, `accepted` and `rejected` are decided by the strategy; the
/// other three record what happened when accepted moves were executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MoveStatistics {
    pub proposed: MoveTracker,
    pub accepted: MoveTracker,
    pub rejected: MoveTracker,
    pub attempted: MoveTracker,
    pub succeeded: MoveTracker,
    pub failed: MoveTracker,
}

impl MoveStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// The summary line for one move type.
    pub fn summary_line(&self, kind: MoveType) -> String {
        format!(
            "{kind} moves: {} proposed ({} accepted and {} rejected) with {} attempted ({} successful and {} failed).",
            self.proposed[kind],
            self.accepted[kind],
            self.rejected[kind],
            self.attempted[kind],
            self.succeeded[kind],
            self.failed[kind],
        )
    }

    pub fn summary_lines(&self) -> Vec<String> {
        MoveType::ALL
            .into_iter()
            .map(|kind| self.summary_line(kind))
            .collect()
    }
}

impl fmt::Display for MoveStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Moves: {} proposed, {} accepted, {} rejected, {} attempted, {} successful, {} failed.",
            self.proposed.total(),
            self.accepted.total(),
            self.rejected.total(),
            self.attempted.total(),
            self.succeeded.total(),
            self.failed.total(),
        )?;
        for line in self.summary_lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
