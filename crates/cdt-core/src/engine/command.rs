use super::error::EngineError;
use super::moves::{self, MoveError, MoveType};
use super::tracker::MoveTracker;
use crate::core::models::manifold::Manifold;
use rand::Rng;
use std::collections::VecDeque;
use tracing::{debug, instrument, trace};

/// A queue of moves bound to the manifold they will be applied to.
///
/// Strategies decide which moves to enqueue; [`MoveCommand::execute`] applies
/// them in order and keeps count of what happened.
#[derive(Debug)]
pub struct MoveCommand {
    manifold: Manifold,
    queue: VecDeque<MoveType>,
    attempted: MoveTracker,
    succeeded: MoveTracker,
    failed: MoveTracker,
    validate_moves: bool,
}

impl MoveCommand {
    pub fn new(manifold: Manifold) -> Self {
        Self {
            manifold,
            queue: VecDeque::new(),
            attempted: MoveTracker::new(),
            succeeded: MoveTracker::new(),
            failed: MoveTracker::new(),
            validate_moves: false,
        }
    }

    /// Runs a full structural check after every successful move.
    pub fn with_validation(mut self, validate_moves: bool) -> Self {
        self.validate_moves = validate_moves;
        self
    }

    pub fn enqueue(&mut self, kind: MoveType) {
        self.queue.push_back(kind);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Applies every queued move, emptying the queue.
    ///
    /// A move that finds no legal site or fails its post-move check counts as
    /// failed and the run goes on; the manifold is unchanged in both cases.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Move`] if a move left the triangulation in an
    /// inconsistent state, and [`EngineError::Triangulation`] if validation is
    /// enabled and the triangulation is no longer valid.
    #[instrument(level = "debug", skip_all, fields(queued = self.queue.len()))]
    pub fn execute(&mut self, rng: &mut impl Rng) -> Result<(), EngineError> {
        while let Some(kind) = self.queue.pop_front() {
            self.attempted[kind] += 1;
            match moves::apply_move(&mut self.manifold, kind, rng) {
                Ok(()) => {
                    self.succeeded[kind] += 1;
                    trace!(%kind, n3 = self.manifold.n3(), "Move succeeded.");
                    if self.validate_moves {
                        self.manifold.check_consistency()?;
                    }
                }
                Err(e @ (MoveError::NoCandidate(_) | MoveError::CheckFailed { .. })) => {
                    self.failed[kind] += 1;
                    debug!(%kind, error = %e, "Move failed.");
                }
                Err(e) => {
                    self.queue.clear();
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    pub fn results(&self) -> &Manifold {
        &self.manifold
    }

    pub fn into_results(self) -> Manifold {
        self.manifold
    }

    pub fn attempted(&self) -> &MoveTracker {
        &self.attempted
    }

    pub fn succeeded(&self) -> &MoveTracker {
        &self.succeeded
    }

    pub fn failed(&self) -> &MoveTracker {
        &self.failed
    }

    pub fn reset_counters(&mut self) {
        self.attempted.reset();
        self.succeeded.reset();
        self.failed.reset();
    }

    /// Logs attempted, successful and failed counts for every move type
    /// since the last [`MoveCommand::reset_counters`].
    pub fn summary(&self) {
        for kind in MoveType::ALL {
            debug!(
                "{kind} moves: {} attempted ({} successful and {} failed).",
                self.attempted[kind], self.succeeded[kind], self.failed[kind]
            );
        }
    }
}
