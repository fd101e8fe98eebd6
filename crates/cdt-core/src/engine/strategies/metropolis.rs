use super::{MoveStrategy, record_execution};
use crate::core::action::S3Action;
use crate::core::models::geometry::Geometry;
use crate::engine::command::MoveCommand;
use crate::engine::error::EngineError;
use crate::engine::moves::MoveType;
use crate::engine::tracker::MoveStatistics;
use crate::engine::utils::sampling::{self, SamplingError};
use rand::rngs::StdRng;
use tracing::{debug, info, instrument, trace};

/// Metropolis-Hastings sampling of the bulk action.
///
/// A proposed move is accepted with probability `A1 * A2`, where `A1` is the
/// share of all proposals that were of the same type and `A2` is the
/// Boltzmann factor of the action change the move would cause.
#[derive(Debug)]
pub struct Metropolis {
    action: S3Action,
    statistics: MoveStatistics,
}

impl Metropolis {
    pub fn new(action: S3Action) -> Self {
        Self {
            action,
            statistics: MoveStatistics::new(),
        }
    }

    pub fn action(&self) -> &S3Action {
        &self.action
    }

    pub fn a1(&self, kind: MoveType) -> Result<f64, SamplingError> {
        sampling::proposal_weight(
            self.statistics.proposed[kind],
            self.statistics.proposed.total(),
        )
    }

    /// Boltzmann factor of the action change `kind` would cause on `geometry`.
    /// Always one for (4,4) moves.
    pub fn a2(&self, geometry: &Geometry, kind: MoveType) -> Result<f64, SamplingError> {
        if kind == MoveType::FourFour {
            return Ok(1.0);
        }
        let current = self.action.evaluate_geometry(geometry);
        let delta = kind.expected_delta();
        let shifted = |count: usize, change: i64| {
            count.saturating_add_signed(change as isize) as f64
        };
        let proposed = self.action.evaluate(
            shifted(geometry.n1_tl, delta.n1_tl),
            shifted(geometry.n3_31_13, delta.n3_31_13()),
            shifted(geometry.n3_22, delta.n3_22),
        );
        trace!(%kind, current, proposed, "Action change.");
        sampling::action_weight(current, proposed)
    }
}

impl MoveStrategy for Metropolis {
    fn name(&self) -> &'static str {
        "metropolis"
    }

    #[instrument(skip_all, name = "metropolis_initialize")]
    fn initialize(
        &mut self,
        command: &mut MoveCommand,
        rng: &mut StdRng,
    ) -> Result<(), EngineError> {
        info!(
            alpha = self.action.alpha,
            k = self.action.k,
            lambda = self.action.lambda,
            "Making one move of each type."
        );
        for kind in MoveType::ALL {
            self.statistics.proposed[kind] += 1;
            self.statistics.accepted[kind] += 1;
            command.enqueue(kind);
        }
        command.execute(rng)?;
        self.record(command);
        Ok(())
    }

    fn propose_pass(
        &mut self,
        command: &mut MoveCommand,
        rng: &mut StdRng,
    ) -> Result<(), EngineError> {
        let geometry = *command.results().geometry();
        let mut accepted = 0;
        for _ in 0..geometry.n3 {
            let kind = MoveType::random(rng);
            self.statistics.proposed[kind] += 1;
            let probability = self.a1(kind)? * self.a2(&geometry, kind)?;
            if sampling::metropolis_accept(probability, rng) {
                self.statistics.accepted[kind] += 1;
                command.enqueue(kind);
                accepted += 1;
            } else {
                self.statistics.rejected[kind] += 1;
            }
        }
        debug!(proposals = geometry.n3, accepted, "Proposed pass.");
        command.execute(rng)?;
        self.record(command);
        Ok(())
    }

    fn record(&mut self, command: &mut MoveCommand) {
        record_execution(&mut self.statistics, command);
    }

    fn statistics(&self) -> &MoveStatistics {
        &self.statistics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::moves::test_support::*;
    use rand::SeedableRng;

    fn strategy() -> Metropolis {
        Metropolis::new(S3Action::new(0.6, 1.1, 0.1))
    }

    #[test]
    fn initialize_proposes_each_move_once() {
        let mut command = MoveCommand::new(sphere());
        let mut metropolis = strategy();
        metropolis
            .initialize(&mut command, &mut StdRng::seed_from_u64(11))
            .unwrap();

        let stats = metropolis.statistics();
        for kind in MoveType::ALL {
            assert_eq!(stats.proposed[kind], 1);
            assert_eq!(stats.accepted[kind], 1);
            assert_eq!(stats.attempted[kind], 1);
            assert_eq!(metropolis.a1(kind), Ok(0.2));
        }
        assert!(stats.rejected.is_empty());
        assert_healthy(command.results());
    }

    #[test]
    fn a1_before_any_proposal_is_an_error() {
        assert_eq!(
            strategy().a1(MoveType::TwoThree),
            Err(SamplingError::NoProposals)
        );
    }

    #[test]
    fn a2_is_one_for_four_four_and_bounded_otherwise() {
        let manifold = sphere();
        let metropolis = strategy();
        assert_eq!(
            metropolis.a2(manifold.geometry(), MoveType::FourFour),
            Ok(1.0)
        );
        for kind in MoveType::ALL {
            let a2 = metropolis.a2(manifold.geometry(), kind).unwrap();
            assert!(a2 > 0.0 && a2 <= 1.0, "{kind}: {a2}");
        }
    }

    #[test]
    fn inverse_moves_cannot_both_raise_the_action() {
        let manifold = sphere();
        let metropolis = strategy();
        let g = manifold.geometry();
        let forward = metropolis.a2(g, MoveType::TwoThree).unwrap();
        let backward = metropolis.a2(g, MoveType::ThreeTwo).unwrap();
        assert!(forward == 1.0 || backward == 1.0);
    }

    #[test]
    fn a_pass_accounts_for_every_proposal() {
        let mut command = MoveCommand::new(sphere());
        let mut rng = StdRng::seed_from_u64(5);
        let mut metropolis = strategy();
        metropolis.initialize(&mut command, &mut rng).unwrap();
        let n3 = command.results().n3();

        metropolis.propose_pass(&mut command, &mut rng).unwrap();

        let stats = metropolis.statistics();
        assert_eq!(stats.proposed.total(), 5 + n3);
        assert_eq!(
            stats.accepted.total() + stats.rejected.total(),
            stats.proposed.total()
        );
        assert_eq!(stats.attempted, stats.accepted);
        assert_eq!(
            stats.succeeded.total() + stats.failed.total(),
            stats.attempted.total()
        );
        assert_healthy(command.results());
    }
}
