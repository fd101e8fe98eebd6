use super::{MoveStrategy, record_execution};
use crate::engine::command::MoveCommand;
use crate::engine::error::EngineError;
use crate::engine::moves::MoveType;
use crate::engine::tracker::MoveStatistics;
use rand::rngs::StdRng;
use tracing::{debug, instrument};

/// Accepts every proposed move.
#[derive(Debug, Default)]
pub struct MoveAlways {
    statistics: MoveStatistics,
}

impl MoveAlways {
    pub fn new() -> Self {
        Self::default()
    }

    fn accept(&mut self, command: &mut MoveCommand, kind: MoveType) {
        self.statistics.proposed[kind] += 1;
        self.statistics.accepted[kind] += 1;
        command.enqueue(kind);
    }
}

impl MoveStrategy for MoveAlways {
    fn name(&self) -> &'static str {
        "move-always"
    }

    #[instrument(skip_all, name = "move_always_initialize")]
    fn initialize(
        &mut self,
        command: &mut MoveCommand,
        rng: &mut StdRng,
    ) -> Result<(), EngineError> {
        for kind in MoveType::ALL {
            self.accept(command, kind);
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
        let proposals = command.results().n3();
        for _ in 0..proposals {
            let kind = MoveType::random(rng);
            self.accept(command, kind);
        }
        debug!(proposals, "Enqueued pass.");
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
    use crate::engine::moves::NUMBER_OF_3D_MOVES;
    use crate::engine::moves::test_support::*;
    use rand::SeedableRng;

    #[test]
    fn every_proposal_is_accepted_and_executed() {
        let mut command = MoveCommand::new(torus());
        let mut rng = StdRng::seed_from_u64(3);
        let mut strategy = MoveAlways::new();

        strategy.initialize(&mut command, &mut rng).unwrap();
        let n3 = command.results().n3();
        strategy.propose_pass(&mut command, &mut rng).unwrap();

        let stats = strategy.statistics();
        assert_eq!(stats.proposed.total(), NUMBER_OF_3D_MOVES + n3);
        assert_eq!(stats.accepted, stats.proposed);
        assert!(stats.rejected.is_empty());
        assert_eq!(stats.attempted, stats.accepted);
        assert_eq!(
            stats.succeeded.total() + stats.failed.total(),
            stats.attempted.total()
        );
        assert!(stats.succeeded.total() > 0);
        assert_healthy(command.results());
    }

    #[test]
    fn statistics_accumulate_while_command_counters_restart() {
        let mut command = MoveCommand::new(sphere());
        let mut rng = StdRng::seed_from_u64(8);
        let mut strategy = MoveAlways::new();

        strategy.initialize(&mut command, &mut rng).unwrap();
        strategy.propose_pass(&mut command, &mut rng).unwrap();
        strategy.propose_pass(&mut command, &mut rng).unwrap();

        assert!(command.attempted().is_empty());
        assert!(command.succeeded().is_empty());
        assert!(command.failed().is_empty());
        let stats = strategy.statistics();
        assert_eq!(stats.attempted.total(), stats.proposed.total());
        assert_eq!(
            stats.succeeded.total() + stats.failed.total(),
            stats.proposed.total()
        );
    }
}
