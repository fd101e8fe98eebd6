//! Strategies decide which moves a pass proposes and which of those are
//! executed.

pub mod metropolis;
pub mod move_always;

pub use metropolis::Metropolis;
pub use move_always::MoveAlways;

use super::command::MoveCommand;
use super::config::{ActionConfig, Strategy};
use super::error::EngineError;
use super::tracker::MoveStatistics;
use rand::rngs::StdRng;

pub trait MoveStrategy: Send {
    fn name(&self) -> &'static str;

    /// Performs one move of each type so every proposal weight starts non-zero.
    fn initialize(&mut self, command: &mut MoveCommand, rng: &mut StdRng)
    -> Result<(), EngineError>;

    /// Proposes one move per simplex of the current triangulation, then
    /// executes the accepted ones.
    fn propose_pass(
        &mut self,
        command: &mut MoveCommand,
        rng: &mut StdRng,
    ) -> Result<(), EngineError>;

    /// Adds the execution counters of the batch `command` just ran to the
    /// statistics and clears them for the next batch.
    fn record(&mut self, command: &mut MoveCommand);

    fn statistics(&self) -> &MoveStatistics;
}

pub fn build_strategy(strategy: Strategy, action: &ActionConfig) -> Box<dyn MoveStrategy> {
    match strategy {
        Strategy::Metropolis => Box::new(Metropolis::new(action.action())),
        Strategy::MoveAlways => Box::new(MoveAlways::new()),
    }
}

pub(crate) fn record_execution(statistics: &mut MoveStatistics, command: &mut MoveCommand) {
    command.summary();
    statistics.attempted += command.attempted();
    statistics.succeeded += command.succeeded();
    statistics.failed += command.failed();
    command.reset_counters();
}
