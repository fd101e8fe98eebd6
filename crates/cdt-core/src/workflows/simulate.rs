use crate::core::models::manifold::Manifold;
use crate::engine::command::MoveCommand;
use crate::engine::config::SimulationConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::strategies::build_strategy;
use crate::engine::tracker::MoveStatistics;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, instrument, warn};

/// State handed to the checkpoint callback.
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint<'a> {
    pub pass: usize,
    pub manifold: &'a Manifold,
    pub statistics: &'a MoveStatistics,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub manifold: Manifold,
    pub statistics: MoveStatistics,
    pub passes_completed: usize,
    pub cancelled: bool,
}

/// Runs the configured strategy on `manifold` for the configured number of
/// passes.
///
/// `on_checkpoint` is called after every `checkpoint`-th pass. Setting
/// `cancel` stops the run before the next pass starts; the result then holds
/// the manifold as of the last completed pass.
#[instrument(skip_all, name = "simulation_workflow", fields(strategy = %config.sampling.strategy))]
pub fn run<E>(
    manifold: Manifold,
    config: &SimulationConfig,
    reporter: &ProgressReporter,
    cancel: &AtomicBool,
    mut on_checkpoint: impl FnMut(&Checkpoint<'_>) -> Result<(), E>,
) -> Result<SimulationResult, EngineError>
where
    E: std::error::Error,
{
    config.action.validate()?;
    config.sampling.validate()?;
    let sampling = &config.sampling;

    let mut rng = match sampling.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut strategy = build_strategy(sampling.strategy, &config.action);
    let mut command = MoveCommand::new(manifold).with_validation(sampling.validate_moves);

    info!(
        passes = sampling.passes,
        checkpoint = sampling.checkpoint,
        seed = ?sampling.seed,
        n3 = command.results().n3(),
        "Starting {} simulation.",
        strategy.name()
    );

    reporter.phase("Initializing Moves", || {
        strategy.initialize(&mut command, &mut rng)
    })?;

    let mut passes_completed = 0;
    let mut cancelled = false;
    reporter.phase("Sampling", || -> Result<(), EngineError> {
        reporter.report(Progress::TaskStart {
            total_steps: sampling.passes as u64,
        });
        for pass in 1..=sampling.passes {
            if cancel.load(Ordering::Relaxed) {
                warn!(pass, "Simulation cancelled.");
                cancelled = true;
                break;
            }
            strategy.propose_pass(&mut command, &mut rng)?;
            passes_completed = pass;

            let geometry = command.results().geometry();
            reporter.report(Progress::Status(format!(
                "N3 {} N1_TL {} N0 {}",
                geometry.n3, geometry.n1_tl, geometry.n0
            )));
            reporter.report(Progress::TaskIncrement);

            if pass % sampling.checkpoint == 0 {
                info!(pass, n3 = geometry.n3, n0 = geometry.n0, "Checkpoint.");
                let checkpoint = Checkpoint {
                    pass,
                    manifold: command.results(),
                    statistics: strategy.statistics(),
                };
                on_checkpoint(&checkpoint).map_err(|e| EngineError::PhaseFailed {
                    phase: "Checkpoint",
                    reason: e.to_string(),
                })?;
            }
        }
        reporter.report(Progress::TaskFinish);
        Ok(())
    })?;

    let statistics = *strategy.statistics();
    for line in statistics.summary_lines() {
        info!("{line}");
    }
    Ok(SimulationResult {
        manifold: command.into_results(),
        statistics,
        passes_completed,
        cancelled,
    })
}

/// Convenience wrapper for [`run`] without checkpoint handling.
pub fn run_to_completion(
    manifold: Manifold,
    config: &SimulationConfig,
    reporter: &ProgressReporter,
    cancel: &AtomicBool,
) -> Result<SimulationResult, EngineError> {
    run(manifold, config, reporter, cancel, |_| {
        Ok::<(), std::convert::Infallible>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::Topology;
    use crate::engine::config::{SimulationConfigBuilder, Strategy};
    use crate::workflows::initialize;
    use std::fmt;

    fn config(strategy: Strategy, passes: usize, checkpoint: usize) -> SimulationConfig {
        SimulationConfigBuilder::new()
            .topology(Topology::Spherical)
            .simplices(640)
            .timeslices(4)
            .alpha(0.6)
            .k(1.1)
            .lambda(0.1)
            .strategy(strategy)
            .passes(passes)
            .checkpoint(checkpoint)
            .seed(Some(42))
            .build()
            .unwrap()
    }

    fn initial(config: &SimulationConfig) -> Manifold {
        initialize::run(&config.triangulation, &ProgressReporter::new()).unwrap()
    }

    #[derive(Debug)]
    struct DiskFull;

    impl fmt::Display for DiskFull {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("disk full")
        }
    }

    impl std::error::Error for DiskFull {}

    #[test]
    fn runs_every_pass_and_checkpoints() {
        let config = config(Strategy::Metropolis, 4, 2);
        let mut seen = Vec::new();
        let result = run(
            initial(&config),
            &config,
            &ProgressReporter::new(),
            &AtomicBool::new(false),
            |c| {
                seen.push((c.pass, c.manifold.n3()));
                Ok::<(), DiskFull>(())
            },
        )
        .unwrap();

        assert_eq!(result.passes_completed, 4);
        assert!(!result.cancelled);
        assert_eq!(seen.iter().map(|(p, _)| *p).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(seen[1].1, result.manifold.n3());
        assert_eq!(
            result.statistics.accepted.total() + result.statistics.rejected.total(),
            result.statistics.proposed.total()
        );
        result.manifold.check_consistency().unwrap();
        assert!(result.manifold.triangulation().is_foliated());
    }

    #[test]
    fn same_seed_gives_same_manifold() {
        let config = config(Strategy::MoveAlways, 2, 10);
        let cancel = AtomicBool::new(false);
        let reporter = ProgressReporter::new();
        let a = run_to_completion(initial(&config), &config, &reporter, &cancel).unwrap();
        let b = run_to_completion(initial(&config), &config, &reporter, &cancel).unwrap();
        assert_eq!(a.manifold.geometry(), b.manifold.geometry());
        assert_eq!(a.statistics, b.statistics);
    }

    #[test]
    fn cancellation_stops_before_the_first_pass() {
        let config = config(Strategy::Metropolis, 100, 10);
        let result = run_to_completion(
            initial(&config),
            &config,
            &ProgressReporter::new(),
            &AtomicBool::new(true),
        )
        .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.passes_completed, 0);
        assert_eq!(result.statistics.proposed.total(), 5);
    }

    #[test]
    fn checkpoint_errors_abort_the_run() {
        let config = config(Strategy::MoveAlways, 3, 1);
        let result = run(
            initial(&config),
            &config,
            &ProgressReporter::new(),
            &AtomicBool::new(false),
            |_| Err(DiskFull),
        );
        assert!(matches!(
            result,
            Err(EngineError::PhaseFailed {
                phase: "Checkpoint",
                ..
            })
        ));
    }
}
