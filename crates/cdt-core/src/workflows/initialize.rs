use crate::core::models::manifold::Manifold;
use crate::engine::config::TriangulationConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{debug, info, instrument, warn};

/// Builds the initial triangulation described by `config`.
#[instrument(skip_all, name = "initialize_workflow", fields(topology = %config.topology))]
pub fn run(
    config: &TriangulationConfig,
    reporter: &ProgressReporter,
) -> Result<Manifold, EngineError> {
    config.validate()?;
    info!(
        simplices = config.simplices,
        timeslices = config.timeslices,
        initial_radius = config.initial_radius,
        foliation_spacing = config.foliation_spacing,
        "Building initial triangulation."
    );

    let manifold = reporter.phase("Building Triangulation", || {
        config.manifold_builder().build()
    })?;

    let geometry = manifold.geometry();
    info!(
        n3 = geometry.n3,
        n3_31 = geometry.n3_31,
        n3_22 = geometry.n3_22,
        n3_13 = geometry.n3_13,
        n1_tl = geometry.n1_tl,
        n1_sl = geometry.n1_sl,
        n0 = geometry.n0,
        "Initial triangulation built."
    );
    for (timeslice, volume) in manifold.volume_per_timeslice() {
        debug!(timeslice, volume, "Spatial volume.");
    }

    let built_slices = usize::try_from(manifold.max_time()).unwrap_or(0);
    if built_slices < config.timeslices {
        let message = format!(
            "Only {} of {} requested timeslices were built.",
            built_slices, config.timeslices
        );
        warn!("{message}");
        reporter.report(Progress::Message(message));
    }

    Ok(manifold)
}
