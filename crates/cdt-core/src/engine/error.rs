use thiserror::Error;

use super::config::ConfigError;
use super::moves::MoveError;
use super::utils::sampling::SamplingError;
use crate::core::models::builder::BuildError;
use crate::core::models::triangulation::TriangulationError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Failed to build initial triangulation: {source}")]
    Build {
        #[from]
        source: BuildError,
    },

    #[error("Triangulation became inconsistent: {source}")]
    Triangulation {
        #[from]
        source: TriangulationError,
    },

    #[error("Move failed: {source}")]
    Move {
        #[from]
        source: MoveError,
    },

    #[error("Acceptance probability could not be computed: {source}")]
    Sampling {
        #[from]
        source: SamplingError,
    },

    #[error("Simulation phase '{phase}' failed: {reason}")]
    PhaseFailed { phase: &'static str, reason: String },
}
