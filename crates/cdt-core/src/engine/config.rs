use crate::core::action::S3Action;
use crate::core::models::builder::{ManifoldBuilder, SUPPORTED_DIMENSION};
use crate::core::models::topology::Topology;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_INITIAL_RADIUS: f64 = 1.0;
pub const DEFAULT_FOLIATION_SPACING: f64 = 1.0;
pub const DEFAULT_PASSES: usize = 100;
pub const DEFAULT_CHECKPOINT: usize = 10;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

/// The Monte-Carlo strategy used to evolve the triangulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    Metropolis,
    MoveAlways,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metropolis => write!(f, "metropolis"),
            Self::MoveAlways => write!(f, "move-always"),
        }
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "metropolis" => Ok(Self::Metropolis),
            "move-always" | "move_always" | "movealways" => Ok(Self::MoveAlways),
            other => Err(invalid(
                "strategy",
                format!("unknown strategy '{other}', expected 'metropolis' or 'move-always'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriangulationConfig {
    pub topology: Topology,
    pub simplices: usize,
    pub timeslices: usize,
    pub dimension: u32,
    pub initial_radius: f64,
    pub foliation_spacing: f64,
}

impl TriangulationConfig {
    /// A configuration with default dimension and embedding.
    pub fn new(topology: Topology, simplices: usize, timeslices: usize) -> Self {
        Self {
            topology,
            simplices,
            timeslices,
            dimension: SUPPORTED_DIMENSION,
            initial_radius: DEFAULT_INITIAL_RADIUS,
            foliation_spacing: DEFAULT_FOLIATION_SPACING,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simplices < 2 {
            return Err(invalid(
                "simplices",
                "Simplices and timeslices should be greater or equal to 2.",
            ));
        }
        if self.timeslices < 2 {
            return Err(invalid(
                "timeslices",
                "Simplices and timeslices should be greater or equal to 2.",
            ));
        }
        if self.dimension != SUPPORTED_DIMENSION {
            return Err(invalid(
                "dimension",
                format!("{} dimensions are not supported; use 3", self.dimension),
            ));
        }
        if !(self.initial_radius.is_finite() && self.initial_radius > 0.0) {
            return Err(invalid("initial-radius", "must be a positive number"));
        }
        if !(self.foliation_spacing.is_finite() && self.foliation_spacing > 0.0) {
            return Err(invalid("foliation-spacing", "must be a positive number"));
        }
        Ok(())
    }

    pub fn manifold_builder(&self) -> ManifoldBuilder {
        ManifoldBuilder::new(self.topology, self.simplices, self.timeslices)
            .dimension(self.dimension)
            .initial_radius(self.initial_radius)
            .foliation_spacing(self.foliation_spacing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionConfig {
    pub alpha: f64,
    pub k: f64,
    pub lambda: f64,
}

impl ActionConfig {
    /// Checks the couplings.
    ///
    /// `α` must satisfy `|α| ≥ 1/2` for the Regge action to be real, and the
    /// only supported negative value is the Euclidean point `α = -1`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.alpha.is_finite() || self.alpha.abs() < 0.5 {
            return Err(invalid("alpha", "Alpha in 3D should be greater than 1/2."));
        }
        if self.alpha < 0.0 && self.alpha != -1.0 {
            return Err(invalid(
                "alpha",
                "negative alpha is only supported at exactly -1",
            ));
        }
        if !self.k.is_finite() {
            return Err(invalid("k", "must be a finite number"));
        }
        if !self.lambda.is_finite() {
            return Err(invalid("lambda", "must be a finite number"));
        }
        Ok(())
    }

    pub fn action(&self) -> S3Action {
        S3Action::new(self.alpha, self.k, self.lambda)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    pub strategy: Strategy,
    pub passes: usize,
    pub checkpoint: usize,
    pub seed: Option<u64>,
    /// Run a full validity check after every executed move.
    pub validate_moves: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            passes: DEFAULT_PASSES,
            checkpoint: DEFAULT_CHECKPOINT,
            seed: None,
            validate_moves: false,
        }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.passes == 0 {
            return Err(invalid("passes", "must be at least 1"));
        }
        if self.checkpoint == 0 {
            return Err(invalid("checkpoint", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub triangulation: TriangulationConfig,
    pub action: ActionConfig,
    pub sampling: SamplingConfig,
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    topology: Option<Topology>,
    simplices: Option<usize>,
    timeslices: Option<usize>,
    dimension: Option<u32>,
    initial_radius: Option<f64>,
    foliation_spacing: Option<f64>,
    alpha: Option<f64>,
    k: Option<f64>,
    lambda: Option<f64>,
    strategy: Option<Strategy>,
    passes: Option<usize>,
    checkpoint: Option<usize>,
    seed: Option<u64>,
    validate_moves: Option<bool>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topology(mut self, topology: Topology) -> Self {
        self.topology = Some(topology);
        self
    }
    pub fn simplices(mut self, n: usize) -> Self {
        self.simplices = Some(n);
        self
    }
    pub fn timeslices(mut self, t: usize) -> Self {
        self.timeslices = Some(t);
        self
    }
    pub fn dimension(mut self, d: u32) -> Self {
        self.dimension = Some(d);
        self
    }
    pub fn initial_radius(mut self, r: f64) -> Self {
        self.initial_radius = Some(r);
        self
    }
    pub fn foliation_spacing(mut self, s: f64) -> Self {
        self.foliation_spacing = Some(s);
        self
    }
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }
    pub fn k(mut self, k: f64) -> Self {
        self.k = Some(k);
        self
    }
    pub fn lambda(mut self, lambda: f64) -> Self {
        self.lambda = Some(lambda);
        self
    }
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
    pub fn passes(mut self, passes: usize) -> Self {
        self.passes = Some(passes);
        self
    }
    pub fn checkpoint(mut self, checkpoint: usize) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
    pub fn validate_moves(mut self, enabled: bool) -> Self {
        self.validate_moves = Some(enabled);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let triangulation = TriangulationConfig {
            topology: self
                .topology
                .ok_or(ConfigError::MissingParameter("topology"))?,
            simplices: self
                .simplices
                .ok_or(ConfigError::MissingParameter("simplices"))?,
            timeslices: self
                .timeslices
                .ok_or(ConfigError::MissingParameter("timeslices"))?,
            dimension: self.dimension.unwrap_or(SUPPORTED_DIMENSION),
            initial_radius: self.initial_radius.unwrap_or(DEFAULT_INITIAL_RADIUS),
            foliation_spacing: self.foliation_spacing.unwrap_or(DEFAULT_FOLIATION_SPACING),
        };
        let action = ActionConfig {
            alpha: self.alpha.ok_or(ConfigError::MissingParameter("alpha"))?,
            k: self.k.ok_or(ConfigError::MissingParameter("k"))?,
            lambda: self.lambda.ok_or(ConfigError::MissingParameter("lambda"))?,
        };
        let sampling = SamplingConfig {
            strategy: self.strategy.unwrap_or_default(),
            passes: self.passes.unwrap_or(DEFAULT_PASSES),
            checkpoint: self.checkpoint.unwrap_or(DEFAULT_CHECKPOINT),
            seed: self.seed,
            validate_moves: self.validate_moves.unwrap_or(false),
        };

        triangulation.validate()?;
        action.validate()?;
        sampling.validate()?;

        Ok(SimulationConfig {
            triangulation,
            action,
            sampling,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> SimulationConfigBuilder {
        SimulationConfigBuilder::new()
            .topology(Topology::Spherical)
            .simplices(6400)
            .timeslices(7)
            .alpha(0.6)
            .k(1.1)
            .lambda(0.1)
    }

    #[test]
    fn build_fills_defaults() {
        let config = complete().build().unwrap();
        assert_eq!(config.triangulation.dimension, 3);
        assert_eq!(config.triangulation.initial_radius, DEFAULT_INITIAL_RADIUS);
        assert_eq!(config.sampling.passes, DEFAULT_PASSES);
        assert_eq!(config.sampling.checkpoint, DEFAULT_CHECKPOINT);
        assert_eq!(config.sampling.strategy, Strategy::Metropolis);
        assert_eq!(config.sampling.seed, None);
    }

    #[test]
    fn build_reports_first_missing_parameter() {
        let result = SimulationConfigBuilder::new()
            .topology(Topology::Toroidal)
            .simplices(100)
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("timeslices")));

        let result = complete().k(1.0).build().map(|_| ());
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn rejects_small_alpha() {
        let err = complete().alpha(0.4).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { name: "alpha", .. }));
        assert!(err.to_string().contains("greater than 1/2"));
    }

    #[test]
    fn accepts_euclidean_alpha_but_no_other_negative_value() {
        assert!(complete().alpha(-1.0).build().is_ok());
        assert!(complete().alpha(-2.0).build().is_err());
    }

    #[test]
    fn rejects_undersized_triangulations_and_zero_passes() {
        assert!(matches!(
            complete().simplices(1).build(),
            Err(ConfigError::InvalidParameter { name: "simplices", .. })
        ));
        assert!(matches!(
            complete().timeslices(1).build(),
            Err(ConfigError::InvalidParameter { name: "timeslices", .. })
        ));
        assert!(matches!(
            complete().dimension(4).build(),
            Err(ConfigError::InvalidParameter { name: "dimension", .. })
        ));
        assert!(matches!(
            complete().passes(0).build(),
            Err(ConfigError::InvalidParameter { name: "passes", .. })
        ));
    }

    #[test]
    fn strategy_parses_from_cli_spellings() {
        assert_eq!("Metropolis".parse::<Strategy>().unwrap(), Strategy::Metropolis);
        assert_eq!("move-always".parse::<Strategy>().unwrap(), Strategy::MoveAlways);
        assert!("annealing".parse::<Strategy>().is_err());
        assert_eq!(Strategy::MoveAlways.to_string(), "move-always");
    }

    #[test]
    fn triangulation_config_feeds_the_builder() {
        let config = TriangulationConfig::new(Topology::Spherical, 2, 2);
        config.validate().unwrap();
        let manifold = config.manifold_builder().build().unwrap();
        assert_eq!(manifold.n3(), 24);
    }
}
