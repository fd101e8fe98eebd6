use crate::cli::{RunArgs, TriangulationArgs};
use crate::error::{CliError, Result};
use cdtpp::core::models::manifold::Manifold;
use cdtpp::core::models::topology::Topology;
use cdtpp::engine::config::{self as core_config, SimulationConfig, Strategy, TriangulationConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialTriangulationConfig {
    topology: Option<Topology>,
    simplices: Option<usize>,
    timeslices: Option<usize>,
    dimension: Option<u32>,
    initial_radius: Option<f64>,
    foliation_spacing: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialActionConfig {
    alpha: Option<f64>,
    k: Option<f64>,
    lambda: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSimulationConfig {
    strategy: Option<Strategy>,
    passes: Option<usize>,
    checkpoint: Option<usize>,
    seed: Option<u64>,
    validate_moves: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialOutputConfig {
    directory: Option<PathBuf>,
    snapshots: Option<bool>,
    measurements: Option<bool>,
}

/// Where and what a run writes.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub snapshots: bool,
    pub measurements: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            snapshots: true,
            measurements: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub simulation: SimulationConfig,
    pub output: OutputSettings,
}

/// Contents of a TOML configuration file, every key optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    triangulation: Option<PartialTriangulationConfig>,
    action: Option<PartialActionConfig>,
    simulation: Option<PartialSimulationConfig>,
    output: Option<PartialOutputConfig>,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Layers `-S` overrides, then command-line flags, over the file values
    /// and validates the result.
    ///
    /// When `resumed` is given, the triangulation section is taken from the
    /// loaded snapshot.
    pub fn merge_with_cli(mut self, args: &RunArgs, resumed: Option<&Manifold>) -> Result<RunSettings> {
        self.apply_set_values(&args.set_values)?;

        let tri = self.triangulation.take().unwrap_or_default();
        let action = self.action.take().unwrap_or_default();
        let sim = self.simulation.take().unwrap_or_default();
        let out = self.output.take().unwrap_or_default();

        let mut builder = core_config::SimulationConfigBuilder::new();
        builder = match resumed {
            Some(manifold) => {
                info!("Taking triangulation parameters from the resumed snapshot.");
                builder
                    .topology(manifold.topology())
                    .simplices(manifold.n3())
                    .timeslices(usize::try_from(manifold.max_time()).unwrap_or(0))
                    .initial_radius(manifold.initial_radius())
                    .foliation_spacing(manifold.foliation_spacing())
            }
            None => {
                let t = &args.triangulation;
                let mut builder = builder;
                if let Some(topology) = t.topology.topology().or(tri.topology) {
                    builder = builder.topology(topology);
                }
                if let Some(n) = t.simplices.or(tri.simplices) {
                    builder = builder.simplices(n);
                }
                if let Some(n) = t.timeslices.or(tri.timeslices) {
                    builder = builder.timeslices(n);
                }
                if let Some(d) = t.dimension.or(tri.dimension) {
                    builder = builder.dimension(d);
                }
                if let Some(r) = t.initial_radius.or(tri.initial_radius) {
                    builder = builder.initial_radius(r);
                }
                if let Some(s) = t.foliation_spacing.or(tri.foliation_spacing) {
                    builder = builder.foliation_spacing(s);
                }
                builder
            }
        };

        if let Some(alpha) = args.alpha.or(action.alpha) {
            builder = builder.alpha(alpha);
        }
        if let Some(k) = args.k.or(action.k) {
            builder = builder.k(k);
        }
        if let Some(lambda) = args.lambda.or(action.lambda) {
            builder = builder.lambda(lambda);
        }
        if let Some(strategy) = args.strategy.or(sim.strategy) {
            builder = builder.strategy(strategy);
        }
        if let Some(passes) = args.passes.or(sim.passes) {
            builder = builder.passes(passes);
        }
        if let Some(checkpoint) = args.checkpoint.or(sim.checkpoint) {
            builder = builder.checkpoint(checkpoint);
        }
        builder = builder
            .seed(args.seed.or(sim.seed))
            .validate_moves(args.validate_moves || sim.validate_moves.unwrap_or(false));

        let simulation = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

        let defaults = OutputSettings::default();
        let output = OutputSettings {
            directory: args
                .output_dir
                .clone()
                .or(out.directory)
                .unwrap_or(defaults.directory),
            snapshots: out.snapshots.unwrap_or(defaults.snapshots),
            measurements: out.measurements.unwrap_or(defaults.measurements),
        };

        Ok(RunSettings { simulation, output })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            let tri = || PartialTriangulationConfig::default();
            match key {
                "triangulation.topology" => {
                    self.triangulation.get_or_insert_with(tri).topology = Some(parse(key, value)?)
                }
                "triangulation.simplices" => {
                    self.triangulation.get_or_insert_with(tri).simplices = Some(parse(key, value)?)
                }
                "triangulation.timeslices" => {
                    self.triangulation.get_or_insert_with(tri).timeslices = Some(parse(key, value)?)
                }
                "triangulation.dimension" => {
                    self.triangulation.get_or_insert_with(tri).dimension = Some(parse(key, value)?)
                }
                "triangulation.initial-radius" => {
                    self.triangulation.get_or_insert_with(tri).initial_radius =
                        Some(parse(key, value)?)
                }
                "triangulation.foliation-spacing" => {
                    self.triangulation.get_or_insert_with(tri).foliation_spacing =
                        Some(parse(key, value)?)
                }
                "action.alpha" => {
                    self.action.get_or_insert_with(Default::default).alpha = Some(parse(key, value)?)
                }
                "action.k" => {
                    self.action.get_or_insert_with(Default::default).k = Some(parse(key, value)?)
                }
                "action.lambda" => {
                    self.action.get_or_insert_with(Default::default).lambda =
                        Some(parse(key, value)?)
                }
                "simulation.strategy" => {
                    self.simulation.get_or_insert_with(Default::default).strategy =
                        Some(parse(key, value)?)
                }
                "simulation.passes" => {
                    self.simulation.get_or_insert_with(Default::default).passes =
                        Some(parse(key, value)?)
                }
                "simulation.checkpoint" => {
                    self.simulation.get_or_insert_with(Default::default).checkpoint =
                        Some(parse(key, value)?)
                }
                "simulation.seed" => {
                    self.simulation.get_or_insert_with(Default::default).seed =
                        Some(parse(key, value)?)
                }
                "simulation.validate-moves" => {
                    self.simulation.get_or_insert_with(Default::default).validate_moves =
                        Some(parse(key, value)?)
                }
                "output.directory" => {
                    self.output.get_or_insert_with(Default::default).directory =
                        Some(PathBuf::from(value))
                }
                "output.snapshots" => {
                    self.output.get_or_insert_with(Default::default).snapshots =
                        Some(parse(key, value)?)
                }
                "output.measurements" => {
                    self.output.get_or_insert_with(Default::default).measurements =
                        Some(parse(key, value)?)
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

/// Triangulation parameters for commands that always build from scratch.
pub fn triangulation_from_args(args: &TriangulationArgs) -> Result<TriangulationConfig> {
    let topology = args.topology.topology().ok_or_else(|| {
        CliError::Argument("One of --spherical or --toroidal is required.".to_string())
    })?;
    let simplices = args
        .simplices
        .ok_or_else(|| CliError::Argument("-n SIMPLICES is required.".to_string()))?;
    let timeslices = args
        .timeslices
        .ok_or_else(|| CliError::Argument("-t TIMESLICES is required.".to_string()))?;

    let mut config = TriangulationConfig::new(topology, simplices, timeslices);
    if let Some(d) = args.dimension {
        config.dimension = d;
    }
    if let Some(r) = args.initial_radius {
        config.initial_radius = r;
    }
    if let Some(s) = args.foliation_spacing {
        config.foliation_spacing = s;
    }
    config
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use cdtpp::core::models::builder::ManifoldBuilder;
    use clap::Parser;
    use once_cell::sync::Lazy;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("Failed to create temp dir"));

    fn write_config_file(name: &str, content: &str) -> PathBuf {
        let file_path = TEST_DIR.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut args = vec!["cdt", "run"];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Run(run) => run,
            _ => panic!("Expected 'run' subcommand"),
        }
    }

    const FULL_CONFIG: &str = r#"
        [triangulation]
        topology = "spherical"
        simplices = 6400
        timeslices = 7

        [action]
        alpha = 0.6
        k = 1.1
        lambda = 0.1

        [simulation]
        passes = 50 # Will be overridden
        seed = 9

        [output]
        directory = "runs"
        snapshots = false
    "#;

    #[test]
    fn test_load_from_file_and_merge_with_defaults() {
        let path = write_config_file("full.toml", FULL_CONFIG);
        let settings = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&run_args(&[]), None)
            .unwrap();

        let sim = &settings.simulation;
        assert_eq!(sim.triangulation.topology, Topology::Spherical);
        assert_eq!(sim.triangulation.simplices, 6400);
        assert_eq!(sim.triangulation.timeslices, 7);
        assert_eq!(sim.triangulation.initial_radius, core_config::DEFAULT_INITIAL_RADIUS);
        assert_eq!(sim.action.alpha, 0.6);
        assert_eq!(sim.sampling.passes, 50);
        assert_eq!(sim.sampling.checkpoint, core_config::DEFAULT_CHECKPOINT);
        assert_eq!(sim.sampling.seed, Some(9));
        assert_eq!(sim.sampling.strategy, Strategy::Metropolis);
        assert_eq!(settings.output.directory, PathBuf::from("runs"));
        assert!(!settings.output.snapshots);
        assert!(settings.output.measurements);
    }

    #[test]
    fn test_cli_args_override_file_values() {
        let path = write_config_file("override.toml", FULL_CONFIG);
        let args = run_args(&["--toroidal", "-p", "3", "-a", "-1", "-o", "elsewhere"]);
        let settings = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args, None)
            .unwrap();

        assert_eq!(settings.simulation.triangulation.topology, Topology::Toroidal);
        assert_eq!(settings.simulation.sampling.passes, 3);
        assert_eq!(settings.simulation.action.alpha, -1.0);
        assert_eq!(settings.output.directory, PathBuf::from("elsewhere"));
    }

    #[test]
    fn test_set_value_overrides_file_and_defaults() {
        let path = write_config_file("set.toml", FULL_CONFIG);
        let args = run_args(&[
            "-S",
            "simulation.passes=20",
            "-S",
            "simulation.strategy=move-always",
            "-S",
            "triangulation.foliation-spacing=0.5",
        ]);
        let settings = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args, None)
            .unwrap();

        assert_eq!(settings.simulation.sampling.passes, 20);
        assert_eq!(settings.simulation.sampling.strategy, Strategy::MoveAlways);
        assert_eq!(settings.simulation.triangulation.foliation_spacing, 0.5);
    }

    #[test]
    fn test_missing_required_field_returns_error() {
        let path = write_config_file(
            "missing.toml",
            r#"
            [triangulation]
            topology = "toroidal"
            simplices = 640
            timeslices = 4
            "#,
        );
        let result = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&run_args(&[]), None);
        assert!(matches!(&result, Err(CliError::Config(msg)) if msg.contains("alpha")));
    }

    #[test]
    fn test_invalid_alpha_is_rejected() {
        let args = run_args(&["--spherical", "-n", "640", "-t", "4", "-a", "0.2", "-k", "1", "-l", "0.1"]);
        let result = PartialRunConfig::default().merge_with_cli(&args, None);
        assert!(matches!(&result, Err(CliError::Config(msg)) if msg.contains("1/2")));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let path = write_config_file("unknown.toml", "[action]\nbeta = 1.0\n");
        assert!(matches!(
            PartialRunConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));

        let mut partial = PartialRunConfig::default();
        let err = partial
            .apply_set_values(&["action.beta=1".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("action.beta"));
        assert!(partial.apply_set_values(&["no-equals-sign".to_string()]).is_err());
        assert!(partial.apply_set_values(&["simulation.passes=many".to_string()]).is_err());
    }

    #[test]
    fn test_resumed_manifold_supplies_triangulation() {
        let manifold = ManifoldBuilder::new(Topology::Toroidal, 640, 4).build().unwrap();
        let args = run_args(&["--spherical", "-n", "99", "-a", "0.6", "-k", "1.1", "-l", "0.1"]);
        let settings = PartialRunConfig::default()
            .merge_with_cli(&args, Some(&manifold))
            .unwrap();

        let tri = &settings.simulation.triangulation;
        assert_eq!(tri.topology, Topology::Toroidal);
        assert_eq!(tri.simplices, manifold.n3());
        assert_eq!(tri.timeslices, 4);
    }

    #[test]
    fn test_triangulation_from_args_requires_shape() {
        let args = TriangulationArgs::default();
        assert!(matches!(
            triangulation_from_args(&args),
            Err(CliError::Argument(_))
        ));

        let args = TriangulationArgs {
            simplices: Some(640),
            timeslices: Some(4),
            initial_radius: Some(2.0),
            ..TriangulationArgs::default()
        };
        assert!(triangulation_from_args(&args).is_err());

        let mut args = args;
        args.topology.spherical = true;
        let config = triangulation_from_args(&args).unwrap();
        assert_eq!(config.initial_radius, 2.0);
        assert_eq!(config.foliation_spacing, core_config::DEFAULT_FOLIATION_SPACING);
    }
}
