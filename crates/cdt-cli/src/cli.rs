use cdtpp::core::models::topology::Topology;
use cdtpp::engine::config::Strategy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "CDT - Causal Dynamical Triangulations in 2+1 dimensions. Generates foliated triangulated spacetimes and evolves them with the Metropolis algorithm.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a triangulation (or resume a saved one) and evolve it for a number of passes.
    Run(RunArgs),
    /// Build an initial triangulation, report its geometry and optionally save it.
    Initialize(InitializeArgs),
    /// Print the geometry, volume profile and validity of a saved triangulation.
    Inspect(InspectArgs),
}

/// Mutually exclusive topology flags.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct TopologyFlags {
    /// Spherical timeslices (S² × I).
    #[arg(long, visible_alias = "s")]
    pub spherical: bool,
    /// Toroidal timeslices (T² × I).
    #[arg(long)]
    pub toroidal: bool,
}

impl TopologyFlags {
    pub fn topology(&self) -> Option<Topology> {
        if self.spherical {
            Some(Topology::Spherical)
        } else if self.toroidal {
            Some(Topology::Toroidal)
        } else {
            None
        }
    }
}

/// Shape of the initial triangulation.
#[derive(Args, Debug, Clone, Default)]
pub struct TriangulationArgs {
    #[command(flatten)]
    pub topology: TopologyFlags,

    /// Approximate number of simplices
    #[arg(short = 'n', long, value_name = "SIMPLICES")]
    pub simplices: Option<usize>,

    /// Number of timeslices
    #[arg(short = 't', long, value_name = "TIMESLICES")]
    pub timeslices: Option<usize>,

    /// Dimensionality of the spacetime (only 3 is supported)
    #[arg(short = 'd', long = "dimensions", value_name = "DIM")]
    pub dimension: Option<u32>,

    /// Radius (or height) of the first timeslice
    #[arg(short = 'i', long = "init", value_name = "INITIAL")]
    pub initial_radius: Option<f64>,

    /// Spacing between successive timeslices
    #[arg(long = "foliate", value_name = "FOLIATION")]
    pub foliation_spacing: Option<f64>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    // --- Triangulation ---
    #[command(flatten)]
    pub triangulation: TriangulationArgs,

    /// Resume from a saved `.tri` snapshot instead of building a new triangulation.
    #[arg(long, value_name = "SNAPSHOT")]
    pub resume: Option<PathBuf>,

    // --- Action ---
    /// Negative squared geodesic length of timelike edges
    #[arg(short = 'a', long, value_name = "ALPHA", allow_hyphen_values = true)]
    pub alpha: Option<f64>,

    /// K = 1/(8*pi*G_newton)
    #[arg(short = 'k', value_name = "K", allow_hyphen_values = true)]
    pub k: Option<f64>,

    /// K * cosmological constant
    #[arg(short = 'l', long, value_name = "LAMBDA", allow_hyphen_values = true)]
    pub lambda: Option<f64>,

    // --- Sampling ---
    /// Number of passes; each pass proposes one move per simplex
    #[arg(short = 'p', long, value_name = "PASSES")]
    pub passes: Option<usize>,

    /// Write a checkpoint every this many passes
    #[arg(short = 'c', long, value_name = "CHECKPOINT")]
    pub checkpoint: Option<usize>,

    /// Move strategy: 'metropolis' or 'move-always'
    #[arg(long, value_name = "STRATEGY")]
    pub strategy: Option<Strategy>,

    /// Seed for the random number generator, for reproducible runs
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Run a full validity check after every move (slow)
    #[arg(long)]
    pub validate_moves: bool,

    // --- Output ---
    /// Path to a configuration file in TOML format.
    #[arg(short = 'C', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for snapshots and measurements.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S simulation.passes=50
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `initialize` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InitializeArgs {
    #[command(flatten)]
    pub triangulation: TriangulationArgs,

    /// Save the triangulation as `.tri` and `.off` files into this directory.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Path to a `.tri` snapshot.
    #[arg(required = true, value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Also export the triangulation as a Geomview OFF file.
    #[arg(long, value_name = "PATH")]
    pub off: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_a_full_run_invocation() {
        let cli = Cli::try_parse_from([
            "cdt",
            "-vv",
            "run",
            "--spherical",
            "-n",
            "32000",
            "-t",
            "11",
            "-a",
            "0.6",
            "-k",
            "1.1",
            "-l",
            "0.1",
            "-p",
            "1000",
            "--strategy",
            "move-always",
            "-S",
            "simulation.checkpoint=5",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("Expected 'run' subcommand");
        };
        assert_eq!(args.triangulation.topology.topology(), Some(Topology::Spherical));
        assert_eq!(args.triangulation.simplices, Some(32000));
        assert_eq!(args.triangulation.timeslices, Some(11));
        assert_eq!(args.alpha, Some(0.6));
        assert_eq!(args.k, Some(1.1));
        assert_eq!(args.lambda, Some(0.1));
        assert_eq!(args.passes, Some(1000));
        assert_eq!(args.strategy, Some(Strategy::MoveAlways));
        assert_eq!(args.set_values, vec!["simulation.checkpoint=5"]);
    }

    #[test]
    fn negative_alpha_is_accepted() {
        let cli = Cli::try_parse_from(["cdt", "run", "--toroidal", "-a", "-1", "-k", "1"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("Expected 'run' subcommand");
        };
        assert_eq!(args.alpha, Some(-1.0));
        assert_eq!(args.triangulation.topology.topology(), Some(Topology::Toroidal));
    }

    #[test]
    fn topology_flags_are_exclusive() {
        assert!(Cli::try_parse_from(["cdt", "initialize", "--spherical", "--toroidal"]).is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["cdt", "-q", "-v", "inspect", "a.tri"]).is_err());
    }
}
