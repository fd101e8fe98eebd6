use crate::cli::RunArgs;
use crate::config::{PartialRunConfig, RunSettings};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use cdtpp::core::io::filename::{SNAPSHOT_EXTENSION, manifold_filename};
use cdtpp::core::io::measurements::MeasurementWriter;
use cdtpp::core::io::traits::TriangulationFile;
use cdtpp::core::io::tri::TriFile;
use cdtpp::core::models::manifold::Manifold;
use cdtpp::engine::progress::ProgressReporter;
use cdtpp::workflows::{self, simulate::Checkpoint};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tracing::info;

pub async fn run(args: RunArgs, cancel: &AtomicBool) -> Result<()> {
    let partial = match &args.config {
        Some(path) => PartialRunConfig::from_file(path)?,
        None => PartialRunConfig::default(),
    };

    let resumed = match &args.resume {
        Some(path) => {
            info!("Resuming from snapshot {:?}", path);
            Some(
                TriFile::read_from_path(path).map_err(|e| CliError::FileParsing {
                    path: path.clone(),
                    source: e.into(),
                })?,
            )
        }
        None => None,
    };

    info!("Merging configuration from file and CLI arguments...");
    let settings = partial.merge_with_cli(&args, resumed.as_ref())?;
    print_parameters(&settings);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let manifold = match resumed {
        Some(manifold) => manifold,
        None => tokio::task::block_in_place(|| {
            workflows::initialize::run(&settings.simulation.triangulation, &reporter)
        })?,
    };
    let requested = settings.simulation.triangulation.timeslices;
    if usize::try_from(manifold.max_time()).unwrap_or(0) < requested {
        println!(
            "Warning: only {} timeslices were built, {} requested.",
            manifold.max_time(),
            requested
        );
    }

    let output = &settings.output;
    std::fs::create_dir_all(&output.directory)?;
    let stem = run_stem(&manifold);
    let action = settings.simulation.action.action();
    let mut measurements = if output.measurements {
        let mut writer = MeasurementWriter::create(&output.directory, &stem)?;
        writer.record(0, &manifold, action.evaluate_geometry(manifold.geometry()))?;
        Some(writer)
    } else {
        None
    };

    println!("Starting {} simulation...", settings.simulation.sampling.strategy);
    let result = tokio::task::block_in_place(|| {
        workflows::simulate::run(
            manifold,
            &settings.simulation,
            &reporter,
            cancel,
            |checkpoint: &Checkpoint<'_>| -> Result<()> {
                if let Some(writer) = measurements.as_mut() {
                    let value = action.evaluate_geometry(checkpoint.manifold.geometry());
                    writer.record(checkpoint.pass, checkpoint.manifold, value)?;
                }
                if output.snapshots {
                    let path = checkpoint_path(&output.directory, &stem, checkpoint.pass);
                    info!("Writing checkpoint to {:?}", &path);
                    TriFile::write_to_path(checkpoint.manifold, &path)?;
                }
                Ok(())
            },
        )
    })?;

    for line in result.statistics.summary_lines() {
        println!("{line}");
    }
    println!("Final geometry: {}", result.manifold.geometry());

    if result.cancelled {
        println!(
            "Simulation interrupted after {} of {} passes.",
            result.passes_completed, settings.simulation.sampling.passes
        );
    }

    if output.snapshots {
        let path = output
            .directory
            .join(format!("{stem}-final.{SNAPSHOT_EXTENSION}"));
        TriFile::write_to_path(&result.manifold, &path)?;
        println!("✓ Final triangulation written to: {}", path.display());
    }
    if let Some(writer) = measurements.as_ref() {
        println!("✓ Measurements written to: {}", writer.geometry_path().display());
    }
    Ok(())
}

/// File stem shared by every output of one run.
fn run_stem(manifold: &Manifold) -> String {
    let name = manifold_filename(manifold, SNAPSHOT_EXTENSION);
    Path::new(&name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or(name)
}

fn checkpoint_path(dir: &Path, stem: &str, pass: usize) -> PathBuf {
    dir.join(format!("{stem}-pass{pass:06}.{SNAPSHOT_EXTENSION}"))
}

fn print_parameters(settings: &RunSettings) {
    let sim = &settings.simulation;
    let tri = &sim.triangulation;
    println!("Topology is {}", tri.topology);
    println!("Number of dimensions = {}", tri.dimension);
    println!("Number of desired simplices = {}", tri.simplices);
    println!("Number of desired timeslices = {}", tri.timeslices);
    println!("Initial radius = {}", tri.initial_radius);
    println!("Foliation spacing = {}", tri.foliation_spacing);
    println!("Alpha = {}", sim.action.alpha);
    println!("K = {}", sim.action.k);
    println!("Lambda = {}", sim.action.lambda);
    println!("Number of passes = {}", sim.sampling.passes);
    println!("Checkpoint every n passes = {}", sim.sampling.checkpoint);
    if let Some(seed) = sim.sampling.seed {
        println!("Random seed = {}", seed);
    }
}
