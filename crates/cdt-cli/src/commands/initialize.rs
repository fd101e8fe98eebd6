use crate::cli::InitializeArgs;
use crate::config::triangulation_from_args;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use cdtpp::core::io::filename::{OFF_EXTENSION, SNAPSHOT_EXTENSION, manifold_filename};
use cdtpp::core::io::off::OffFile;
use cdtpp::core::io::traits::TriangulationFile;
use cdtpp::core::io::tri::TriFile;
use cdtpp::engine::progress::ProgressReporter;
use cdtpp::workflows;
use std::path::{Path, PathBuf};
use tracing::info;

pub async fn run(args: InitializeArgs) -> Result<()> {
    let config = triangulation_from_args(&args.triangulation)?;

    println!("Topology is {}", config.topology);
    println!("Number of dimensions = {}", config.dimension);
    println!("Number of desired simplices = {}", config.simplices);
    println!("Number of desired timeslices = {}", config.timeslices);
    println!("Initial radius = {}", config.initial_radius);
    println!("Foliation spacing = {}", config.foliation_spacing);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let manifold =
        tokio::task::block_in_place(|| workflows::initialize::run(&config, &reporter))?;

    println!("{}", manifold.geometry());
    for (timeslice, volume) in manifold.volume_per_timeslice() {
        println!("  Timeslice {:>4}: {} spacelike faces", timeslice, volume);
    }
    if usize::try_from(manifold.max_time()).unwrap_or(0) < config.timeslices {
        println!(
            "Warning: only {} timeslices were built, {} requested.",
            manifold.max_time(),
            config.timeslices
        );
    }

    if let Some(dir) = &args.output_dir {
        let (tri_path, off_path) = save(&manifold, dir)?;
        println!("Triangulation written to: {}", tri_path.display());
        println!("OFF file written to: {}", off_path.display());
    }
    Ok(())
}

fn save(
    manifold: &cdtpp::core::models::manifold::Manifold,
    dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)?;
    let tri_path = dir.join(manifold_filename(manifold, SNAPSHOT_EXTENSION));
    let off_path = dir.join(manifold_filename(manifold, OFF_EXTENSION));
    info!("Writing triangulation to {:?}", &tri_path);
    TriFile::write_to_path(manifold, &tri_path)?;
    info!("Writing OFF file to {:?}", &off_path);
    OffFile::write_to_path(manifold, &off_path)?;
    Ok((tri_path, off_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn saves_snapshot_and_off_file() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("init");
        let cli = Cli::parse_from([
            "cdt",
            "initialize",
            "--toroidal",
            "-n",
            "640",
            "-t",
            "4",
            "-o",
            out.to_str().unwrap(),
        ]);
        let Commands::Initialize(args) = cli.command else {
            panic!("Expected 'initialize' subcommand");
        };

        run(args).await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with("T3-4-") && names[0].ends_with(".off"));
        assert!(names[1].ends_with(".tri"));

        let manifold = TriFile::read_from_path(out.join(&names[1])).unwrap();
        assert_eq!(manifold.max_time(), 4);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_topology_is_an_argument_error() {
        let cli = Cli::parse_from(["cdt", "initialize", "-n", "640", "-t", "4"]);
        let Commands::Initialize(args) = cli.command else {
            panic!("Expected 'initialize' subcommand");
        };
        assert!(matches!(
            run(args).await,
            Err(crate::error::CliError::Argument(_))
        ));
    }
}
