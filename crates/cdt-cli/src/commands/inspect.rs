use crate::cli::InspectArgs;
use crate::error::{CliError, Result};
use cdtpp::core::io::off::OffFile;
use cdtpp::core::io::traits::TriangulationFile;
use cdtpp::core::io::tri::TriFile;
use cdtpp::core::models::manifold::Manifold;
use std::fmt::Write as _;
use tracing::info;

pub async fn run(args: InspectArgs) -> Result<()> {
    info!("Loading snapshot from {:?}", &args.snapshot);
    let manifold = TriFile::read_from_path(&args.snapshot).map_err(|e| CliError::FileParsing {
        path: args.snapshot.clone(),
        source: e.into(),
    })?;

    print!("{}", report(&manifold));

    if let Some(path) = &args.off {
        OffFile::write_to_path(&manifold, path)?;
        println!("OFF file written to: {}", path.display());
    }
    Ok(())
}

/// Human-readable summary of a loaded manifold.
fn report(manifold: &Manifold) -> String {
    let g = manifold.geometry();
    let tri = manifold.triangulation();
    let mut out = String::new();

    let _ = writeln!(out, "Topology: {}", manifold.topology());
    let _ = writeln!(
        out,
        "Timeslices: {}..={} (initial radius {}, foliation spacing {})",
        manifold.min_time(),
        manifold.max_time(),
        manifold.initial_radius(),
        manifold.foliation_spacing()
    );
    let _ = writeln!(out, "{g}");
    let _ = writeln!(out, "Euler characteristic: {}", g.euler_characteristic());
    let _ = writeln!(out, "Volume profile:");
    for (timeslice, volume) in manifold.volume_per_timeslice() {
        let _ = writeln!(out, "  {:>4}: {}", timeslice, volume);
    }
    let _ = writeln!(out, "Foliated: {}", tri.is_foliated());
    match manifold.check_consistency() {
        Ok(()) => {
            let _ = writeln!(out, "Valid: true");
        }
        Err(e) => {
            let _ = writeln!(out, "Valid: false ({e})");
        }
    }
    out
}
