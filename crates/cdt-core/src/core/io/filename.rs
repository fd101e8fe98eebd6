use crate::core::models::manifold::Manifold;
use crate::core::models::topology::Topology;
use chrono::{Local, NaiveDateTime};

/// Extension of native snapshots.
pub const SNAPSHOT_EXTENSION: &str = "tri";
/// Extension of Geomview exports.
pub const OFF_EXTENSION: &str = "off";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d.%H%M%S";

/// Builds a descriptive output file name such as
/// `S3-7-6400-I1.000000-R1.000000-2024-05-01.120000.tri`.
///
/// # Arguments
///
/// * `topology` - Topology of the triangulation; selects the `S`/`T` prefix.
/// * `dimension` - Spacetime dimension.
/// * `timeslices` - Number of timeslices.
/// * `simplices` - Number of simplices.
/// * `initial_radius` - Radius of the first timeslice.
/// * `foliation_spacing` - Distance between timeslices.
/// * `timestamp` - Time embedded in the name.
/// * `extension` - File extension without the leading dot.
#[allow(clippy::too_many_arguments)]
pub fn make_filename(
    topology: Topology,
    dimension: u32,
    timeslices: i32,
    simplices: usize,
    initial_radius: f64,
    foliation_spacing: f64,
    timestamp: &NaiveDateTime,
    extension: &str,
) -> String {
    format!(
        "{}{}-{}-{}-I{:.6}-R{:.6}-{}.{}",
        topology.prefix(),
        dimension,
        timeslices,
        simplices,
        initial_radius,
        foliation_spacing,
        timestamp.format(TIMESTAMP_FORMAT),
        extension
    )
}

/// File name for the current state of `manifold`, stamped with local time.
pub fn manifold_filename(manifold: &Manifold, extension: &str) -> String {
    make_filename(
        manifold.topology(),
        3,
        manifold.max_time(),
        manifold.n3(),
        manifold.initial_radius(),
        manifold.foliation_spacing(),
        &Local::now().naive_local(),
        extension,
    )
}
