use crate::core::models::manifold::Manifold;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeasurementError {
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// One row of the geometry table, written at every checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    pub pass: usize,
    pub n0: usize,
    pub n1_tl: usize,
    pub n1_sl: usize,
    pub n2: usize,
    pub n3: usize,
    pub n3_31: usize,
    pub n3_22: usize,
    pub n3_13: usize,
    pub action: f64,
}

impl GeometryRecord {
    pub fn new(pass: usize, manifold: &Manifold, action: f64) -> Self {
        let g = manifold.geometry();
        Self {
            pass,
            n0: g.n0,
            n1_tl: g.n1_tl,
            n1_sl: g.n1_sl,
            n2: g.n2,
            n3: g.n3,
            n3_31: g.n3_31,
            n3_22: g.n3_22,
            n3_13: g.n3_13,
            action,
        }
    }
}

/// Spatial volume of one timeslice at a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRecord {
    pub pass: usize,
    pub timeslice: i32,
    pub spacelike_faces: usize,
}

/// Appends checkpoint measurements to `<stem>-geometry.csv` and
/// `<stem>-volumes.csv`.
pub struct MeasurementWriter {
    geometry: csv::Writer<File>,
    volumes: csv::Writer<File>,
    geometry_path: PathBuf,
    volume_path: PathBuf,
}

impl MeasurementWriter {
    /// Creates both tables in `dir`, truncating existing files.
    ///
    /// # Errors
    ///
    /// Returns [`MeasurementError::Csv`] if either file cannot be created.
    pub fn create(dir: &Path, stem: &str) -> Result<Self, MeasurementError> {
        let geometry_path = dir.join(format!("{stem}-geometry.csv"));
        let volume_path = dir.join(format!("{stem}-volumes.csv"));
        let open = |path: &Path| {
            csv::Writer::from_path(path).map_err(|e| MeasurementError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })
        };
        Ok(Self {
            geometry: open(&geometry_path)?,
            volumes: open(&volume_path)?,
            geometry_path,
            volume_path,
        })
    }

    pub fn geometry_path(&self) -> &Path {
        &self.geometry_path
    }

    pub fn volume_path(&self) -> &Path {
        &self.volume_path
    }

    /// Writes the geometry row and the volume profile for one checkpoint.
    pub fn record(
        &mut self,
        pass: usize,
        manifold: &Manifold,
        action: f64,
    ) -> Result<(), MeasurementError> {
        self.geometry
            .serialize(GeometryRecord::new(pass, manifold, action))
            .map_err(|e| MeasurementError::Csv {
                path: self.geometry_path.to_string_lossy().to_string(),
                source: e,
            })?;
        for (timeslice, spacelike_faces) in manifold.volume_per_timeslice() {
            self.volumes
                .serialize(VolumeRecord {
                    pass,
                    timeslice,
                    spacelike_faces,
                })
                .map_err(|e| MeasurementError::Csv {
                    path: self.volume_path.to_string_lossy().to_string(),
                    source: e,
                })?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<(), MeasurementError> {
        self.geometry.flush().map_err(|e| MeasurementError::Io {
            path: self.geometry_path.to_string_lossy().to_string(),
            source: e,
        })?;
        self.volumes.flush().map_err(|e| MeasurementError::Io {
            path: self.volume_path.to_string_lossy().to_string(),
            source: e,
        })
    }
}
