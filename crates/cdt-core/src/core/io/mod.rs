//! Provides input/output functionality for triangulations and measurements.
//!
//! This module contains the native snapshot format used to save and resume
//! simulations, a write-only Geomview OFF exporter for visualization, CSV
//! measurement tables written at every checkpoint, and the naming scheme for
//! output files.

pub mod filename;
pub mod measurements;
pub mod off;
pub mod traits;
pub mod tri;
