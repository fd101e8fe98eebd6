//! # Workflows Module
//!
//! High-level entry points that tie the engine and core together.
//!
//! - **Initialization** ([`initialize`]) - builds the starting triangulation
//! - **Simulation** ([`simulate`]) - runs a move strategy for a number of
//!   passes with checkpointing and cancellation

pub mod initialize;
pub mod simulate;
