//! # Engine Module
//!
//! The stateful layer of the simulator: it changes a [`Manifold`] through
//! ergodic moves and decides which moves to make.
//!
//! ## Architecture
//!
//! - **Moves** ([`moves`]) - the five foliation-preserving moves, each applied
//!   transactionally and checked against its expected simplex counts
//! - **Command** ([`command`]) - a queue of moves bound to one manifold, with
//!   attempted/successful/failed counters
//! - **Strategies** ([`strategies`]) - Metropolis-Hastings and move-always
//!   proposal schemes built on top of the command
//! - **Tracking** ([`tracker`]) - per-move counters and run statistics
//! - **Configuration** ([`config`]) - simulation parameters and their validation
//! - **Progress Monitoring** ([`progress`]) - progress events for front ends
//! - **Error Handling** ([`error`]) - engine-level error type
//! - **Sampling** ([`utils`]) - acceptance weights for Metropolis sampling
//!
//! [`Manifold`]: crate::core::models::manifold::Manifold

pub mod command;
pub mod config;
pub mod error;
pub mod moves;
pub mod progress;
pub mod strategies;
pub mod tracker;
pub mod utils;

pub use utils::sampling::SamplingError;
