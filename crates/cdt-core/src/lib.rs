//! # CDT++ Core Library
//!
//! Monte-Carlo simulation of 2+1 dimensional causal dynamical triangulations:
//! foliated simplicial manifolds, the ergodic moves between them and the
//! Metropolis-Hastings sampler that evolves them.
//!
//! ## Architectural Philosophy
//!
//! The library is split into three layers.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Manifold`,
//!   `Triangulation`), the discretized Einstein-Hilbert action and file I/O.
//!
//! - **[`engine`]: The Logic Core.** The five ergodic moves with their
//!   post-move checks, the queued `MoveCommand`, move bookkeeping and the
//!   sampling strategies (`Metropolis`, `MoveAlways`).
//!
//! - **[`workflows`]: The Public API.** Complete procedures built on the two
//!   layers below: constructing an initial triangulation and running a
//!   simulation with checkpoints and progress reporting.

pub mod core;
pub mod engine;
pub mod workflows;
