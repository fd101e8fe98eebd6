//! # Core Module
//!
//! Stateless building blocks of a causal dynamical triangulations simulation:
//! the triangulation data model, the discretized action and file formats.
//!
//! ## Overview
//!
//! Nothing in this module knows about Monte-Carlo sampling. It describes
//! what a foliated triangulation is, how it is built, how its action is
//! evaluated and how it is stored, leaving the evolution of the triangulation
//! to the [`crate::engine`] layer.
//!
//! ## Architecture
//!
//! - **Triangulation** ([`models`]) - Vertices, cells, the foliated triangulation, cached simplex counts and the initial builder
//! - **Action** ([`action`]) - The 2+1 dimensional Einstein-Hilbert bulk action on a triangulation
//! - **File I/O** ([`io`]) - Native snapshots, OFF export, measurement tables and file naming
//! - **Geometry Utilities** ([`utils`]) - Slice levels, projections and centroids in the embedding
//!
//! ## Scientific Foundation
//!
//! - **Causal dynamical triangulations** approximate the gravitational path
//!   integral by a sum over triangulations with a global time foliation
//! - **Regge calculus** turns the Einstein-Hilbert action into a function of
//!   simplex counts once every edge length is fixed

pub mod action;
pub mod io;
pub mod models;
pub mod utils;
