//! # Core Models Module
//!
//! Data structures describing a foliated simplicial 3-manifold, the object
//! evolved by a causal dynamical triangulations simulation.
//!
//! ## Overview
//!
//! Spacetime is a collection of tetrahedra glued along triangular faces.
//! Every vertex carries an integer timevalue and the vertices sharing a
//! timevalue form a spatial 2-manifold, a *timeslice*. Every tetrahedron spans
//! two adjacent timeslices and is classified by how its vertices split between
//! them.
//!
//! ## Key Components
//!
//! - [`ids`] - Generational arena keys for vertices and cells
//! - [`vertex`] - Embedded vertices with their timevalue
//! - [`cell`] - Tetrahedra, edges, faces and the causal cell classification
//! - [`topology`] - Global topology of the spatial slices
//! - [`triangulation`] - The arena-backed triangulation with its face and incidence indices
//! - [`geometry`] - Simplex counts and their signed deltas
//! - [`manifold`] - A triangulation bundled with incrementally maintained counts
//! - [`builder`] - Construction of initial triangulations
//!
//! ## Usage
//!
//! ```ignore
//! use cdtpp::core::models::{builder::ManifoldBuilder, topology::Topology};
//!
//! let manifold = ManifoldBuilder::new(Topology::Spherical, 6400, 7).build()?;
//! println!("{}", manifold.geometry());
//! ```

pub mod builder;
pub mod cell;
pub mod geometry;
pub mod ids;
pub mod manifold;
pub mod topology;
pub mod triangulation;
pub mod vertex;
