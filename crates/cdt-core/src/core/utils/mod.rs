//! Geometric helpers shared by the triangulation builder, the moves and the
//! exporters.

pub mod geometry;
