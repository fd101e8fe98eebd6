//! Helpers shared by the move strategies.

pub mod sampling;
