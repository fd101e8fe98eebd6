//! Ergodic moves on foliated 2+1 dimensional triangulations.
//!
//! The five moves below connect every pair of foliated triangulations with
//! the same topology and number of timeslices. Each move preserves the
//! foliation, the topology and the boundary, and changes the simplex counts by
//! a fixed amount (see [`MoveType::expected_delta`]).
//!
//! Every move follows the same shape: gather candidate sites, shuffle them with
//! the caller's random number generator, take the first site where the move is
//! legal, replace the cells and verify the result. A failed verification rolls
//! the triangulation back.

mod check;
pub mod four_four;
pub mod six_two;
pub mod three_two;
pub mod two_six;
pub mod two_three;

use crate::core::models::geometry::GeometryDelta;
use crate::core::models::manifold::Manifold;
use crate::core::models::triangulation::TriangulationError;
use rand::Rng;
use std::fmt;
use thiserror::Error;

pub const NUMBER_OF_3D_MOVES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MoveType {
    TwoThree = 0,
    ThreeTwo = 1,
    TwoSix = 2,
    SixTwo = 3,
    FourFour = 4,
}

impl MoveType {
    pub const ALL: [MoveType; NUMBER_OF_3D_MOVES] = [
        MoveType::TwoThree,
        MoveType::ThreeTwo,
        MoveType::TwoSix,
        MoveType::SixTwo,
        MoveType::FourFour,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// A move chosen uniformly from the five.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..NUMBER_OF_3D_MOVES)]
    }

    /// Exact change in simplex counts performed by a successful move.
    pub fn expected_delta(self) -> GeometryDelta {
        let (n3, n3_31, n3_22, n3_13, n2, n1_tl, n1_sl, n0) = match self {
            Self::TwoThree => (1, 0, 1, 0, 2, 1, 0, 0),
            Self::ThreeTwo => (-1, 0, -1, 0, -2, -1, 0, 0),
            Self::TwoSix => (4, 2, 0, 2, 8, 2, 3, 1),
            Self::SixTwo => (-4, -2, 0, -2, -8, -2, -3, -1),
            Self::FourFour => (0, 0, 0, 0, 0, 0, 0, 0),
        };
        GeometryDelta {
            n3,
            n3_31,
            n3_22,
            n3_13,
            n2,
            n1: n1_tl + n1_sl,
            n1_tl,
            n1_sl,
            n0,
        }
    }
}

impl fmt::Display for MoveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TwoThree => "(2,3)",
            Self::ThreeTwo => "(3,2)",
            Self::TwoSix => "(2,6)",
            Self::SixTwo => "(6,2)",
            Self::FourFour => "(4,4)",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MoveError {
    #[error("No {0} move possible.")]
    NoCandidate(MoveType),

    #[error("{kind} move failed its post-move check: {reason}")]
    CheckFailed { kind: MoveType, reason: String },

    #[error("{kind} move corrupted the triangulation: {source}")]
    Triangulation {
        kind: MoveType,
        source: TriangulationError,
    },
}

impl MoveError {
    pub fn move_type(&self) -> MoveType {
        match self {
            Self::NoCandidate(kind) => *kind,
            Self::CheckFailed { kind, .. } => *kind,
            Self::Triangulation { kind, .. } => *kind,
        }
    }
}

/// Applies one move of the given type somewhere in the manifold.
///
/// # Errors
///
/// Returns [`MoveError::NoCandidate`] if the move is legal nowhere, and
/// [`MoveError::CheckFailed`] if the result did not have the expected simplex
/// counts (the manifold is restored in that case).
pub fn apply_move(
    manifold: &mut Manifold,
    kind: MoveType,
    rng: &mut impl Rng,
) -> Result<(), MoveError> {
    match kind {
        MoveType::TwoThree => two_three::do_23_move(manifold, rng),
        MoveType::ThreeTwo => three_two::do_32_move(manifold, rng),
        MoveType::TwoSix => two_six::do_26_move(manifold, rng),
        MoveType::SixTwo => six_two::do_62_move(manifold, rng),
        MoveType::FourFour => four_four::do_44_move(manifold, rng),
    }
}

/// Applies a uniformly chosen move, returning which one was attempted.
pub fn random_move(
    manifold: &mut Manifold,
    rng: &mut impl Rng,
) -> (MoveType, Result<(), MoveError>) {
    let kind = MoveType::random(rng);
    (kind, apply_move(manifold, kind, rng))
}
