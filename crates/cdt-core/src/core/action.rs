//! The discretized Einstein-Hilbert bulk action of 2+1 dimensional CDT.
//!
//! Every spacelike edge has squared length `a²` and every timelike edge
//! `-α a²`, so the Regge action reduces to a linear combination of the
//! number of timelike edges, the number of (3,1) and (1,3) tetrahedra and the
//! number of (2,2) tetrahedra. The coefficients depend on `α`, the bare
//! gravitational coupling `k = 1/(8πG)` and the bare cosmological constant
//! `λ = kΛ`.

use super::models::geometry::Geometry;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Bulk action at `α = 1`, with the Regge coefficients evaluated to three
/// decimals.
pub fn s3_bulk_action_alpha_one(
    n1_tl: usize,
    n3_31_13: usize,
    n3_22: usize,
    k: f64,
    lambda: f64,
) -> f64 {
    alpha_one(n1_tl as f64, n3_31_13 as f64, n3_22 as f64, k, lambda)
}

/// Bulk action at `α = -1`, which is `i` times the action of Euclidean
/// dynamically triangulated gravity.
pub fn s3_bulk_action_alpha_minus_one(
    n1_tl: usize,
    n3_31_13: usize,
    n3_22: usize,
    k: f64,
    lambda: f64,
) -> f64 {
    alpha_minus_one(n1_tl as f64, n3_31_13 as f64, n3_22 as f64, k, lambda)
}

/// Bulk action for a general positive `α`.
///
/// # Arguments
///
/// * `n1_tl` - Number of timelike edges.
/// * `n3_31_13` - Number of (3,1) plus (1,3) tetrahedra.
/// * `n3_22` - Number of (2,2) tetrahedra.
/// * `alpha` - Squared ratio of timelike to spacelike edge length.
/// * `k` - Bare gravitational coupling, `1/(8πG)`.
/// * `lambda` - Bare cosmological constant times `k`.
///
/// # Return
///
/// The action; `NaN` if `alpha` is negative.
pub fn s3_bulk_action(
    n1_tl: usize,
    n3_31_13: usize,
    n3_22: usize,
    alpha: f64,
    k: f64,
    lambda: f64,
) -> f64 {
    general(n1_tl as f64, n3_31_13 as f64, n3_22 as f64, alpha, k, lambda)
}

fn alpha_one(n1_tl: f64, n3_31_13: f64, n3_22: f64, k: f64, lambda: f64) -> f64 {
    2.0 * PI * k * n1_tl
        + n3_31_13 * (-3.548 * k - 0.167 * lambda)
        + n3_22 * (-5.355 * k - 0.204 * lambda)
}

fn alpha_minus_one(n1_tl: f64, n3_31_13: f64, n3_22: f64, k: f64, lambda: f64) -> f64 {
    -2.0 * PI * k * n1_tl
        + n3_31_13 * (2.673 * k + 0.118 * lambda)
        + n3_22 * (7.386 * k + 0.118 * lambda)
}

fn general(n1_tl: f64, n3_31_13: f64, n3_22: f64, alpha: f64, k: f64, lambda: f64) -> f64 {
    let sqrt_alpha = alpha.sqrt();
    let four_alpha_plus_one = 4.0 * alpha + 1.0;

    let timelike = 2.0 * PI * k * sqrt_alpha * n1_tl;

    let per_31 = -3.0 * k * (1.0 / (3f64.sqrt() * four_alpha_plus_one.sqrt())).asinh()
        - 3.0 * k * sqrt_alpha * ((2.0 * alpha + 1.0) / four_alpha_plus_one).acos()
        - lambda / 12.0 * (3.0 * alpha + 1.0).sqrt();

    let per_22 = 2.0
        * k
        * (2.0 * 2f64.sqrt() * (2.0 * alpha + 1.0).sqrt() / four_alpha_plus_one).asinh()
        - 4.0 * k * sqrt_alpha * (-1.0 / four_alpha_plus_one).acos()
        - lambda / 12.0 * (4.0 * alpha + 2.0).sqrt();

    timelike + n3_31_13 * per_31 + n3_22 * per_22
}

/// Couplings of the bulk action, dispatching to the closed forms at
/// `α = ±1` and to the general expression otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct S3Action {
    pub alpha: f64,
    pub k: f64,
    pub lambda: f64,
}

impl S3Action {
    pub fn new(alpha: f64, k: f64, lambda: f64) -> Self {
        Self { alpha, k, lambda }
    }

    /// Evaluates the action on raw counts. Counts are floating point so that
    /// hypothetical post-move geometries can be scored without underflow.
    pub fn evaluate(&self, n1_tl: f64, n3_31_13: f64, n3_22: f64) -> f64 {
        if self.alpha == 1.0 {
            alpha_one(n1_tl, n3_31_13, n3_22, self.k, self.lambda)
        } else if self.alpha == -1.0 {
            alpha_minus_one(n1_tl, n3_31_13, n3_22, self.k, self.lambda)
        } else {
            general(n1_tl, n3_31_13, n3_22, self.alpha, self.k, self.lambda)
        }
    }

    pub fn evaluate_geometry(&self, geometry: &Geometry) -> f64 {
        self.evaluate(
            geometry.n1_tl as f64,
            geometry.n3_31_13 as f64,
            geometry.n3_22 as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::ManifoldBuilder;
    use crate::core::models::topology::Topology;

    const K: f64 = 1.1;
    const LAMBDA: f64 = 0.1;

    fn relative_difference(a: f64, b: f64) -> f64 {
        (a - b).abs() / a.abs().max(b.abs())
    }

    #[test]
    fn alpha_one_matches_closed_form() {
        let s = s3_bulk_action_alpha_one(10, 20, 5, 1.0, 0.0);
        let expected = 2.0 * PI * 10.0 - 3.548 * 20.0 - 5.355 * 5.0;
        assert!((s - expected).abs() < 1e-9);
    }

    #[test]
    fn alpha_minus_one_flips_the_timelike_term() {
        let s = s3_bulk_action_alpha_minus_one(10, 0, 0, 2.0, 0.0);
        assert!((s + 2.0 * PI * 2.0 * 10.0).abs() < 1e-9);
        let s = s3_bulk_action_alpha_minus_one(0, 1, 1, 0.0, 1.0);
        assert!((s - 0.236).abs() < 1e-9);
    }

    #[test]
    fn general_formula_agrees_with_alpha_one_per_simplex_type() {
        let contributions = [(1000, 0, 0), (0, 1000, 0), (0, 0, 1000)];
        for (n1_tl, n3_31_13, n3_22) in contributions {
            let general = s3_bulk_action(n1_tl, n3_31_13, n3_22, 1.0, K, LAMBDA);
            let special = s3_bulk_action_alpha_one(n1_tl, n3_31_13, n3_22, K, LAMBDA);
            assert!(
                relative_difference(general, special) < 0.005,
                "general {general} vs alpha=1 {special}"
            );
        }
    }

    #[test]
    fn action_of_initial_triangulation_is_finite() {
        let manifold = ManifoldBuilder::new(Topology::Spherical, 6400, 7)
            .build()
            .unwrap();
        for alpha in [-1.0, 0.6, 1.0] {
            let s = S3Action::new(alpha, K, LAMBDA).evaluate_geometry(manifold.geometry());
            assert!(s.is_finite(), "alpha = {alpha} gave {s}");
        }
    }

    #[test]
    fn s3_action_dispatches_on_alpha() {
        let g = Geometry {
            n1_tl: 100,
            n3_31_13: 200,
            n3_22: 80,
            ..Default::default()
        };
        let one = S3Action::new(1.0, K, LAMBDA).evaluate_geometry(&g);
        assert_eq!(one, s3_bulk_action_alpha_one(100, 200, 80, K, LAMBDA));

        let minus_one = S3Action::new(-1.0, K, LAMBDA).evaluate_geometry(&g);
        assert_eq!(minus_one, s3_bulk_action_alpha_minus_one(100, 200, 80, K, LAMBDA));

        let other = S3Action::new(0.6, K, LAMBDA).evaluate_geometry(&g);
        assert_eq!(other, s3_bulk_action(100, 200, 80, 0.6, K, LAMBDA));
    }

    #[test]
    fn more_timelike_edges_raise_the_action_for_positive_k() {
        let action = S3Action::new(0.6, K, LAMBDA);
        assert!(action.evaluate(101.0, 50.0, 50.0) > action.evaluate(100.0, 50.0, 50.0));
    }
}
