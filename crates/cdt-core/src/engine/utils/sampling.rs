use rand::Rng;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SamplingError {
    #[error("No moves have been proposed, cannot compute a proposal weight")]
    NoProposals,
    #[error("Action is not finite (current: {current}, proposed: {proposed})")]
    NonFiniteAction { current: f64, proposed: f64 },
}

/// Fraction of all proposals that were of one kind.
pub fn proposal_weight(proposed_of_kind: usize, total_proposed: usize) -> Result<f64, SamplingError> {
    if total_proposed == 0 {
        return Err(SamplingError::NoProposals);
    }
    Ok(proposed_of_kind as f64 / total_proposed as f64)
}

/// Boltzmann factor for going from `current` to `proposed`, capped at one.
#[instrument(level = "trace")]
pub fn action_weight(current: f64, proposed: f64) -> Result<f64, SamplingError> {
    let difference = current - proposed;
    if !difference.is_finite() {
        return Err(SamplingError::NonFiniteAction { current, proposed });
    }
    if difference >= 0.0 {
        Ok(1.0)
    } else {
        Ok(difference.exp())
    }
}

/// Accepts with the given probability by drawing from `[0, 1)`.
///
/// A probability of one or more always accepts.
pub fn metropolis_accept(probability: f64, rng: &mut impl Rng) -> bool {
    rng.gen_range(0.0..1.0) <= probability
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn proposal_weight_is_a_fraction() {
        assert_eq!(proposal_weight(1, 4), Ok(0.25));
        assert_eq!(proposal_weight(0, 0), Err(SamplingError::NoProposals));
    }

    #[test]
    fn lowering_the_action_is_always_accepted() {
        assert_eq!(action_weight(10.0, 5.0), Ok(1.0));
        assert_eq!(action_weight(5.0, 5.0), Ok(1.0));
        let w = action_weight(5.0, 7.0).unwrap();
        assert!((w - (-2.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn infinite_action_is_an_error() {
        assert!(matches!(
            action_weight(f64::INFINITY, 1.0),
            Err(SamplingError::NonFiniteAction { .. })
        ));
    }

    #[test]
    fn acceptance_follows_probability() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!((0..100).all(|_| metropolis_accept(1.0, &mut rng)));
        assert!((0..100).all(|_| !metropolis_accept(-1.0, &mut rng)));
        let accepted = (0..10_000)
            .filter(|_| metropolis_accept(0.3, &mut rng))
            .count();
        assert!((2_500..3_500).contains(&accepted));
    }
}
