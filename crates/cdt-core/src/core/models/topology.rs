use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Global topology of the spacetime: a spatial 2-manifold times an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// S² × I, every timeslice is a triangulated 2-sphere.
    #[default]
    Spherical,
    /// T² × I, every timeslice is a triangulated 2-torus.
    Toroidal,
}

impl Topology {
    /// Single-letter prefix used in generated file names.
    pub fn prefix(&self) -> char {
        match self {
            Self::Spherical => 'S',
            Self::Toroidal => 'T',
        }
    }

    /// Euler characteristic of the spatial slice, which is also that of the
    /// slice times an interval.
    pub fn euler_characteristic(&self) -> i64 {
        match self {
            Self::Spherical => 2,
            Self::Toroidal => 0,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid topology string: '{0}'")]
pub struct ParseTopologyError(String);

impl FromStr for Topology {
    type Err = ParseTopologyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s" | "spherical" | "sphere" => Ok(Self::Spherical),
            "t" | "toroidal" | "torus" => Ok(Self::Toroidal),
            _ => Err(ParseTopologyError(s.to_string())),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Spherical => "spherical",
                Self::Toroidal => "toroidal",
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_names() {
        assert_eq!("spherical".parse::<Topology>().unwrap(), Topology::Spherical);
        assert_eq!("S".parse::<Topology>().unwrap(), Topology::Spherical);
        assert_eq!("Torus".parse::<Topology>().unwrap(), Topology::Toroidal);
        assert!("klein".parse::<Topology>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for topology in [Topology::Spherical, Topology::Toroidal] {
            assert_eq!(topology.to_string().parse::<Topology>().unwrap(), topology);
        }
    }

    #[test]
    fn prefix_matches_file_naming_convention() {
        assert_eq!(Topology::Spherical.prefix(), 'S');
        assert_eq!(Topology::Toroidal.prefix(), 'T');
    }
}
