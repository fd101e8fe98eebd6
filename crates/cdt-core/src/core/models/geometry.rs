use super::cell::{CellType, Edge};
use super::triangulation::FoliatedTriangulation;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::ops::{Add, Sub};

/// Simplex counts of a foliated triangulation.
///
/// Naming follows the CDT literature: `n3` counts tetrahedra, `n2` triangles,
/// `n1` edges and `n0` vertices; suffixes split them by causal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Geometry {
    pub n3: usize,
    pub n3_31: usize,
    pub n3_13: usize,
    pub n3_31_13: usize,
    pub n3_22: usize,
    pub n2: usize,
    pub n1: usize,
    pub n1_tl: usize,
    pub n1_sl: usize,
    pub n0: usize,
}

impl From<&FoliatedTriangulation> for Geometry {
    /// Recounts every simplex of the triangulation from scratch.
    fn from(triangulation: &FoliatedTriangulation) -> Self {
        let kinds: Vec<CellType> = triangulation.cells().map(|(_, c)| c.kind).collect();
        let (n3_31, n3_22, n3_13) = kinds
            .par_iter()
            .map(|kind| match kind {
                CellType::ThreeOne => (1, 0, 0),
                CellType::TwoTwo => (0, 1, 0),
                CellType::OneThree => (0, 0, 1),
                CellType::Error => (0, 0, 0),
            })
            .reduce(|| (0, 0, 0), |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2));

        let edges: Vec<Edge> = triangulation.edges();
        let n1_tl = edges
            .par_iter()
            .filter(|e| triangulation.is_timelike(e))
            .count();

        Self {
            n3: kinds.len(),
            n3_31,
            n3_13,
            n3_31_13: n3_31 + n3_13,
            n3_22,
            n2: triangulation.number_of_faces(),
            n1: edges.len(),
            n1_tl,
            n1_sl: edges.len() - n1_tl,
            n0: triangulation.number_of_vertices(),
        }
    }
}

impl Geometry {
    /// N0 − N1 + N2 − N3.
    pub fn euler_characteristic(&self) -> i64 {
        self.n0 as i64 - self.n1 as i64 + self.n2 as i64 - self.n3 as i64
    }

    /// Applies a signed change, returning `None` if any count would go negative.
    pub fn checked_apply(&self, delta: &GeometryDelta) -> Option<Self> {
        let apply = |count: usize, d: i64| -> Option<usize> {
            usize::try_from(count as i64 + d).ok()
        };
        let n3_31 = apply(self.n3_31, delta.n3_31)?;
        let n3_13 = apply(self.n3_13, delta.n3_13)?;
        Some(Self {
            n3: apply(self.n3, delta.n3)?,
            n3_31,
            n3_13,
            n3_31_13: n3_31 + n3_13,
            n3_22: apply(self.n3_22, delta.n3_22)?,
            n2: apply(self.n2, delta.n2)?,
            n1: apply(self.n1, delta.n1)?,
            n1_tl: apply(self.n1_tl, delta.n1_tl)?,
            n1_sl: apply(self.n1_sl, delta.n1_sl)?,
            n0: apply(self.n0, delta.n0)?,
        })
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N3: {} (N3_31: {}, N3_22: {}, N3_13: {}), N2: {}, N1: {} (N1_TL: {}, N1_SL: {}), N0: {}",
            self.n3,
            self.n3_31,
            self.n3_22,
            self.n3_13,
            self.n2,
            self.n1,
            self.n1_tl,
            self.n1_sl,
            self.n0
        )
    }
}

/// Signed difference between two [`Geometry`] snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeometryDelta {
    pub n3: i64,
    pub n3_31: i64,
    pub n3_22: i64,
    pub n3_13: i64,
    pub n2: i64,
    pub n1: i64,
    pub n1_tl: i64,
    pub n1_sl: i64,
    pub n0: i64,
}

impl GeometryDelta {
    pub fn between(before: &Geometry, after: &Geometry) -> Self {
        let d = |a: usize, b: usize| b as i64 - a as i64;
        Self {
            n3: d(before.n3, after.n3),
            n3_31: d(before.n3_31, after.n3_31),
            n3_22: d(before.n3_22, after.n3_22),
            n3_13: d(before.n3_13, after.n3_13),
            n2: d(before.n2, after.n2),
            n1: d(before.n1, after.n1),
            n1_tl: d(before.n1_tl, after.n1_tl),
            n1_sl: d(before.n1_sl, after.n1_sl),
            n0: d(before.n0, after.n0),
        }
    }

    pub fn n3_31_13(&self) -> i64 {
        self.n3_31 + self.n3_13
    }
}

impl Add for GeometryDelta {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            n3: self.n3 + rhs.n3,
            n3_31: self.n3_31 + rhs.n3_31,
            n3_22: self.n3_22 + rhs.n3_22,
            n3_13: self.n3_13 + rhs.n3_13,
            n2: self.n2 + rhs.n2,
            n1: self.n1 + rhs.n1,
            n1_tl: self.n1_tl + rhs.n1_tl,
            n1_sl: self.n1_sl + rhs.n1_sl,
            n0: self.n0 + rhs.n0,
        }
    }
}

impl Sub for GeometryDelta {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            n3: self.n3 - rhs.n3,
            n3_31: self.n3_31 - rhs.n3_31,
            n3_22: self.n3_22 - rhs.n3_22,
            n3_13: self.n3_13 - rhs.n3_13,
            n2: self.n2 - rhs.n2,
            n1: self.n1 - rhs.n1,
            n1_tl: self.n1_tl - rhs.n1_tl,
            n1_sl: self.n1_sl - rhs.n1_sl,
            n0: self.n0 - rhs.n0,
        }
    }
}
