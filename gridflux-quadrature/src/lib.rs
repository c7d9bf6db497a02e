//! Gauss-Legendre quadrature rules for the reference interval `[-1, 1]` and the reference
//! square `[-1, 1]^2`.
//!
//! Only the low-order rules needed by bilinear elements are tabulated: 1, 2 or 3 points per
//! dimension. The tables are process-wide constants, so rules are cheap to construct and can be
//! freely shared between threads.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod tensor;
pub mod univariate;

/// Largest number of points per dimension for which a rule is tabulated.
pub const MAX_POINTS_PER_DIM: usize = 3;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// No rule with the requested number of points per dimension is tabulated.
    UnsupportedDegree(usize),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedDegree(n) => {
                write!(
                    f,
                    "no Gauss-Legendre rule with {} points per dimension is available (supported: 1..={})",
                    n, MAX_POINTS_PER_DIM
                )
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A two-dimensional point.
pub type Point2 = Point<2>;

/// A D-dimensional rule, stored as `(weights, points)`.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A two-dimensional quadrature rule.
pub type Rule2d = Rule<2>;

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    assert_eq!(weights.len(), points.len(), "weights and points must have the same length");
    weights.iter().zip(points).map(|(w, x)| w * f(x)).sum()
}
