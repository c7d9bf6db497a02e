//! Tensor Gauss-Legendre rules on the reference square, selected by a validated degree.
use std::convert::TryFrom;
use std::fmt;

use gridflux_quadrature::tensor::quadrilateral_gauss;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::nalgebra::{convert, Point2, Scalar};
use crate::Real;

/// Number of Gauss points per dimension, restricted to `1`, `2` or `3`.
///
/// A rule of degree `n` integrates polynomials of degree up to `2 n - 1` in each variable
/// exactly. The restriction is checked when the degree is constructed, so every value of this
/// type has a tabulated rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct QuadratureDegree(usize);

impl QuadratureDegree {
    pub const MIN: usize = 1;
    pub const MAX: usize = gridflux_quadrature::MAX_POINTS_PER_DIM;

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for QuadratureDegree {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<usize> for QuadratureDegree {
    type Error = ConfigError;

    fn try_from(degree: usize) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&degree) {
            Ok(Self(degree))
        } else {
            Err(ConfigError::UnsupportedQuadratureDegree(degree))
        }
    }
}

impl From<QuadratureDegree> for usize {
    fn from(degree: QuadratureDegree) -> Self {
        degree.0
    }
}

impl fmt::Display for QuadratureDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tensor-product Gauss-Legendre rule on `[-1, 1]^2`.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorGaussRule<T: Scalar> {
    weights: Vec<T>,
    points: Vec<Point2<T>>,
}

impl<T: Real> TensorGaussRule<T> {
    pub fn new(degree: QuadratureDegree) -> Self {
        let (weights, points) =
            quadrilateral_gauss(degree.get()).expect("Every validated quadrature degree must have a rule");
        Self {
            weights: weights.into_iter().map(convert).collect(),
            points: points
                .into_iter()
                .map(|[x, y]| Point2::new(convert(x), convert(y)))
                .collect(),
        }
    }

    pub fn weights(&self) -> &[T] {
        &self.weights
    }

    pub fn points(&self) -> &[Point2<T>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterates over `(weight, point)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (T, &Point2<T>)> {
        self.weights.iter().copied().zip(&self.points)
    }

    /// Approximates the integral of `f` over the reference square.
    pub fn integrate(&self, f: impl Fn(&Point2<T>) -> T) -> T {
        self.iter().fold(T::zero(), |acc, (w, xi)| acc + w * f(xi))
    }
}
