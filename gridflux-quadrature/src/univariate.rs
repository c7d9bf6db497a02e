//! Quadrature rules for the one-dimensional domain `[-1, 1]`.

use crate::{Error, Rule, MAX_POINTS_PER_DIM};

// Abscissas and weights, indexed by (number of points - 1). Unused slots are zero.
const GAUSS_POINTS: [[f64; MAX_POINTS_PER_DIM]; MAX_POINTS_PER_DIM] = [
    [0.0, 0.0, 0.0],
    [-0.5773502691896257, 0.5773502691896257, 0.0],
    [-0.7745966692414834, 0.0, 0.7745966692414834],
];

const GAUSS_WEIGHTS: [[f64; MAX_POINTS_PER_DIM]; MAX_POINTS_PER_DIM] = [
    [2.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.5555555555555556, 0.8888888888888888, 0.5555555555555556],
];

/// Gauss-Legendre quadrature for the reference interval `[-1, 1]`.
///
/// Given `n` points, the rule integrates polynomials of degree up to `2 n - 1` exactly.
/// Points are returned in increasing order.
///
/// Returns [`Error::UnsupportedDegree`] unless `1 <= n <= 3`.
pub fn gauss_legendre(num_points: usize) -> Result<Rule<1>, Error> {
    if !(1..=MAX_POINTS_PER_DIM).contains(&num_points) {
        return Err(Error::UnsupportedDegree(num_points));
    }
    let idx = num_points - 1;
    let weights = GAUSS_WEIGHTS[idx][..num_points].to_vec();
    let points = GAUSS_POINTS[idx][..num_points].iter().map(|&x| [x]).collect();
    Ok((weights, points))
}
