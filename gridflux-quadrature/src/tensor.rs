//! 2D quadrature rules formed as tensor products of 1D rules.

use crate::univariate::gauss_legendre;
use crate::{Error, Point2, Rule2d};

/// A Gauss-Legendre rule for the reference quadrilateral `[-1, 1]^2`.
///
/// The rule is the tensor product of the 1D rule with `num_points_per_dim` points, so it
/// integrates exactly every monomial `x^a y^b` with `a, b <= 2 n - 1`. Points are ordered
/// with the second coordinate varying fastest.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> Result<Rule2d, Error> {
    let (weights1d, points1d) = gauss_legendre(num_points_per_dim)?;
    let n = weights1d.len();
    let mut weights2d = Vec::with_capacity(n * n);
    let mut points2d: Vec<Point2> = Vec::with_capacity(n * n);

    for (&wx, &[x]) in weights1d.iter().zip(&points1d) {
        for (&wy, &[y]) in weights1d.iter().zip(&points1d) {
            weights2d.push(wx * wy);
            points2d.push([x, y]);
        }
    }

    Ok((weights2d, points2d))
}
