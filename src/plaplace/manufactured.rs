//! A manufactured solution of the p-Laplacian on the unit square.
//!
//! The exact solution `g(x, y) = (x + alpha)^2 (y + alpha)^2 / 2` doubles as Dirichlet boundary
//! data. The forcing is derived in closed form so that `g` solves
//! `-div(|grad u|^(p - 2) grad u) = f` exactly (for `eps = 0`).
use nalgebra::DVector;

use crate::grid::{GhostedField, Subdomain};
use crate::plaplace::{PLaplaceProblem, HALO_WIDTH};

/// The manufactured solution `g(x, y) = 0.5 (x + alpha)^2 (y + alpha)^2`.
pub fn boundary_value(x: f64, y: f64, alpha: f64) -> f64 {
    0.5 * (x + alpha).powi(2) * (y + alpha).powi(2)
}

/// The forcing `f = -div(|grad g|^(p - 2) grad g)` that makes [`boundary_value`] exact.
pub fn forcing(x: f64, y: f64, p: f64, alpha: f64) -> f64 {
    let (xa, ya) = (x + alpha, y + alpha);
    let xx = xa * xa;
    let yy = ya * ya;
    let d2 = xx + yy;
    let c = (xx * yy * d2).powf((p - 2.0) / 2.0);
    let gamma1 = 1.0 / xa + xa / d2;
    let gamma2 = 1.0 / ya + ya / d2;
    -(p - 2.0) * c * (gamma1 * xa * yy + gamma2 * xx * ya) - c * d2
}

/// Dirichlet data on a subdomain plus one halo layer.
///
/// Entries at interior grid nodes are NaN, so that reading boundary data at an interior node
/// poisons the result instead of silently succeeding.
pub fn boundary_field(problem: &PLaplaceProblem, subdomain: Subdomain) -> GhostedField<f64> {
    let alpha = problem.parameters().alpha;
    GhostedField::from_fn(subdomain, HALO_WIDTH, |i, j| {
        if problem.is_boundary_node(i, j) {
            let x = problem.node_coordinates(i, j);
            boundary_value(x.x, x.y, alpha)
        } else {
            f64::NAN
        }
    })
}

/// The manufactured forcing at every node of a subdomain plus one halo layer, boundary nodes
/// included.
pub fn forcing_field(problem: &PLaplaceProblem, subdomain: Subdomain) -> GhostedField<f64> {
    let parameters = problem.parameters();
    GhostedField::from_fn(subdomain, HALO_WIDTH, |i, j| {
        let x = problem.node_coordinates(i, j);
        forcing(x.x, x.y, parameters.p, parameters.alpha)
    })
}

/// The initial iterate `u0 = (1 - x) g(0, y) + x g(1, y)`, linear in `x` between the left and
/// right boundary data, as a global vector over the interior nodes.
pub fn initial_iterate(problem: &PLaplaceProblem) -> DVector<f64> {
    let alpha = problem.parameters().alpha;
    node_vector(problem, |x, y| {
        (1.0 - x) * boundary_value(0.0, y, alpha) + x * boundary_value(1.0, y, alpha)
    })
}

/// The manufactured solution sampled at the interior nodes.
pub fn exact_solution(problem: &PLaplaceProblem) -> DVector<f64> {
    let alpha = problem.parameters().alpha;
    node_vector(problem, |x, y| boundary_value(x, y, alpha))
}

fn node_vector(problem: &PLaplaceProblem, f: impl Fn(f64, f64) -> f64) -> DVector<f64> {
    let grid = problem.grid();
    DVector::from_fn(grid.num_points(), |k, _| {
        let (i, j) = (k % grid.mx(), k / grid.mx());
        let x = problem.node_coordinates(i as isize, j as isize);
        f(x.x, x.y)
    })
}
