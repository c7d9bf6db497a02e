//! The p-Laplacian energy objective on a Q1 finite element discretization of the unit square.
//!
//! The grid has `mx x my` interior nodes; node `(i, j)` sits at `(hx (i + 1), hy (j + 1))` with
//! `hx = 1 / (mx + 1)` and `hy = 1 / (my + 1)`. Nodes with index `-1`, `mx` (or `my`) lie on the
//! boundary of the unit square and carry Dirichlet data. The discrete energy is
//!
//! ```text
//! I(u) = sum_K int_K (|grad u|^2 + eps^2)^(p / 2) / p - f u dx,
//! ```
//!
//! whose minimizer approximates the solution of `-div(|grad u|^(p - 2) grad u) = f`.
mod energy;
mod objective;
mod parameters;

pub mod manufactured;

pub use energy::*;
pub use objective::*;
pub use parameters::*;
