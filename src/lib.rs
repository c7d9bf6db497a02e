//! Discretization kernels for PDEs on structured quadrilateral grids.
//!
//! Two independent pipelines share the grid and halo-field abstractions in [`grid`]:
//!
//! - [`plaplace`]: the energy objective of the p-Laplacian equation, discretized with bilinear
//!   (Q1) elements and tensor Gauss-Legendre quadrature, together with its gradient and Hessian.
//! - [`advection`]: the flux-limited finite-volume right-hand side of a scalar conservation law
//!   `u_t + div(a u) = g(x, y, u)` on a periodic grid, and the Jacobian of its unlimited
//!   first-order upwind counterpart.
//!
//! Solving the resulting systems is left to the caller. The kernels only read halo-padded
//! fields and produce scalars, rate fields or sparse matrices.
use nalgebra::RealField;

pub mod advection;
pub mod comm;
pub mod config;
pub mod element;
pub mod grid;
pub mod plaplace;
pub mod quadrature;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// Real scalar type accepted by the generic numerical kernels.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
