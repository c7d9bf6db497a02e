//! Verification tooling for `gridflux`.
//!
//! None of this is used by the discretization kernels. It exists so that analytic derivatives
//! can be checked against finite differences and so that discrete problems can be driven to
//! convergence in end-to-end tests.

/// Numerical differentiation and vector function traits
pub mod calculus;
/// Newton iterations with optional backtracking line search
pub mod newton;
