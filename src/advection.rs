//! Flux-limited finite volumes for scalar advection on the periodic square `(-1, 1)^2`.
//!
//! The conservation law is `u_t + div(a(x, y) u) = g(x, y, u)`. The grid has `mx x my` cells of
//! size `hx = 2 / mx` by `hy = 2 / my`, and cell `(i, j)` is centered at
//! `(-1 + (i + 1/2) hx, -1 + (j + 1/2) hy)`. The method-of-lines semi-discretization is
//!
//! ```text
//! G_ij = -(F_E - F_W) / hx - (F_N - F_S) / hy + g(x_i, y_j, u_ij),
//! ```
//!
//! where each face flux is the first-order upwind flux plus a limited correction
//! (see [`face_flux`]). Only east and north fluxes are computed, each exactly once, and applied
//! with opposite signs to the two cells sharing the face, so the scheme is conservative.
mod flux;
mod initial;
mod limiter;
mod model;
mod parameters;
mod source;

pub use flux::*;
pub use initial::*;
pub use limiter::*;
pub use model::*;
pub use parameters::*;
pub use source::*;
