use numeric_literals::replace_float_literals;

use crate::element::Quad4Reference;
use crate::nalgebra::{convert, Matrix2x4, Matrix4, Point2, Vector2, Vector4};
use crate::quadrature::{QuadratureDegree, TensorGaussRule};
use crate::Real;

/// The affine map from the reference square `[-1, 1]^2` to one `hx x hy` element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementGeometry<T> {
    pub hx: T,
    pub hy: T,
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: Real> ElementGeometry<T> {
    pub fn new(hx: T, hy: T) -> Self {
        Self { hx, hy }
    }

    /// Chain-rule factors `(cx, cy) = (4 / hx^2, 4 / hy^2)`, so that
    /// `|grad u|^2 = cx (du/dxi)^2 + cy (du/deta)^2`.
    pub fn gradient_factors(&self) -> Vector2<T> {
        Vector2::new(4.0 / (self.hx * self.hx), 4.0 / (self.hy * self.hy))
    }

    /// Determinant of the reference-to-physical map, `hx hy / 4`.
    pub fn jacobian_determinant(&self) -> T {
        0.25 * self.hx * self.hy
    }
}

/// Quantities at one quadrature point that the energy, gradient and Hessian share.
struct PointState<T: Real> {
    weight: T,
    basis: Vector4<T>,
    gradients: Matrix2x4<T>,
    // (cx du/dxi, cy du/deta)
    scaled_gradient: Vector2<T>,
    grad_sq: T,
}

/// The p-Laplacian energy of a single bilinear element.
///
/// Nodal values are passed in local node order (see [`crate::element::REFERENCE_CORNERS`]).
/// The quadrature-point integrand is
///
/// ```text
/// W(xi) = (|grad u|^2 + eps^2)^(p / 2) / p - f(xi) u(xi),
/// ```
///
/// where `f` is the bilinear interpolant of the nodal forcing.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementEnergyKernel<T: Real> {
    p: T,
    eps: T,
    geometry: ElementGeometry<T>,
    rule: TensorGaussRule<T>,
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: Real> ElementEnergyKernel<T> {
    pub fn new(p: T, eps: T, geometry: ElementGeometry<T>, degree: QuadratureDegree) -> Self {
        Self {
            p,
            eps,
            geometry,
            rule: TensorGaussRule::new(degree),
        }
    }

    /// Convenience constructor from `f64` parameters.
    pub fn from_f64(p: f64, eps: f64, hx: f64, hy: f64, degree: QuadratureDegree) -> Self {
        Self::new(
            convert(p),
            convert(eps),
            ElementGeometry::new(convert(hx), convert(hy)),
            degree,
        )
    }

    pub fn geometry(&self) -> &ElementGeometry<T> {
        &self.geometry
    }

    pub fn rule(&self) -> &TensorGaussRule<T> {
        &self.rule
    }

    /// The energy density at a point where the reference gradient of `u` is `du_ref` and the
    /// interpolated forcing and state are `f` and `u`.
    pub fn energy_density(&self, du_ref: &Vector2<T>, f: T, u: T) -> T {
        let c = self.geometry.gradient_factors();
        let grad_sq = c.x * du_ref.x * du_ref.x + c.y * du_ref.y * du_ref.y;
        (grad_sq + self.eps * self.eps).powf(self.p / 2.0) / self.p - f * u
    }

    fn point_states<'a>(&'a self, u: &'a Vector4<T>) -> impl Iterator<Item = PointState<T>> + 'a {
        let reference = Quad4Reference;
        let c = self.geometry.gradient_factors();
        self.rule.iter().map(move |(weight, xi)| {
            let gradients = reference.gradients(xi);
            let du = gradients * u;
            PointState {
                weight,
                basis: reference.basis(xi).transpose(),
                gradients,
                scaled_gradient: c.component_mul(&du),
                grad_sq: c.x * du.x * du.x + c.y * du.y * du.y,
            }
        })
    }

    /// Integrates the energy density over the element.
    pub fn element_energy(&self, f: &Vector4<T>, u: &Vector4<T>) -> T {
        let reference = Quad4Reference;
        let integral = self.rule.integrate(|xi: &Point2<T>| {
            let du = reference.grad_eval(u, xi);
            self.energy_density(&du, reference.eval(f, xi), reference.eval(u, xi))
        });
        self.geometry.jacobian_determinant() * integral
    }

    /// Derivative of [`element_energy`](Self::element_energy) with respect to the four nodal
    /// values of `u`.
    ///
    /// At a quadrature point with vanishing gradient and `eps = 0`, the flux term is taken to be
    /// zero, its limit for `p > 1`.
    pub fn element_gradient(&self, f: &Vector4<T>, u: &Vector4<T>) -> Vector4<T> {
        let eps_sq = self.eps * self.eps;
        let mut gradient = Vector4::zeros();
        for state in self.point_states(u) {
            let base = state.grad_sq + eps_sq;
            let f_xi = state.basis.dot(f);
            if base > 0.0 {
                let s = base.powf(self.p / 2.0 - 1.0);
                gradient += (state.gradients.transpose() * state.scaled_gradient) * (state.weight * s);
            }
            gradient -= &state.basis * (state.weight * f_xi);
        }
        gradient * self.geometry.jacobian_determinant()
    }

    /// Second derivative of [`element_energy`](Self::element_energy) with respect to the nodal
    /// values of `u`. The forcing term is linear in `u` and does not contribute.
    ///
    /// Terms that are singular at a vanishing gradient (`eps = 0` with `p < 2` or `p < 4`) are
    /// omitted at such points.
    pub fn element_hessian(&self, u: &Vector4<T>) -> Matrix4<T> {
        let eps_sq = self.eps * self.eps;
        let c = self.geometry.gradient_factors();
        let mut hessian = Matrix4::zeros();
        for state in self.point_states(u) {
            let base = state.grad_sq + eps_sq;
            let g = &state.gradients;
            let mut scaled = *g;
            scaled.row_mut(0).scale_mut(c.x);
            scaled.row_mut(1).scale_mut(c.y);
            let stiffness = g.transpose() * scaled;

            if base > 0.0 {
                let s = base.powf(self.p / 2.0 - 1.0);
                let a = g.transpose() * state.scaled_gradient;
                let t = (self.p - 2.0) * base.powf(self.p / 2.0 - 2.0);
                hessian += stiffness * (state.weight * s) + (a * a.transpose()) * (state.weight * t);
            } else if self.p >= 2.0 {
                // Only the p = 2 term survives at base = 0
                let s = if self.p == 2.0 { 1.0 } else { 0.0 };
                hessian += stiffness * (state.weight * s);
            }
        }
        hessian * self.geometry.jacobian_determinant()
    }
}
