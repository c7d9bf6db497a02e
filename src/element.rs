//! The bilinear (Q1) reference element on `[-1, 1]^2` and element addressing on node grids.
use numeric_literals::replace_float_literals;

use crate::nalgebra::{Matrix1x4, Matrix2x4, Point2, Vector2, Vector4};
use crate::Real;

/// Reference coordinates `(xi_L, eta_L)` of the four local nodes.
///
/// Local node 0 is the top-right corner; the ordering proceeds counter-clockwise.
pub const REFERENCE_CORNERS: [[f64; 2]; 4] = [[1.0, 1.0], [-1.0, 1.0], [-1.0, -1.0], [1.0, -1.0]];

/// Grid offsets of the four local nodes relative to an element's anchor node.
///
/// Matches [`REFERENCE_CORNERS`]: the anchor `(i, j)` is local node 0 and the element spans
/// nodes `i - 1 ..= i` and `j - 1 ..= j`.
pub const NODE_OFFSETS: [[isize; 2]; 4] = [[0, 0], [-1, 0], [-1, -1], [0, -1]];

/// Bilinear shape functions on the reference square.
///
/// The shape function of local node `L` is
/// `chi_L(xi, eta) = (1 + xi_L xi) (1 + eta_L eta) / 4`,
/// where `(xi_L, eta_L)` are the corner signs in [`REFERENCE_CORNERS`]. All methods are exact for
/// bilinear fields.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Quad4Reference;

impl Quad4Reference {
    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn basis<T: Real>(&self, xi: &Point2<T>) -> Matrix1x4<T> {
        let phi = |alpha, beta, xi: &Point2<T>| (1.0 + alpha * xi[0]) * (1.0 + beta * xi[1]) / 4.0;
        Matrix1x4::new(
            phi( 1.0,  1.0, xi),
            phi(-1.0,  1.0, xi),
            phi(-1.0, -1.0, xi),
            phi( 1.0, -1.0, xi),
        )
    }

    /// Reference gradients of the shape functions, one column per local node.
    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn gradients<T: Real>(&self, xi: &Point2<T>) -> Matrix2x4<T> {
        let phi_grad = |alpha, beta, xi: &Point2<T>|
            Vector2::new(
                alpha * (1.0 + beta * xi[1]) / 4.0,
                beta * (1.0 + alpha * xi[0]) / 4.0,
            );

        Matrix2x4::from_columns(&[
            phi_grad( 1.0,  1.0, xi),
            phi_grad(-1.0,  1.0, xi),
            phi_grad(-1.0, -1.0, xi),
            phi_grad( 1.0, -1.0, xi),
        ])
    }

    /// Evaluates the bilinear interpolant `sum_L v_L chi_L(xi)` of the nodal values.
    pub fn eval<T: Real>(&self, nodal_values: &Vector4<T>, xi: &Point2<T>) -> T {
        self.basis(xi).dot(&nodal_values.transpose())
    }

    /// Evaluates the reference gradient `sum_L v_L grad chi_L(xi)` of the interpolant.
    pub fn grad_eval<T: Real>(&self, nodal_values: &Vector4<T>, xi: &Point2<T>) -> Vector2<T> {
        self.gradients(xi) * nodal_values
    }
}

/// An element of a node grid, identified by its anchor (top-right) node.
///
/// Elements own no data; their corner nodes are derived from the anchor with
/// [`NODE_OFFSETS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementIndex {
    pub i: isize,
    pub j: isize,
}

impl ElementIndex {
    pub fn new(i: isize, j: isize) -> Self {
        Self { i, j }
    }

    /// Grid indices of the four corner nodes in local node order.
    pub fn nodes(&self) -> [(isize, isize); 4] {
        NODE_OFFSETS.map(|[di, dj]| (self.i + di, self.j + dj))
    }

    /// The corner node with the smallest indices.
    pub fn lower_left(&self) -> (isize, isize) {
        (self.i - 1, self.j - 1)
    }
}
