use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut, RealField, Scalar};
use numeric_literals::replace_float_literals;
use std::error::Error;

/// A map `R^n -> R^n` that writes its value into a caller-owned buffer.
pub trait VectorFunction<T: Scalar> {
    fn dimension(&self) -> usize;
    fn eval_into(&mut self, f: &mut DVectorViewMut<T>, x: &DVectorView<T>);
}

/// A [`VectorFunction`] that can solve its linearized system `J(x) sol = rhs`.
pub trait DifferentiableVectorFunction<T: Scalar>: VectorFunction<T> {
    fn solve_jacobian_system(
        &mut self,
        sol: &mut DVectorViewMut<T>,
        x: &DVectorView<T>,
        rhs: &DVectorView<T>,
    ) -> Result<(), Box<dyn Error>>;
}

impl<T: Scalar, X: VectorFunction<T>> VectorFunction<T> for &mut X {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn eval_into(&mut self, f: &mut DVectorViewMut<T>, x: &DVectorView<T>) {
        (**self).eval_into(f, x)
    }
}

impl<T: Scalar, X: DifferentiableVectorFunction<T>> DifferentiableVectorFunction<T> for &mut X {
    fn solve_jacobian_system(
        &mut self,
        sol: &mut DVectorViewMut<T>,
        x: &DVectorView<T>,
        rhs: &DVectorView<T>,
    ) -> Result<(), Box<dyn Error>> {
        (**self).solve_jacobian_system(sol, x, rhs)
    }
}

/// Evaluates `eval` with `x[k]` perturbed by `+h` and `-h`, then restores `x[k]`.
fn central_difference<T, R>(
    x: &mut DVector<T>,
    k: usize,
    h: T,
    mut eval: impl FnMut(&DVector<T>) -> R,
) -> (R, R)
where
    T: RealField + Copy,
{
    let x_k = x[k];
    x[k] = x_k + h;
    let plus = eval(&*x);
    x[k] = x_k - h;
    let minus = eval(&*x);
    x[k] = x_k;
    (plus, minus)
}

/// Central-difference gradient of a scalar function at `x` with step `h`.
///
/// `x` is perturbed in place and restored before returning.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn approximate_gradient_fd<T>(mut f: impl FnMut(DVectorView<T>) -> T, x: &mut DVector<T>, h: T) -> DVector<T>
where
    T: RealField + Copy,
{
    DVector::from_iterator(
        x.len(),
        (0..x.len()).map(|k| {
            let (plus, minus) = central_difference(x, k, h, |x| f(DVectorView::from(x)));
            (plus - minus) / (2.0 * h)
        }),
    )
}

/// Central-difference `m x n` Jacobian of `f: R^n -> R^m` at `x` with step `h`.
///
/// `f` writes its value into the second argument. `x` is perturbed in place and restored before
/// returning.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn approximate_jacobian_fd<T>(
    m: usize,
    mut f: impl FnMut(DVectorView<T>, DVectorViewMut<T>),
    x: &mut DVector<T>,
    h: T,
) -> DMatrix<T>
where
    T: RealField + Copy,
{
    let n = x.len();
    let mut jacobian = DMatrix::zeros(m, n);
    for k in 0..n {
        let (plus, minus) = central_difference(x, k, h, |x| {
            let mut value = DVector::zeros(m);
            f(DVectorView::from(x), DVectorViewMut::from(&mut value));
            value
        });
        jacobian.set_column(k, &((plus - minus) / (2.0 * h)));
    }
    jacobian
}
