/// A source term `g(t, x, y, u)` and its derivative with respect to `u`.
pub trait SourceTerm: Sync {
    fn value(&self, t: f64, x: f64, y: f64, u: f64) -> f64;

    fn derivative(&self, t: f64, x: f64, y: f64, u: f64) -> f64;
}

/// The source of the reference problems, identically zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ZeroSource;

impl SourceTerm for ZeroSource {
    fn value(&self, _t: f64, _x: f64, _y: f64, _u: f64) -> f64 {
        0.0
    }

    fn derivative(&self, _t: f64, _x: f64, _y: f64, _u: f64) -> f64 {
        0.0
    }
}

impl<S: SourceTerm + ?Sized> SourceTerm for &S {
    fn value(&self, t: f64, x: f64, y: f64, u: f64) -> f64 {
        S::value(self, t, x, y, u)
    }

    fn derivative(&self, t: f64, x: f64, y: f64, u: f64) -> f64 {
        S::derivative(self, t, x, y, u)
    }
}
