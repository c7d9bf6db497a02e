use crate::advection::Limiter;
use crate::Real;

/// The numerical flux through one face, given the wind speed `a` normal to the face and the
/// upwind, downwind and far-upwind cell values.
///
/// The flux is `a u_up`, plus the limited correction `a phi(theta) (u_down - u_up)` with
/// `theta = (u_up - u_far) / (u_down - u_up)`. The correction is skipped when the limiter is
/// inactive or when `u_down == u_up`, in which case the flux is pure upwind.
pub fn face_flux<T: Real>(a: T, up: T, down: T, far: T, limiter: Limiter) -> T {
    let mut flux = a * up;
    if limiter.is_active() && down != up {
        let theta = (up - far) / (down - up);
        flux += a * limiter.evaluate(theta) * (down - up);
    }
    flux
}

/// The four cell values along the axis normal to a face, ordered in the direction of the face
/// normal. The face lies between `left` and `right`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceStencil<T> {
    pub far_left: T,
    pub left: T,
    pub right: T,
    pub far_right: T,
}

impl<T: Real> FaceStencil<T> {
    pub fn new(far_left: T, left: T, right: T, far_right: T) -> Self {
        Self {
            far_left,
            left,
            right,
            far_right,
        }
    }

    /// Selects `(up, down, far)` for a wind of speed `a` normal to the face: for `a >= 0` the
    /// flow comes from the left, otherwise from the right.
    pub fn orient(&self, a: T) -> (T, T, T) {
        if a >= T::zero() {
            (self.left, self.right, self.far_left)
        } else {
            (self.right, self.left, self.far_right)
        }
    }

    /// The limited flux through the face.
    pub fn flux(&self, a: T, limiter: Limiter) -> T {
        let (up, down, far) = self.orient(a);
        face_flux(a, up, down, far, limiter)
    }
}
