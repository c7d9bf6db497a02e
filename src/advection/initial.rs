use crate::advection::ProblemKind;

/// The initial profile of a reference problem at position `(x, y)`.
///
/// - [`ProblemKind::Rotation`]: a unit box on `0.1 < x < 0.6`, `-0.25 < y < 0.25` next to a cone
///   of radius `0.35` and height one centered at `(-0.45, 0)`.
/// - [`ProblemKind::Straight`]: a unit disk of radius `0.2` centered at `(-0.6, -0.6)`.
///
/// Zero elsewhere.
pub fn initial_state(problem: ProblemKind, x: f64, y: f64) -> f64 {
    match problem {
        ProblemKind::Straight => {
            let r = ((x + 0.6).powi(2) + (y + 0.6).powi(2)).sqrt();
            if r < 0.2 {
                1.0
            } else {
                0.0
            }
        }
        ProblemKind::Rotation => {
            let r = ((x + 0.45).powi(2) + y * y).sqrt();
            if 0.1 < x && x < 0.6 && -0.25 < y && y < 0.25 {
                1.0
            } else if r < 0.35 {
                1.0 - r / 0.35
            } else {
                0.0
            }
        }
    }
}
