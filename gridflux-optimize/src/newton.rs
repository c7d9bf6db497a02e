use crate::calculus::DifferentiableVectorFunction;
use log::{debug, info};
use nalgebra::{DVector, DVectorView, DVectorViewMut, RealField};
use numeric_literals::replace_float_literals;
use std::error::Error;
use std::fmt;

/// How far along the Newton direction each iteration moves.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum StepControl<T> {
    /// Always take the full step.
    Full,
    /// Halve the step until the Armijo condition on `|F|^2 / 2` holds.
    Backtracking { sufficient_decrease: T, min_step: T },
}

#[derive(Debug)]
pub enum NewtonError {
    NotConverged { iterations: usize },
    JacobianSolve(Box<dyn Error>),
    /// Backtracking shrank the step below its lower bound without sufficient decrease.
    StepTooShort { iteration: usize },
}

impl fmt::Display for NewtonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConverged { iterations } => write!(f, "no convergence after {} Newton iterations", iterations),
            Self::JacobianSolve(err) => write!(f, "Jacobian solve failed: {}", err),
            Self::StepTooShort { iteration } => {
                write!(f, "backtracking found no acceptable step in Newton iteration {}", iteration)
            }
        }
    }
}

impl Error for NewtonError {}

/// Outcome of a converged Newton solve.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NewtonReport<T> {
    pub iterations: usize,
    pub initial_residual: T,
    pub final_residual: T,
}

/// Newton's method for `F(x) = 0`.
///
/// The iteration stops once `|F(x)|_2 <= max(absolute_tolerance, relative_tolerance |F(x0)|_2)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NewtonSolver<T> {
    max_iterations: usize,
    absolute_tolerance: T,
    relative_tolerance: T,
    step_control: StepControl<T>,
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: RealField + Copy> Default for NewtonSolver<T> {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            absolute_tolerance: 0.0,
            relative_tolerance: 1e-10,
            step_control: StepControl::Full,
        }
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: RealField + Copy> NewtonSolver<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self { max_iterations, ..self }
    }

    pub fn with_absolute_tolerance(self, absolute_tolerance: T) -> Self {
        Self {
            absolute_tolerance,
            ..self
        }
    }

    pub fn with_relative_tolerance(self, relative_tolerance: T) -> Self {
        Self {
            relative_tolerance,
            ..self
        }
    }

    /// Backtracking with Armijo constant `1e-4` and smallest step `1e-8`.
    pub fn with_backtracking(self) -> Self {
        self.with_step_control(StepControl::Backtracking {
            sufficient_decrease: 1e-4,
            min_step: 1e-8,
        })
    }

    pub fn with_step_control(self, step_control: StepControl<T>) -> Self {
        Self { step_control, ..self }
    }

    /// Iterates from the initial guess in `x` and leaves the final iterate there.
    pub fn solve<F>(&self, mut function: F, x: &mut DVector<T>) -> Result<NewtonReport<T>, NewtonError>
    where
        F: DifferentiableVectorFunction<T>,
    {
        let n = function.dimension();
        assert_eq!(x.len(), n, "initial guess does not match function dimension");

        let mut residual = DVector::zeros(n);
        let mut direction = DVector::zeros(n);
        let mut trial = DVector::zeros(n);
        let mut trial_residual = DVector::zeros(n);

        evaluate(&mut function, &mut residual, x);
        let initial_residual = residual.norm();
        let tolerance = self.absolute_tolerance.max(self.relative_tolerance * initial_residual);

        let mut iterations = 0;
        let mut residual_norm = initial_residual;
        while residual_norm > tolerance {
            if iterations == self.max_iterations {
                return Err(NewtonError::NotConverged { iterations });
            }
            iterations += 1;

            function
                .solve_jacobian_system(
                    &mut DVectorViewMut::from(&mut direction),
                    &DVectorView::from(&*x),
                    &DVectorView::from(&residual),
                )
                .map_err(NewtonError::JacobianSolve)?;

            // J d = F, so the Newton step is -d
            let mut step = 1.0;
            loop {
                trial.copy_from(&*x);
                trial.axpy(-step, &direction, 1.0);
                evaluate(&mut function, &mut trial_residual, &trial);
                let trial_norm = trial_residual.norm();

                let accepted = match self.step_control {
                    StepControl::Full => true,
                    // For the exact Newton direction, the merit function decreases at rate
                    // -|F|^2, so sufficient decrease reads |F_new|^2 <= (1 - 2 c step) |F|^2
                    StepControl::Backtracking {
                        sufficient_decrease,
                        ..
                    } => {
                        let decrease = 1.0 - 2.0 * sufficient_decrease * step;
                        trial_norm * trial_norm <= decrease * residual_norm * residual_norm
                    }
                };

                if accepted {
                    std::mem::swap(x, &mut trial);
                    std::mem::swap(&mut residual, &mut trial_residual);
                    residual_norm = trial_norm;
                    break;
                }
                if let StepControl::Backtracking { min_step, .. } = self.step_control {
                    if step < min_step {
                        return Err(NewtonError::StepTooShort { iteration: iterations });
                    }
                }
                step *= 0.5;
            }
            debug!("Newton iteration {}: step {}, |F| = {}", iterations, step, residual_norm);
        }

        info!(
            "Newton converged in {} iterations, |F| reduced from {} to {}",
            iterations, initial_residual, residual_norm
        );
        Ok(NewtonReport {
            iterations,
            initial_residual,
            final_residual: residual_norm,
        })
    }
}

fn evaluate<T, F>(function: &mut F, residual: &mut DVector<T>, x: &DVector<T>)
where
    T: RealField + Copy,
    F: DifferentiableVectorFunction<T>,
{
    function.eval_into(&mut DVectorViewMut::from(residual), &DVectorView::from(x));
}
