use std::convert::TryFrom;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::{require_finite, ConfigError, Validate};
use crate::quadrature::QuadratureDegree;

/// Parameters of the p-Laplacian problem.
///
/// Defaults are `p = 4`, `eps = 0`, `alpha = 1` and two Gauss points per dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PLaplaceParameters {
    /// Exponent `p >= 1`.
    pub p: f64,
    /// Regularization of the gradient norm. With `p < 2`, `eps = 0` is legal but the gradient
    /// of the energy is singular wherever the discrete gradient vanishes.
    pub eps: f64,
    /// Shape parameter of the manufactured solution.
    pub alpha: f64,
    pub quadrature_degree: QuadratureDegree,
}

impl Default for PLaplaceParameters {
    fn default() -> Self {
        Self {
            p: 4.0,
            eps: 0.0,
            alpha: 1.0,
            quadrature_degree: QuadratureDegree::default(),
        }
    }
}

impl PLaplaceParameters {
    /// Builds and validates a parameter set.
    pub fn new(p: f64, eps: f64, alpha: f64, quadrature_degree: usize) -> Result<Self, ConfigError> {
        let parameters = Self {
            p,
            eps,
            alpha,
            quadrature_degree: QuadratureDegree::try_from(quadrature_degree)?,
        };
        parameters.validate()?;
        Ok(parameters)
    }
}

impl Validate for PLaplaceParameters {
    fn validate(&self) -> Result<(), ConfigError> {
        // Written to also reject NaN
        if !(self.p >= 1.0) {
            return Err(ConfigError::InvalidExponent(self.p));
        }
        require_finite("p", self.p)?;
        require_finite("eps", self.eps)?;
        require_finite("alpha", self.alpha)?;
        if self.eps == 0.0 && self.p < 2.0 {
            warn!(
                "p = {} < 2 with eps = 0: the energy gradient is singular where the discrete gradient vanishes",
                self.p
            );
        }
        Ok(())
    }
}
