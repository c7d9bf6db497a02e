//! Configuration errors and loading of parameter sets.
//!
//! Parameter sets are validated once, when a problem is constructed from them. Every failure
//! here is fatal for the discretization: nothing is computed with a parameter set that did not
//! validate.
use std::fmt;
use std::fs;
use std::path::Path;

use eyre::WrapErr;
use serde::de::DeserializeOwned;

/// A rejected configuration.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The p-Laplacian exponent must satisfy `p >= 1`.
    InvalidExponent(f64),
    /// Only 1, 2 or 3 Gauss points per dimension are supported.
    UnsupportedQuadratureDegree(usize),
    /// A named limiter that does not exist.
    UnknownLimiter(String),
    /// A named advection problem that does not exist.
    UnknownProblem(String),
    /// A parameter that must be a finite number was not.
    NonFiniteParameter { name: &'static str, value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidExponent(p) => write!(f, "exponent p = {} is invalid, p >= 1 is required", p),
            Self::UnsupportedQuadratureDegree(n) => {
                write!(f, "quadrature degree n = {} is unsupported, n = 1, 2, 3 only", n)
            }
            Self::UnknownLimiter(name) => write!(
                f,
                "unknown limiter '{}', expected one of: none, centered, vanleer, koren",
                name
            ),
            Self::UnknownProblem(name) => {
                write!(f, "unknown problem '{}', expected one of: rotation, straight", name)
            }
            Self::NonFiniteParameter { name, value } => {
                write!(f, "parameter {} = {} must be finite", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parameter sets that can be checked before any discretization runs.
pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

pub(crate) fn require_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFiniteParameter { name, value })
    }
}

/// Parses and validates a parameter set from a JSON string.
///
/// Missing fields take their defaults.
pub fn parse_parameters_from_json<P>(json: &str) -> eyre::Result<P>
where
    P: DeserializeOwned + Validate,
{
    let parameters: P = serde_json::from_str(json).wrap_err("failed to parse parameters")?;
    parameters.validate().wrap_err("invalid parameters")?;
    Ok(parameters)
}

/// Reads, parses and validates a parameter set from a JSON file.
pub fn load_parameters_from_json<P>(path: impl AsRef<Path>) -> eyre::Result<P>
where
    P: DeserializeOwned + Validate,
{
    let path = path.as_ref();
    let json = fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))?;
    parse_parameters_from_json(&json).wrap_err_with(|| format!("in parameter file {}", path.display()))
}
