use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::Real;

/// Flux limiters `phi(theta)`, where `theta` is the ratio of consecutive differences
/// `(u_up - u_far) / (u_down - u_up)` along the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Limiter {
    /// No correction: the flux is first-order upwind.
    None,
    /// The constant `1/2`, i.e. the second-order central flux. Not TVD.
    Centered,
    /// van Leer (1974): `(theta + |theta|) / (2 (1 + |theta|))`.
    VanLeer,
    /// Koren (1993): `max(0, min(1, 1/3 + theta/6, theta))`.
    Koren,
}

impl Default for Limiter {
    fn default() -> Self {
        Self::VanLeer
    }
}

impl Limiter {
    pub const ALL: [Limiter; 4] = [Self::None, Self::Centered, Self::VanLeer, Self::Koren];

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Centered => "centered",
            Self::VanLeer => "vanleer",
            Self::Koren => "koren",
        }
    }

    /// Whether the limiter adds a correction to the upwind flux at all.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Evaluates `phi(theta)`. [`Limiter::None`] evaluates to zero.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn evaluate<T: Real>(&self, theta: T) -> T {
        match self {
            Self::None => 0.0,
            Self::Centered => 0.5,
            Self::VanLeer => 0.5 * (theta + theta.abs()) / (1.0 + theta.abs()),
            Self::Koren => {
                let z = 1.0 / 3.0 + theta / 6.0;
                T::zero().max(T::one().min(z.min(theta)))
            }
        }
    }
}

impl FromStr for Limiter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|limiter| limiter.name() == s)
            .ok_or_else(|| ConfigError::UnknownLimiter(s.to_string()))
    }
}

impl TryFrom<String> for Limiter {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Limiter> for String {
    fn from(limiter: Limiter) -> Self {
        limiter.name().to_string()
    }
}

impl fmt::Display for Limiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
