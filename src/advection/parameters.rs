use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::advection::Limiter;
use crate::config::{require_finite, ConfigError, Validate};

/// The two reference problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProblemKind {
    /// Solid-body rotation with wind `a = (2 y, -2 x)`; one revolution takes time `pi`.
    Rotation,
    /// Constant wind `a = (windx, windy)`.
    Straight,
}

impl Default for ProblemKind {
    fn default() -> Self {
        Self::Straight
    }
}

impl ProblemKind {
    pub const ALL: [ProblemKind; 2] = [Self::Rotation, Self::Straight];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rotation => "rotation",
            Self::Straight => "straight",
        }
    }
}

impl FromStr for ProblemKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|problem| problem.name() == s)
            .ok_or_else(|| ConfigError::UnknownProblem(s.to_string()))
    }
}

impl TryFrom<String> for ProblemKind {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ProblemKind> for String {
    fn from(problem: ProblemKind) -> Self {
        problem.name().to_string()
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Orientation of a cell face. Only east and north faces are stored; the west and south faces of
/// a cell are the east and north faces of its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceDirection {
    /// Normal in `+x`; the wind component is `a^x`.
    East,
    /// Normal in `+y`; the wind component is `a^y`.
    North,
}

impl FaceDirection {
    pub const ALL: [FaceDirection; 2] = [Self::East, Self::North];

    /// Index offset `(di, dj)` from a cell to its neighbour across the face.
    pub fn offset(&self) -> (isize, isize) {
        match self {
            Self::East => (1, 0),
            Self::North => (0, 1),
        }
    }
}

/// Parameters of the advection problem. Defaults to the straight problem with wind `(2, 2)` and
/// the van Leer limiter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdvectionParameters {
    pub problem: ProblemKind,
    /// x component of the wind for [`ProblemKind::Straight`].
    pub windx: f64,
    /// y component of the wind for [`ProblemKind::Straight`].
    pub windy: f64,
    pub limiter: Limiter,
}

impl Default for AdvectionParameters {
    fn default() -> Self {
        Self {
            problem: ProblemKind::default(),
            windx: 2.0,
            windy: 2.0,
            limiter: Limiter::default(),
        }
    }
}

impl AdvectionParameters {
    pub fn rotation(limiter: Limiter) -> Self {
        Self {
            problem: ProblemKind::Rotation,
            limiter,
            ..Self::default()
        }
    }

    pub fn straight(windx: f64, windy: f64, limiter: Limiter) -> Self {
        Self {
            problem: ProblemKind::Straight,
            windx,
            windy,
            limiter,
        }
    }

    /// The wind component normal to a face of the given direction, at position `(x, y)`.
    pub fn wind(&self, x: f64, y: f64, direction: FaceDirection) -> f64 {
        match (self.problem, direction) {
            (ProblemKind::Rotation, FaceDirection::East) => 2.0 * y,
            (ProblemKind::Rotation, FaceDirection::North) => -2.0 * x,
            (ProblemKind::Straight, FaceDirection::East) => self.windx,
            (ProblemKind::Straight, FaceDirection::North) => self.windy,
        }
    }
}

impl Validate for AdvectionParameters {
    fn validate(&self) -> Result<(), ConfigError> {
        require_finite("windx", self.windx)?;
        require_finite("windy", self.windy)?;
        Ok(())
    }
}
