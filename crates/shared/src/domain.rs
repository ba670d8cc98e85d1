use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Configured identifier of a stop, stack or track segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Plate identifiers are minted once and never reused. Rendered as `P<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PlateId(pub u64);

impl fmt::Display for PlateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid plate id '{0}', expected P<number>")]
pub struct InvalidPlateId(pub String);

impl FromStr for PlateId {
    type Err = InvalidPlateId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('P')
            .or_else(|| s.strip_prefix('p'))
            .and_then(|n| n.parse::<u64>().ok())
            .map(PlateId)
            .ok_or_else(|| InvalidPlateId(s.to_string()))
    }
}

impl From<PlateId> for String {
    fn from(value: PlateId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for PlateId {
    type Error = InvalidPlateId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward the track's `to` end.
    Forward,
    /// Toward the track's `from` end.
    Backward,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "fwd",
            Direction::Backward => "bwd",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid direction '{0}', expected fwd or bwd")]
pub struct InvalidDirection(pub String);

impl FromStr for Direction {
    type Err = InvalidDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fwd" | "forward" => Ok(Direction::Forward),
            "bwd" | "backward" => Ok(Direction::Backward),
            _ => Err(InvalidDirection(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Stop,
    Stack,
    Track,
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LocationKind::Stop => "stop",
            LocationKind::Stack => "stack",
            LocationKind::Track => "track",
        })
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
