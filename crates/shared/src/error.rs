use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Four-digit status codes written on the response status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCode {
    Ok,
    UnknownCommand,
    MalformedArguments,
    NotFound,
    Occupied,
    Capacity,
    Empty,
    Unreachable,
    NotImplemented,
    Internal,
}

impl ResponseCode {
    pub fn numeric(self) -> u16 {
        match self {
            ResponseCode::Ok => 0,
            ResponseCode::UnknownCommand => 1,
            ResponseCode::MalformedArguments => 2,
            ResponseCode::NotFound => 1000,
            ResponseCode::Occupied => 1001,
            ResponseCode::Capacity => 1002,
            ResponseCode::Empty => 1003,
            ResponseCode::Unreachable => 1004,
            ResponseCode::NotImplemented | ResponseCode::Internal => 9999,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            ResponseCode::Ok => "OK",
            ResponseCode::UnknownCommand => "UNKNOWN_COMMAND",
            ResponseCode::MalformedArguments => "MALFORMED_ARGUMENTS",
            ResponseCode::NotFound => "NOT_FOUND",
            ResponseCode::Occupied => "OCCUPIED",
            ResponseCode::Capacity => "CAPACITY",
            ResponseCode::Empty => "EMPTY",
            ResponseCode::Unreachable => "UNREACHABLE",
            ResponseCode::NotImplemented => "NOT_IMPLEMENTED",
            ResponseCode::Internal => "INTERNAL",
        }
    }

    pub fn is_ok(self) -> bool {
        self == ResponseCode::Ok
    }

    pub fn from_token(token: &str) -> Option<Self> {
        [
            ResponseCode::Ok,
            ResponseCode::UnknownCommand,
            ResponseCode::MalformedArguments,
            ResponseCode::NotFound,
            ResponseCode::Occupied,
            ResponseCode::Capacity,
            ResponseCode::Empty,
            ResponseCode::Unreachable,
            ResponseCode::NotImplemented,
            ResponseCode::Internal,
        ]
        .into_iter()
        .find(|code| code.token() == token)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04} {}", self.numeric(), self.token())
    }
}

/// Domain and protocol errors raised while interpreting one command.
///
/// None of these escape the interpreter: each one becomes an error response
/// and the command leaves the layout untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("{0}")]
    UnknownCommand(String),
    #[error("{0}")]
    MalformedArguments(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Occupied(String),
    #[error("{0}")]
    Capacity(String),
    #[error("{0}")]
    Empty(String),
    #[error("{0}")]
    Unreachable(String),
    #[error("{0}")]
    NotImplemented(String),
    #[error("{0}")]
    Internal(String),
}

impl CoreError {
    pub fn code(&self) -> ResponseCode {
        match self {
            CoreError::UnknownCommand(_) => ResponseCode::UnknownCommand,
            CoreError::MalformedArguments(_) => ResponseCode::MalformedArguments,
            CoreError::NotFound(_) => ResponseCode::NotFound,
            CoreError::Occupied(_) => ResponseCode::Occupied,
            CoreError::Capacity(_) => ResponseCode::Capacity,
            CoreError::Empty(_) => ResponseCode::Empty,
            CoreError::Unreachable(_) => ResponseCode::Unreachable,
            CoreError::NotImplemented(_) => ResponseCode::NotImplemented,
            CoreError::Internal(_) => ResponseCode::Internal,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedArguments(message.into())
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
