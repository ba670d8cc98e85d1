use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{LocationId, PlateId},
    error::{CoreError, ResponseCode},
};

pub const END_OF_LIST: &str = "End of List";
pub const LINE_TERMINATOR: &str = "\r\n";

/// Result of interpreting one command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub echo: String,
    pub code: ResponseCode,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
}

impl Response {
    pub fn ok(echo: impl Into<String>, detail: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            echo: echo.into(),
            code: ResponseCode::Ok,
            detail: detail.into(),
            lines,
        }
    }

    pub fn error(echo: impl Into<String>, error: &CoreError) -> Self {
        Self {
            echo: echo.into(),
            code: error.code(),
            detail: error.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }

    /// `CCCC TOKEN detail`, the single line a client checks for success.
    pub fn status_line(&self) -> String {
        if self.detail.is_empty() {
            self.code.to_string()
        } else {
            format!("{} {}", self.code, self.detail)
        }
    }

    /// Device framing: echo, status line, then any listing lines closed by
    /// `End of List`.
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.echo);
        out.push_str(LINE_TERMINATOR);
        out.push_str(&self.status_line());
        out.push_str(LINE_TERMINATOR);
        if !self.lines.is_empty() {
            for line in &self.lines {
                out.push_str(line);
                out.push_str(LINE_TERMINATOR);
            }
            out.push_str(END_OF_LIST);
            out.push_str(LINE_TERMINATOR);
        }
        out
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.status_line())
    }
}

/// Parsed view of a status line as received by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub numeric: u16,
    pub code: Option<ResponseCode>,
    pub detail: String,
}

pub fn parse_status_line(line: &str) -> Option<StatusLine> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (numeric, rest) = line.split_once(' ').unwrap_or((line, ""));
    if numeric.len() != 4 {
        return None;
    }
    let numeric = numeric.parse::<u16>().ok()?;
    let (token, detail) = rest.split_once(' ').unwrap_or((rest, ""));
    Some(StatusLine {
        numeric,
        code: ResponseCode::from_token(token),
        detail: detail.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopSnapshot {
    pub id: LocationId,
    pub plate: Option<PlateId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSnapshot {
    pub id: LocationId,
    pub capacity: usize,
    /// Top of the stack first.
    pub plates: Vec<PlateId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub id: LocationId,
    pub from: LocationId,
    pub to: LocationId,
    /// Slot 1 (the `from` end) first.
    pub slots: Vec<Option<PlateId>>,
}

/// Read-consistent copy of the full layout occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub revision: u64,
    pub stops: Vec<StopSnapshot>,
    pub stacks: Vec<StackSnapshot>,
    pub tracks: Vec<TrackSnapshot>,
}

impl LayoutSnapshot {
    pub fn plate_count(&self) -> usize {
        self.stops.iter().filter(|s| s.plate.is_some()).count()
            + self.stacks.iter().map(|s| s.plates.len()).sum::<usize>()
            + self
                .tracks
                .iter()
                .map(|t| t.slots.iter().flatten().count())
                .sum::<usize>()
    }

    pub fn stop(&self, id: &str) -> Option<&StopSnapshot> {
        self.stops.iter().find(|s| s.id.as_str() == id)
    }

    pub fn stack(&self, id: &str) -> Option<&StackSnapshot> {
        self.stacks.iter().find(|s| s.id.as_str() == id)
    }

    pub fn track(&self, id: &str) -> Option<&TrackSnapshot> {
        self.tracks.iter().find(|t| t.id.as_str() == id)
    }
}

/// Payload served to the dashboard over HTTP and WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEnvelope {
    pub served_at: DateTime<Utc>,
    pub snapshot: LayoutSnapshot,
}

impl StateEnvelope {
    pub fn now(snapshot: LayoutSnapshot) -> Self {
        Self {
            served_at: Utc::now(),
            snapshot,
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
