use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use shared::domain::LocationId;
use thiserror::Error;
use tracing::info;

use crate::{LocationRef, StackSpec, StopSpec, Topology, TrackSpec, ANY_STACK, ANY_STOP, SLOT_SEPARATOR};

/// Textual layout description as found in a layout TOML file.
///
/// Numeric fields are signed so that a negative value is reported as a
/// configuration error instead of a TOML type error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    #[serde(default)]
    pub stops: Vec<StopConfig>,
    #[serde(default)]
    pub stacks: Vec<StackConfig>,
    #[serde(default)]
    pub tracks: Vec<TrackConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StopConfig {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    pub id: String,
    pub capacity: i64,
    #[serde(default)]
    pub initial_plates: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackConfig {
    pub id: String,
    pub slots: i64,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read layout file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse layout: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("layout defines no locations")]
    EmptyLayout,
    #[error("invalid location id '{id}': {reason}")]
    InvalidId { id: String, reason: &'static str },
    #[error("location id '{0}' is declared more than once")]
    DuplicateId(String),
    #[error("stack '{stack}' has non-positive capacity {capacity}")]
    NonPositiveCapacity { stack: String, capacity: i64 },
    #[error("stack '{stack}' starts with {initial} plates but holds at most {capacity}")]
    InitialPlatesOutOfRange {
        stack: String,
        initial: i64,
        capacity: i64,
    },
    #[error("track '{track}' has non-positive slot count {slots}")]
    NonPositiveSlots { track: String, slots: i64 },
    #[error("track '{track}' references unknown location '{endpoint}'")]
    UnknownEndpoint { track: String, endpoint: String },
    #[error("track '{track}' cannot connect to itself")]
    SelfLoop { track: String },
}

impl LayoutConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigurationError> {
        Ok(toml::from_str(raw)?)
    }
}

pub fn load_layout(path: &Path) -> Result<Topology, ConfigurationError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let topology = Topology::from_config(&LayoutConfig::from_toml_str(&raw)?)?;
    info!(
        path = %path.display(),
        stops = topology.stops().len(),
        stacks = topology.stacks().len(),
        tracks = topology.tracks().len(),
        "layout loaded"
    );
    Ok(topology)
}

impl Topology {
    /// Validates the whole description before building anything; a failure
    /// never yields a partial topology.
    pub fn from_config(config: &LayoutConfig) -> Result<Self, ConfigurationError> {
        if config.stops.is_empty() && config.stacks.is_empty() && config.tracks.is_empty() {
            return Err(ConfigurationError::EmptyLayout);
        }

        let mut index: HashMap<LocationId, LocationRef> = HashMap::new();
        let declared = config
            .stops
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.as_str(), LocationRef::Stop(i)))
            .chain(
                config
                    .stacks
                    .iter()
                    .enumerate()
                    .map(|(i, s)| (s.id.as_str(), LocationRef::Stack(i))),
            )
            .chain(
                config
                    .tracks
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (t.id.as_str(), LocationRef::Track(i))),
            );
        for (id, location) in declared {
            validate_id(id)?;
            if index.insert(LocationId::from(id), location).is_some() {
                return Err(ConfigurationError::DuplicateId(id.to_string()));
            }
        }

        let stops = config
            .stops
            .iter()
            .map(|s| StopSpec {
                id: LocationId::from(s.id.as_str()),
            })
            .collect();

        let mut stacks = Vec::with_capacity(config.stacks.len());
        for stack in &config.stacks {
            if stack.capacity <= 0 {
                return Err(ConfigurationError::NonPositiveCapacity {
                    stack: stack.id.clone(),
                    capacity: stack.capacity,
                });
            }
            if stack.initial_plates < 0 || stack.initial_plates > stack.capacity {
                return Err(ConfigurationError::InitialPlatesOutOfRange {
                    stack: stack.id.clone(),
                    initial: stack.initial_plates,
                    capacity: stack.capacity,
                });
            }
            stacks.push(StackSpec {
                id: LocationId::from(stack.id.as_str()),
                capacity: stack.capacity as usize,
                initial_plates: stack.initial_plates as usize,
            });
        }

        let mut tracks = Vec::with_capacity(config.tracks.len());
        for track in &config.tracks {
            if track.slots <= 0 {
                return Err(ConfigurationError::NonPositiveSlots {
                    track: track.id.clone(),
                    slots: track.slots,
                });
            }
            let endpoint = |name: &str| {
                if name == track.id {
                    return Err(ConfigurationError::SelfLoop {
                        track: track.id.clone(),
                    });
                }
                index
                    .get(&LocationId::from(name))
                    .copied()
                    .ok_or_else(|| ConfigurationError::UnknownEndpoint {
                        track: track.id.clone(),
                        endpoint: name.to_string(),
                    })
            };
            tracks.push(TrackSpec {
                id: LocationId::from(track.id.as_str()),
                slots: track.slots as usize,
                from: endpoint(&track.from)?,
                to: endpoint(&track.to)?,
            });
        }

        Ok(Topology::assemble(stops, stacks, tracks, index))
    }
}

fn validate_id(id: &str) -> Result<(), ConfigurationError> {
    let reason = if id.is_empty() {
        Some("id is empty")
    } else if id.chars().any(char::is_whitespace) {
        Some("id contains whitespace")
    } else if id.contains(',') {
        Some("id contains ','")
    } else if id.contains(SLOT_SEPARATOR) {
        Some("id contains the slot separator '#'")
    } else if id == ANY_STOP || id == ANY_STACK {
        Some("id is a reserved selector")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ConfigurationError::InvalidId {
            id: id.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "tests/layout_tests.rs"]
mod tests;
