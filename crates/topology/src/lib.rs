//! Immutable description of a StackLink layout: stops, stacks, track
//! segments and the adjacency between them.
//!
//! A [`Topology`] is built once from a [`LayoutConfig`] and shared read-only
//! for the lifetime of the process. Locations are addressed by their
//! configured id; a single track slot is addressed as `<track>#<n>` with `n`
//! starting at 1.

use std::collections::{HashMap, HashSet, VecDeque};

use shared::{
    domain::{LocationId, LocationKind},
    error::CoreError,
};

mod layout;

pub use layout::{
    load_layout, ConfigurationError, LayoutConfig, StackConfig, StopConfig, TrackConfig,
};

/// Selector accepted as a MOVEPLATE destination meaning "first eligible stop".
pub const ANY_STOP: &str = "ANY_STOP";
/// Selector accepted as a MOVEPLATE destination meaning "first eligible stack".
pub const ANY_STACK: &str = "ANY_STACK";

pub const SLOT_SEPARATOR: char = '#';

/// Resolved address of a location. Indices point into the topology's
/// declaration-ordered tables; `slot` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationRef {
    Stop(usize),
    Stack(usize),
    Track(usize),
    TrackSlot { track: usize, slot: usize },
}

impl LocationRef {
    /// The graph node that holds this address. Track slots collapse onto their
    /// track.
    pub fn node(self) -> LocationRef {
        match self {
            LocationRef::TrackSlot { track, .. } => LocationRef::Track(track),
            other => other,
        }
    }

    pub fn kind(self) -> LocationKind {
        match self {
            LocationRef::Stop(_) => LocationKind::Stop,
            LocationRef::Stack(_) => LocationKind::Stack,
            LocationRef::Track(_) | LocationRef::TrackSlot { .. } => LocationKind::Track,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StopSpec {
    pub id: LocationId,
}

#[derive(Debug, Clone)]
pub struct StackSpec {
    pub id: LocationId,
    pub capacity: usize,
    pub initial_plates: usize,
}

#[derive(Debug, Clone)]
pub struct TrackSpec {
    pub id: LocationId,
    pub slots: usize,
    pub from: LocationRef,
    pub to: LocationRef,
}

#[derive(Debug, Clone)]
pub struct Topology {
    stops: Vec<StopSpec>,
    stacks: Vec<StackSpec>,
    tracks: Vec<TrackSpec>,
    index: HashMap<LocationId, LocationRef>,
    adjacency: HashMap<LocationRef, Vec<LocationRef>>,
}

impl Topology {
    pub(crate) fn assemble(
        stops: Vec<StopSpec>,
        stacks: Vec<StackSpec>,
        tracks: Vec<TrackSpec>,
        index: HashMap<LocationId, LocationRef>,
    ) -> Self {
        let mut adjacency: HashMap<LocationRef, Vec<LocationRef>> = HashMap::new();
        for (i, track) in tracks.iter().enumerate() {
            let node = LocationRef::Track(i);
            for end in [track.from, track.to] {
                adjacency.entry(node).or_default().push(end);
                adjacency.entry(end).or_default().push(node);
            }
        }
        for neighbors in adjacency.values_mut() {
            neighbors.sort();
            neighbors.dedup();
        }
        Self {
            stops,
            stacks,
            tracks,
            index,
            adjacency,
        }
    }

    pub fn stops(&self) -> &[StopSpec] {
        &self.stops
    }

    pub fn stacks(&self) -> &[StackSpec] {
        &self.stacks
    }

    pub fn tracks(&self) -> &[TrackSpec] {
        &self.tracks
    }

    pub fn location_count(&self) -> usize {
        self.index.len()
    }

    /// Exact id lookup, without slot syntax.
    pub fn lookup(&self, id: &str) -> Option<LocationRef> {
        self.index.get(&LocationId::from(id)).copied()
    }

    /// Resolves a command argument to an address. Unknown ids and slot
    /// numbers outside the track are `NotFound`; slot syntax on a location
    /// that is not a track is `MalformedArguments`.
    pub fn resolve(&self, address: &str) -> Result<LocationRef, CoreError> {
        let Some((id, slot)) = address.split_once(SLOT_SEPARATOR) else {
            return self
                .lookup(address)
                .ok_or_else(|| CoreError::not_found(format!("unknown location '{address}'")));
        };

        let location = self
            .lookup(id)
            .ok_or_else(|| CoreError::not_found(format!("unknown location '{id}'")))?;
        let LocationRef::Track(track) = location else {
            return Err(CoreError::malformed(format!(
                "slot address '{address}' requires a track, but '{id}' is a {}",
                location.kind()
            )));
        };
        let slot: usize = slot.parse().map_err(|_| {
            CoreError::malformed(format!("invalid slot number in '{address}'"))
        })?;
        let slots = self.tracks[track].slots;
        if slot == 0 || slot > slots {
            return Err(CoreError::not_found(format!(
                "track {id} has no slot {slot} (slots 1..={slots})"
            )));
        }
        Ok(LocationRef::TrackSlot {
            track,
            slot: slot - 1,
        })
    }

    pub fn id_of(&self, location: LocationRef) -> &LocationId {
        match location {
            LocationRef::Stop(i) => &self.stops[i].id,
            LocationRef::Stack(i) => &self.stacks[i].id,
            LocationRef::Track(i) | LocationRef::TrackSlot { track: i, .. } => &self.tracks[i].id,
        }
    }

    /// Address rendered the way a client would type it.
    pub fn address_of(&self, location: LocationRef) -> String {
        match location {
            LocationRef::TrackSlot { track, slot } => {
                format!("{}{SLOT_SEPARATOR}{}", self.tracks[track].id, slot + 1)
            }
            other => self.id_of(other).to_string(),
        }
    }

    /// Human-readable form used in response details, e.g. `stack K1`.
    pub fn describe(&self, location: LocationRef) -> String {
        match location {
            LocationRef::TrackSlot { track, slot } => {
                format!("track {} slot {}", self.tracks[track].id, slot + 1)
            }
            other => format!("{} {}", other.kind(), self.id_of(other)),
        }
    }

    /// Locations a plate reaches by leaving `location` in the forward
    /// direction: a track's `to` end, or the tracks that start at a stop or
    /// stack.
    pub fn downstream(&self, location: LocationRef) -> Vec<LocationRef> {
        match location.node() {
            LocationRef::Track(i) => vec![self.tracks[i].to],
            node => self
                .tracks
                .iter()
                .enumerate()
                .filter(|(_, track)| track.from == node)
                .map(|(i, _)| LocationRef::Track(i))
                .collect(),
        }
    }

    /// Mirror of [`Topology::downstream`].
    pub fn upstream(&self, location: LocationRef) -> Vec<LocationRef> {
        match location.node() {
            LocationRef::Track(i) => vec![self.tracks[i].from],
            node => self
                .tracks
                .iter()
                .enumerate()
                .filter(|(_, track)| track.to == node)
                .map(|(i, _)| LocationRef::Track(i))
                .collect(),
        }
    }

    pub fn neighbors(&self, location: LocationRef) -> &[LocationRef] {
        self.adjacency
            .get(&location.node())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_reachable(&self, from: LocationRef, to: LocationRef) -> bool {
        self.route(from, to, None).is_some()
    }

    /// Node path from `from` to `to`, both ends included. With `via`, the
    /// route must pass through that node: the first leg may not cross `to`
    /// and the second leg may not cross `from`.
    pub fn route(
        &self,
        from: LocationRef,
        to: LocationRef,
        via: Option<LocationRef>,
    ) -> Option<Vec<LocationRef>> {
        let (from, to) = (from.node(), to.node());
        if from == to {
            return Some(vec![from]);
        }
        let Some(via) = via.map(LocationRef::node) else {
            return self.shortest_path(from, to, None);
        };
        if via == from || via == to {
            return self.shortest_path(from, to, None);
        }
        let mut path = self.shortest_path(from, via, Some(to))?;
        let tail = self.shortest_path(via, to, Some(from))?;
        path.extend(tail.into_iter().skip(1));
        Some(path)
    }

    fn shortest_path(
        &self,
        from: LocationRef,
        to: LocationRef,
        avoid: Option<LocationRef>,
    ) -> Option<Vec<LocationRef>> {
        if from == to {
            return Some(vec![from]);
        }
        let mut previous: HashMap<LocationRef, LocationRef> = HashMap::new();
        let mut seen: HashSet<LocationRef> = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(node) = queue.pop_front() {
            for &next in self.neighbors(node) {
                if Some(next) == avoid || !seen.insert(next) {
                    continue;
                }
                previous.insert(next, node);
                if next == to {
                    let mut path = vec![to];
                    let mut cursor = to;
                    while let Some(&prev) = previous.get(&cursor) {
                        path.push(prev);
                        cursor = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
