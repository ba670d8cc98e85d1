//! Plate State Store: the single owner of all occupancy in a layout.
//!
//! [`LayoutState`] is the plain data with its `place`/`remove` surface;
//! [`LayoutStore`] guards it with a reader-writer lock so that every command
//! transition is observed either fully applied or not at all.

use std::{
    collections::HashSet,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use shared::{
    domain::PlateId,
    error::CoreError,
    protocol::{LayoutSnapshot, StackSnapshot, StopSnapshot, TrackSnapshot},
};
use topology::{LocationRef, Topology};
use tracing::{debug, error, warn};

#[derive(Debug, Clone)]
pub struct LayoutState {
    topology: Arc<Topology>,
    stops: Vec<Option<PlateId>>,
    /// Index 0 is the top of each stack.
    stacks: Vec<Vec<PlateId>>,
    tracks: Vec<Vec<Option<PlateId>>>,
    next_plate: u64,
    mutations: u64,
    revision: u64,
}

impl LayoutState {
    /// Empty occupancy except for configured initial stack contents, which
    /// receive the first plate ids, bottom of each stack first.
    pub fn new(topology: Arc<Topology>) -> Self {
        let mut state = Self {
            stops: vec![None; topology.stops().len()],
            stacks: vec![Vec::new(); topology.stacks().len()],
            tracks: topology
                .tracks()
                .iter()
                .map(|t| vec![None; t.slots])
                .collect(),
            topology,
            next_plate: 1,
            mutations: 0,
            revision: 0,
        };
        for i in 0..state.stacks.len() {
            for _ in 0..state.topology.stacks()[i].initial_plates {
                let plate = state.mint_plate();
                state.stacks[i].insert(0, plate);
            }
        }
        state.mutations = 0;
        state
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Plates held at `location`: a stack lists top first, a track lists
    /// slot 1 first.
    pub fn occupancy_at(&self, location: LocationRef) -> Vec<PlateId> {
        match location {
            LocationRef::Stop(i) => self.stops[i].into_iter().collect(),
            LocationRef::Stack(i) => self.stacks[i].clone(),
            LocationRef::Track(i) => self.tracks[i].iter().flatten().copied().collect(),
            LocationRef::TrackSlot { track, slot } => self.tracks[track][slot].into_iter().collect(),
        }
    }

    pub fn track_slots(&self, track: usize) -> &[Option<PlateId>] {
        &self.tracks[track]
    }

    /// The plate `remove` would take, with the concrete address it sits at.
    pub fn accessible(&self, location: LocationRef) -> Option<(LocationRef, PlateId)> {
        match location {
            LocationRef::Stop(i) => self.stops[i].map(|p| (location, p)),
            LocationRef::Stack(i) => self.stacks[i].first().map(|&p| (location, p)),
            LocationRef::Track(track) => self.tracks[track]
                .iter()
                .enumerate()
                .find_map(|(slot, p)| p.map(|p| (LocationRef::TrackSlot { track, slot }, p))),
            LocationRef::TrackSlot { track, slot } => {
                self.tracks[track][slot].map(|p| (location, p))
            }
        }
    }

    /// Checks that `location` can take one more plate and returns the
    /// concrete address it would land at; a bare track picks its first free
    /// slot.
    pub fn check_place(&self, location: LocationRef) -> Result<LocationRef, CoreError> {
        let topology = &self.topology;
        match location {
            LocationRef::Stop(i) => match self.stops[i] {
                Some(held) => Err(CoreError::Occupied(format!(
                    "{} already holds {held}",
                    topology.describe(location)
                ))),
                None => Ok(location),
            },
            LocationRef::Stack(i) => {
                let capacity = topology.stacks()[i].capacity;
                if self.stacks[i].len() >= capacity {
                    Err(CoreError::Capacity(format!(
                        "{} is full ({capacity}/{capacity})",
                        topology.describe(location)
                    )))
                } else {
                    Ok(location)
                }
            }
            LocationRef::Track(track) => self.tracks[track]
                .iter()
                .position(Option::is_none)
                .map(|slot| LocationRef::TrackSlot { track, slot })
                .ok_or_else(|| {
                    CoreError::Capacity(format!(
                        "{} has no free slot",
                        topology.describe(location)
                    ))
                }),
            LocationRef::TrackSlot { track, slot } => match self.tracks[track][slot] {
                Some(held) => Err(CoreError::Occupied(format!(
                    "{} already holds {held}",
                    topology.describe(location)
                ))),
                None => Ok(location),
            },
        }
    }

    /// Puts `plate` at `location`. The plate must have been minted and must
    /// not be held anywhere else.
    pub fn place(&mut self, location: LocationRef, plate: PlateId) -> Result<LocationRef, CoreError> {
        if plate.0 == 0 || plate.0 >= self.next_plate {
            return Err(CoreError::not_found(format!("plate {plate} was never issued")));
        }
        if let Some(held) = self.locate(plate) {
            return Err(CoreError::Internal(format!(
                "plate {plate} is already held at {}",
                self.topology.describe(held)
            )));
        }
        let target = self.check_place(location)?;
        match target {
            LocationRef::Stop(i) => self.stops[i] = Some(plate),
            LocationRef::Stack(i) => self.stacks[i].insert(0, plate),
            LocationRef::TrackSlot { track, slot } => self.tracks[track][slot] = Some(plate),
            LocationRef::Track(_) => {
                return Err(CoreError::Internal("bare track address left unresolved".into()))
            }
        }
        self.mutations += 1;
        debug!(%plate, at = %self.topology.address_of(target), "plate placed");
        Ok(target)
    }

    pub fn remove(&mut self, location: LocationRef) -> Result<(LocationRef, PlateId), CoreError> {
        let (source, plate) = self.accessible(location).ok_or_else(|| {
            CoreError::Empty(format!("{} holds no plate", self.topology.describe(location)))
        })?;
        match source {
            LocationRef::Stop(i) => self.stops[i] = None,
            LocationRef::Stack(i) => {
                self.stacks[i].remove(0);
            }
            LocationRef::TrackSlot { track, slot } => self.tracks[track][slot] = None,
            LocationRef::Track(_) => {
                return Err(CoreError::Internal("bare track address left unresolved".into()))
            }
        }
        self.mutations += 1;
        debug!(%plate, from = %self.topology.address_of(source), "plate removed");
        Ok((source, plate))
    }

    /// Fresh, never reused plate id. The caller must place it in the same
    /// transaction.
    pub fn mint_plate(&mut self) -> PlateId {
        let plate = PlateId(self.next_plate);
        self.next_plate += 1;
        self.mutations += 1;
        plate
    }

    /// Concrete address currently holding `plate`, if it is in the system.
    pub fn locate(&self, plate: PlateId) -> Option<LocationRef> {
        if let Some(i) = self.stops.iter().position(|p| *p == Some(plate)) {
            return Some(LocationRef::Stop(i));
        }
        if let Some(i) = self.stacks.iter().position(|s| s.contains(&plate)) {
            return Some(LocationRef::Stack(i));
        }
        self.tracks.iter().enumerate().find_map(|(track, slots)| {
            slots
                .iter()
                .position(|p| *p == Some(plate))
                .map(|slot| LocationRef::TrackSlot { track, slot })
        })
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        let topology = &self.topology;
        LayoutSnapshot {
            revision: self.revision,
            stops: topology
                .stops()
                .iter()
                .zip(&self.stops)
                .map(|(spec, plate)| StopSnapshot {
                    id: spec.id.clone(),
                    plate: *plate,
                })
                .collect(),
            stacks: topology
                .stacks()
                .iter()
                .zip(&self.stacks)
                .map(|(spec, plates)| StackSnapshot {
                    id: spec.id.clone(),
                    capacity: spec.capacity,
                    plates: plates.clone(),
                })
                .collect(),
            tracks: topology
                .tracks()
                .iter()
                .zip(&self.tracks)
                .map(|(spec, slots)| TrackSnapshot {
                    id: spec.id.clone(),
                    from: topology.id_of(spec.from).clone(),
                    to: topology.id_of(spec.to).clone(),
                    slots: slots.clone(),
                })
                .collect(),
        }
    }

    /// Every plate held exactly once and no stack over capacity.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        let all = self
            .stops
            .iter()
            .flatten()
            .chain(self.stacks.iter().flatten())
            .chain(self.tracks.iter().flatten().flatten());
        for plate in all {
            if !seen.insert(*plate) {
                return Err(format!("plate {plate} is held by more than one location"));
            }
        }
        for (spec, plates) in self.topology.stacks().iter().zip(&self.stacks) {
            if plates.len() > spec.capacity {
                return Err(format!(
                    "stack {} holds {} plates, capacity {}",
                    spec.id,
                    plates.len(),
                    spec.capacity
                ));
            }
        }
        Ok(())
    }
}

/// Shared handle to the layout state. Mutations run inside [`transact`]
/// under the write lock; reads and snapshots share the read lock.
///
/// [`transact`]: LayoutStore::transact
#[derive(Debug)]
pub struct LayoutStore {
    state: RwLock<LayoutState>,
}

impl LayoutStore {
    pub fn new(topology: Arc<Topology>) -> Self {
        Self {
            state: RwLock::new(LayoutState::new(topology)),
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, LayoutState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, LayoutState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read<T>(&self, f: impl FnOnce(&LayoutState) -> T) -> T {
        f(&self.read_guard())
    }

    /// Runs one atomic transition. A closure that fails, or leaves the
    /// layout violating its invariants, is rolled back in full; the revision
    /// advances only when a change is committed.
    pub fn transact<T>(
        &self,
        f: impl FnOnce(&mut LayoutState) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut state = self.write_guard();
        let before = state.clone();
        let result = f(&mut state).and_then(|value| match state.check_invariants() {
            Ok(()) => Ok(value),
            Err(violation) => {
                error!(%violation, "transition broke a layout invariant");
                Err(CoreError::Internal(violation))
            }
        });

        if state.mutations == before.mutations {
            return result;
        }
        match result {
            Ok(value) => {
                state.revision += 1;
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "rolling back a partially applied transition");
                *state = before;
                Err(err)
            }
        }
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        self.read_guard().snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.read_guard().revision
    }

    pub fn occupancy_at(&self, location: LocationRef) -> Vec<PlateId> {
        self.read_guard().occupancy_at(location)
    }

    pub fn place(&self, location: LocationRef, plate: PlateId) -> Result<LocationRef, CoreError> {
        self.transact(|state| state.place(location, plate))
    }

    pub fn remove(&self, location: LocationRef) -> Result<(LocationRef, PlateId), CoreError> {
        self.transact(|state| state.remove(location))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
