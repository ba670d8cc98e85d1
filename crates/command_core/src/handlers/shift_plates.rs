use shared::{domain::Direction, error::CoreError};
use topology::LocationRef;
use tracing::info;

use super::expect_track;
use crate::{
    args::{ArgKind, ArgSpec, Args},
    registry::{CommandContext, CommandHandler, Outcome},
};

/// `SHIFTPLATES trackId,fwd|bwd`: moves every plate on the track one slot.
///
/// The shift is rigid. If the leading slot in the shift direction is held,
/// nothing moves and the command fails with `CapacityError`.
pub struct ShiftPlates;

const SCHEMA: &[ArgSpec] = &[
    ArgSpec::required("track", ArgKind::Location),
    ArgSpec::required("direction", ArgKind::Direction),
];

impl CommandHandler for ShiftPlates {
    fn schema(&self) -> &'static [ArgSpec] {
        SCHEMA
    }

    fn execute(&self, args: &Args, ctx: &CommandContext<'_>) -> Result<Outcome, CoreError> {
        let track = expect_track(ctx.topology, args.location(0)?)?;
        let direction = args.direction(1)?;
        let id = &ctx.topology.tracks()[track].id;

        let moved = ctx.store.transact(|state| {
            let slots = state.track_slots(track);
            let last = slots.len() - 1;
            let leading = match direction {
                Direction::Forward => last,
                Direction::Backward => 0,
            };
            if let Some(blocker) = slots[leading] {
                return Err(CoreError::Capacity(format!(
                    "track {id} cannot shift {direction}: slot {} holds {blocker}",
                    leading + 1
                )));
            }

            // Vacate from the leading edge back so every target is free.
            let mut occupied: Vec<usize> = (0..slots.len()).filter(|&i| slots[i].is_some()).collect();
            if direction == Direction::Forward {
                occupied.reverse();
            }
            for &slot in &occupied {
                let next = match direction {
                    Direction::Forward => slot + 1,
                    Direction::Backward => slot - 1,
                };
                let (_, plate) = state.remove(LocationRef::TrackSlot { track, slot })?;
                state.place(LocationRef::TrackSlot { track, slot: next }, plate)?;
            }
            Ok(occupied.len())
        })?;

        info!(track = %id, %direction, moved, "plates shifted");
        Ok(Outcome::detail(format!("{id} {direction} {moved}")))
    }
}
