//! Read-only verbs. All of them run under the store's read lock and only
//! fail with `NotFound` (or a malformed argument).

use shared::error::CoreError;
use topology::LocationRef;

use super::{expect_stack, expect_track, join_plates};
use crate::{
    args::{ArgKind, ArgSpec, Args},
    registry::{CommandContext, CommandHandler, Outcome},
};

const LOCATION: &[ArgSpec] = &[ArgSpec::required("location", ArgKind::Location)];
const STACK: &[ArgSpec] = &[ArgSpec::required("stack", ArgKind::Location)];
const TRACK: &[ArgSpec] = &[ArgSpec::required("track", ArgKind::Location)];
const PLATE: &[ArgSpec] = &[ArgSpec::required("plate", ArgKind::Plate)];

/// `HASPLATE locationId` -> `true <plate>` or `false`.
pub struct HasPlate;

impl CommandHandler for HasPlate {
    fn schema(&self) -> &'static [ArgSpec] {
        LOCATION
    }

    fn execute(&self, args: &Args, ctx: &CommandContext<'_>) -> Result<Outcome, CoreError> {
        let location = ctx.topology.resolve(args.location(0)?)?;
        let detail = match ctx.store.read(|state| state.accessible(location)) {
            Some((_, plate)) => format!("true {plate}"),
            None => "false".to_string(),
        };
        Ok(Outcome::detail(detail))
    }
}

/// `GETSTACK stackId` -> `<id> <count>/<capacity> <plates top first>`.
pub struct GetStack;

impl CommandHandler for GetStack {
    fn schema(&self) -> &'static [ArgSpec] {
        STACK
    }

    fn execute(&self, args: &Args, ctx: &CommandContext<'_>) -> Result<Outcome, CoreError> {
        let stack = expect_stack(ctx.topology, args.location(0)?)?;
        let spec = &ctx.topology.stacks()[stack];
        let plates = ctx
            .store
            .read(|state| state.occupancy_at(LocationRef::Stack(stack)));
        Ok(Outcome::detail(format!(
            "{} {}/{} {}",
            spec.id,
            plates.len(),
            spec.capacity,
            join_plates(plates)
        )))
    }
}

/// `GETTRACK trackId` -> `<id> <slot,slot,...>` with `-` for a free slot.
pub struct GetTrack;

impl CommandHandler for GetTrack {
    fn schema(&self) -> &'static [ArgSpec] {
        TRACK
    }

    fn execute(&self, args: &Args, ctx: &CommandContext<'_>) -> Result<Outcome, CoreError> {
        let track = expect_track(ctx.topology, args.location(0)?)?;
        let slots: Vec<String> = ctx.store.read(|state| {
            state
                .track_slots(track)
                .iter()
                .map(|slot| slot.map_or_else(|| "-".to_string(), |p| p.to_string()))
                .collect()
        });
        Ok(Outcome::detail(format!(
            "{} {}",
            ctx.topology.tracks()[track].id,
            slots.join(",")
        )))
    }
}

/// `DUMPSTOPS` -> one listing line per stop, `id:plate` or `id:Empty`.
pub struct DumpStops;

impl CommandHandler for DumpStops {
    fn execute(&self, _args: &Args, ctx: &CommandContext<'_>) -> Result<Outcome, CoreError> {
        let snapshot = ctx.store.snapshot();
        let lines: Vec<String> = snapshot
            .stops
            .iter()
            .map(|stop| match stop.plate {
                Some(plate) => format!("{}:{plate}", stop.id),
                None => format!("{}:Empty", stop.id),
            })
            .collect();
        Ok(Outcome::listing(format!("{} stops", lines.len()), lines))
    }
}

/// `WHEREIS plateId` -> the address holding the plate.
pub struct WhereIs;

impl CommandHandler for WhereIs {
    fn schema(&self) -> &'static [ArgSpec] {
        PLATE
    }

    fn execute(&self, args: &Args, ctx: &CommandContext<'_>) -> Result<Outcome, CoreError> {
        let plate = args.plate(0)?;
        let location = ctx
            .store
            .read(|state| state.locate(plate))
            .ok_or_else(|| CoreError::not_found(format!("plate {plate} is not in the system")))?;
        Ok(Outcome::detail(format!(
            "{plate} {}",
            ctx.topology.address_of(location)
        )))
    }
}

pub struct ListCommands;

impl CommandHandler for ListCommands {
    fn execute(&self, _args: &Args, ctx: &CommandContext<'_>) -> Result<Outcome, CoreError> {
        Ok(Outcome::listing(
            format!("{} commands", ctx.verbs.len()),
            ctx.verbs.to_vec(),
        ))
    }
}

pub struct Version;

impl CommandHandler for Version {
    fn execute(&self, _args: &Args, _ctx: &CommandContext<'_>) -> Result<Outcome, CoreError> {
        Ok(Outcome::detail(format!(
            "StackLink Virtual {}",
            env!("CARGO_PKG_VERSION")
        )))
    }
}
