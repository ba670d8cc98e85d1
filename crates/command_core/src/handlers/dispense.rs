use shared::error::CoreError;
use tracing::info;

use super::expect_stop;
use crate::{
    args::{ArgKind, ArgSpec, Args},
    registry::{CommandContext, CommandHandler, Outcome},
};

/// `DISPENSE stopId`: a new plate enters the system at an empty stop.
pub struct Dispense;

const SCHEMA: &[ArgSpec] = &[ArgSpec::required("stop", ArgKind::Location)];

impl CommandHandler for Dispense {
    fn schema(&self) -> &'static [ArgSpec] {
        SCHEMA
    }

    fn execute(&self, args: &Args, ctx: &CommandContext<'_>) -> Result<Outcome, CoreError> {
        let stop = expect_stop(ctx.topology, args.location(0)?)?;
        let plate = ctx.store.transact(|state| {
            state.check_place(stop)?;
            let plate = state.mint_plate();
            state.place(stop, plate)?;
            Ok(plate)
        })?;
        let at = ctx.topology.address_of(stop);
        info!(%plate, %at, "plate dispensed");
        Ok(Outcome::detail(format!("{plate} {at}")))
    }
}
