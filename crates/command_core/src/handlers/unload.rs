use shared::error::CoreError;
use tracing::info;

use crate::{
    args::{ArgKind, ArgSpec, Args},
    registry::{CommandContext, CommandHandler, Outcome},
};

/// `UNLOAD locationId`: the accessible plate leaves the system for good.
pub struct Unload;

const SCHEMA: &[ArgSpec] = &[ArgSpec::required("location", ArgKind::Location)];

impl CommandHandler for Unload {
    fn schema(&self) -> &'static [ArgSpec] {
        SCHEMA
    }

    fn execute(&self, args: &Args, ctx: &CommandContext<'_>) -> Result<Outcome, CoreError> {
        let location = ctx.topology.resolve(args.location(0)?)?;
        let (from, plate) = ctx.store.transact(|state| state.remove(location))?;
        let from = ctx.topology.address_of(from);
        info!(%plate, %from, "plate unloaded");
        Ok(Outcome::detail(format!("{plate} {from}")))
    }
}
