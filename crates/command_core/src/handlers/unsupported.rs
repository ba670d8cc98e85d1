use shared::error::CoreError;

use crate::{
    args::{ArgSpec, Args},
    registry::{CommandContext, CommandHandler, Outcome},
};

/// Stands in for a real device verb the simulator does not model. Any
/// arguments are accepted.
pub struct NotImplemented;

const SCHEMA: &[ArgSpec] = &[ArgSpec::rest("args")];

impl CommandHandler for NotImplemented {
    fn schema(&self) -> &'static [ArgSpec] {
        SCHEMA
    }

    fn execute(&self, _args: &Args, _ctx: &CommandContext<'_>) -> Result<Outcome, CoreError> {
        Err(CoreError::NotImplemented(
            "No mock implementation for this command".into(),
        ))
    }
}
