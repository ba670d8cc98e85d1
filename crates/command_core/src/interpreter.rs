use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use layout_store::LayoutStore;
use shared::{error::CoreError, protocol::{LayoutSnapshot, Response}};
use topology::Topology;
use tracing::{debug, error};

use crate::{
    args::Args,
    registry::{CommandContext, CommandRegistry, Outcome, RegistryError},
};

/// Turns one raw command line into one response.
///
/// Holds no per-command state; every transition lives in the
/// [`LayoutStore`], so a single interpreter is shared by all connections.
pub struct Interpreter {
    topology: Arc<Topology>,
    store: Arc<LayoutStore>,
    registry: CommandRegistry,
}

impl Interpreter {
    pub fn new(topology: Arc<Topology>, store: Arc<LayoutStore>, registry: CommandRegistry) -> Self {
        Self {
            topology,
            store,
            registry,
        }
    }

    /// Fresh store over `topology` with the standard verb set.
    pub fn standard(topology: Arc<Topology>) -> Result<Self, RegistryError> {
        let store = Arc::new(LayoutStore::new(topology.clone()));
        Ok(Self::new(topology, store, CommandRegistry::standard()?))
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn store(&self) -> &Arc<LayoutStore> {
        &self.store
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        self.store.snapshot()
    }

    pub fn interpret(&self, raw: &str) -> Response {
        let line = raw.trim();
        match self.dispatch(line) {
            Ok(outcome) => Response::ok(line, outcome.detail, outcome.lines),
            Err(err) => {
                debug!(command = line, code = %err.code(), error = %err, "command rejected");
                Response::error(line, &err)
            }
        }
    }

    fn dispatch(&self, line: &str) -> Result<Outcome, CoreError> {
        if line.is_empty() {
            return Err(CoreError::UnknownCommand("Empty command".into()));
        }
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let verb = verb.to_ascii_uppercase();

        let handler = self
            .registry
            .get(&verb)
            .ok_or_else(|| CoreError::UnknownCommand(format!("Unrecognized command {verb}")))?;
        let args = Args::parse(&verb, handler.schema(), rest)?;

        let ctx = CommandContext {
            topology: &self.topology,
            store: &self.store,
            verbs: self.registry.verbs(),
        };
        catch_unwind(AssertUnwindSafe(|| handler.execute(&args, &ctx))).unwrap_or_else(|_| {
            error!(command = line, "command handler panicked");
            Err(CoreError::Internal("Internal error".into()))
        })
    }
}

#[cfg(test)]
#[path = "tests/interpreter_tests.rs"]
mod tests;
