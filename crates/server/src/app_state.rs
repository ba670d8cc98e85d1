use std::sync::Arc;

use command_core::Interpreter;
use shared::protocol::StateEnvelope;
use tokio::sync::broadcast;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) interpreter: Arc<Interpreter>,
    pub(crate) snapshots: broadcast::Sender<StateEnvelope>,
}

impl AppState {
    pub(crate) fn new(interpreter: Arc<Interpreter>, channel_capacity: usize) -> Self {
        let (snapshots, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            interpreter,
            snapshots,
        }
    }

    pub(crate) fn envelope(&self) -> StateEnvelope {
        StateEnvelope::now(self.interpreter.snapshot())
    }

    /// Pushes the current state to every dashboard socket. Having no
    /// subscribers is not an error.
    pub(crate) fn publish(&self) {
        let _ = self.snapshots.send(self.envelope());
    }
}
