use std::{collections::HashMap, sync::Arc};

use layout_store::LayoutStore;
use shared::error::CoreError;
use thiserror::Error;
use topology::Topology;

use crate::args::{ArgSpec, Args};

/// Everything a handler may consult while executing one command.
pub struct CommandContext<'a> {
    pub topology: &'a Topology,
    pub store: &'a LayoutStore,
    /// Registered verbs in registration order.
    pub verbs: &'a [String],
}

/// Successful handler result: the status-line detail and, for listing
/// verbs, the extra response lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub detail: String,
    pub lines: Vec<String>,
}

impl Outcome {
    pub fn detail(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            lines: Vec::new(),
        }
    }

    pub fn listing(detail: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            detail: detail.into(),
            lines,
        }
    }
}

/// One verb's state transition.
///
/// Arguments arrive already checked against [`CommandHandler::schema`].
/// A mutating handler must do all of its work inside a single
/// [`LayoutStore::transact`] call and validate every precondition before its
/// first `place`/`remove`.
pub trait CommandHandler: Send + Sync {
    fn schema(&self) -> &'static [ArgSpec] {
        &[]
    }

    fn execute(&self, args: &Args, ctx: &CommandContext<'_>) -> Result<Outcome, CoreError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("verb '{0}' is already registered")]
    Duplicate(String),
    #[error("invalid verb '{0}'")]
    InvalidVerb(String),
}

/// Verb name to handler table. Lookups are case-insensitive.
#[derive(Default, Clone)]
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    order: Vec<String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every verb the simulator ships with.
    pub fn standard() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        crate::handlers::register_defaults(&mut registry)?;
        Ok(registry)
    }

    pub fn register<H>(&mut self, verb: &str, handler: H) -> Result<(), RegistryError>
    where
        H: CommandHandler + 'static,
    {
        let verb = verb.trim();
        if verb.is_empty() || verb.contains(|c: char| c.is_whitespace() || c == ',') {
            return Err(RegistryError::InvalidVerb(verb.to_string()));
        }
        let verb = verb.to_ascii_uppercase();
        if self.handlers.contains_key(&verb) {
            return Err(RegistryError::Duplicate(verb));
        }
        self.handlers.insert(verb.clone(), Arc::new(handler));
        self.order.push(verb);
        Ok(())
    }

    pub fn get(&self, verb: &str) -> Option<&dyn CommandHandler> {
        self.handlers
            .get(&verb.to_ascii_uppercase())
            .map(|handler| handler.as_ref())
    }

    pub fn verbs(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("verbs", &self.order)
            .finish()
    }
}
