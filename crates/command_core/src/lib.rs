//! Command Interpreter and Command Handlers for the StackLink simulator.
//!
//! ```text
//! raw line -> Interpreter::interpret -> CommandRegistry lookup
//!          -> Args::parse (schema) -> CommandHandler::execute -> Response
//! ```

pub mod args;
pub mod handlers;
pub mod interpreter;
pub mod registry;

pub use args::{ArgKind, ArgSpec, ArgValue, Args};
pub use interpreter::Interpreter;
pub use registry::{CommandContext, CommandHandler, CommandRegistry, Outcome, RegistryError};
