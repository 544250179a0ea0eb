//! Lua scripting bridge.
//!
//! - [`codec`]: event arguments in, actions out
//! - [`definition`]: validation of the table a script returns on load
//! - [`registry`]: command → handler map
//! - [`pool`]: shared interpreter and worker pool
//! - [`portable`]: moving callables and values between interpreters
//! - [`library`]: the `bananaboat` module scripts `require`

pub mod codec;
pub mod definition;
pub mod library;
pub mod pool;
pub mod portable;
pub mod registry;

pub use codec::{CodecError, actions_from_value, event_args};
pub use definition::{BotDefaults, DefinitionError, ScriptDefinition};
pub use library::{MODULE_NAME, ScriptLibrary, new_interpreter};
pub use pool::{CallContext, CallScope, InterpreterPool, WorkerJob};
pub use portable::{PortableError, PortableFunction, PortableValue};
pub use registry::HandlerRegistry;
