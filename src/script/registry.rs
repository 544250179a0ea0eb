//! Command handler registry.
//!
//! Maps IRC command names to script callables. The whole map is swapped on
//! reload so lookups never see a half-built registry.

use mlua::Function;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Command names are case-insensitive on the wire.
pub fn normalize_command(command: &str) -> String {
    command.to_ascii_uppercase()
}

/// Registry of script handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Function>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, command: &str) -> Option<Function> {
        self.handlers.read().get(&normalize_command(command)).cloned()
    }

    pub fn contains(&self, command: &str) -> bool {
        self.handlers.read().contains_key(&normalize_command(command))
    }

    /// Replace every handler at once. Commands absent from `handlers` are gone
    /// afterwards.
    pub fn replace(&self, handlers: HashMap<String, Function>) {
        let handlers = handlers
            .into_iter()
            .map(|(command, f)| (normalize_command(&command), f))
            .collect();
        *self.handlers.write() = handlers;
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> Vec<String> {
        let mut commands: Vec<String> = self.handlers.read().keys().cloned().collect();
        commands.sort();
        commands
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}
