//! Validation of the table a script returns on load.
//!
//! Everything is checked and converted before any bot state is touched, so a
//! rejected reload leaves the previous handlers, defaults and servers intact.

use mlua::{Function, Table, Value};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::warn;

use super::registry::normalize_command;
use crate::config::BotConfig;
use crate::network::ServerSettings;

/// Reasons a script's return value is rejected as a whole.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("unexpected return type: {0}")]
    NotATable(&'static str),

    #[error("unexpected handlers type: {0}")]
    HandlersNotATable(&'static str),

    #[error("unexpected servers type: {0}")]
    ServersNotATable(&'static str),

    #[error(transparent)]
    Lua(#[from] mlua::Error),
}

/// Bot-wide identity used by servers that don't set their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotDefaults {
    pub nick: String,
    pub realname: String,
    pub username: String,
}

impl Default for BotDefaults {
    fn default() -> Self {
        Self {
            nick: "BananaBoatBot".to_string(),
            realname: "Banana Boat Bot".to_string(),
            username: "bananarama".to_string(),
        }
    }
}

impl BotDefaults {
    /// Apply the overrides present (and non-empty) in `table`.
    fn merged(&self, table: &Table) -> Result<Self, mlua::Error> {
        Ok(Self {
            nick: non_empty_string(table, "nick")?.unwrap_or_else(|| self.nick.clone()),
            realname: non_empty_string(table, "realname")?
                .unwrap_or_else(|| self.realname.clone()),
            username: non_empty_string(table, "username")?
                .unwrap_or_else(|| self.username.clone()),
        })
    }
}

/// A fully validated script definition.
#[derive(Debug)]
pub struct ScriptDefinition {
    pub defaults: BotDefaults,
    /// Handlers keyed by normalised command name.
    pub handlers: HashMap<String, Function>,
    /// Desired servers keyed by configured name.
    pub servers: BTreeMap<String, ServerSettings>,
}

impl ScriptDefinition {
    /// Validate the value returned by the script.
    ///
    /// `current` supplies the defaults that the script does not override.
    pub fn from_value(
        value: Value,
        current: &BotDefaults,
        config: &BotConfig,
    ) -> Result<Self, DefinitionError> {
        let root = match value {
            Value::Table(table) => table,
            other => return Err(DefinitionError::NotATable(other.type_name())),
        };

        let defaults = current.merged(&root)?;

        let handlers = match root.raw_get::<Value>("handlers")? {
            Value::Table(table) => parse_handlers(&table)?,
            other => return Err(DefinitionError::HandlersNotATable(other.type_name())),
        };

        let servers = match root.raw_get::<Value>("servers")? {
            Value::Nil => BTreeMap::new(),
            Value::Table(table) => parse_servers(&table, &defaults, config)?,
            other => return Err(DefinitionError::ServersNotATable(other.type_name())),
        };

        Ok(Self {
            defaults,
            handlers,
            servers,
        })
    }
}

fn parse_handlers(table: &Table) -> Result<HashMap<String, Function>, mlua::Error> {
    let mut handlers = HashMap::new();
    for pair in table.pairs::<Value, Value>() {
        let (key, value) = pair?;
        let Value::String(command) = key else {
            warn!(key = ?key, "Skipping handler with non-string command name");
            continue;
        };
        let command = command.to_str()?.to_string();
        match value {
            Value::Function(f) => {
                handlers.insert(normalize_command(&command), f);
            }
            other => {
                warn!(command = %command, found = other.type_name(), "Skipping non-function handler");
            }
        }
    }
    Ok(handlers)
}

fn parse_servers(
    table: &Table,
    defaults: &BotDefaults,
    config: &BotConfig,
) -> Result<BTreeMap<String, ServerSettings>, mlua::Error> {
    let mut servers = BTreeMap::new();
    for pair in table.pairs::<Value, Value>() {
        let (key, value) = pair?;
        let Value::String(name) = key else {
            warn!(key = ?key, "Skipping server with non-string name");
            continue;
        };
        let name = name.to_str()?.to_string();
        let Value::Table(entry) = value else {
            warn!(server = %name, found = value.type_name(), "Skipping server: entry is not a table");
            continue;
        };
        if let Some(settings) = parse_server(&name, &entry, defaults, config)? {
            servers.insert(name, settings);
        }
    }
    Ok(servers)
}

fn parse_server(
    name: &str,
    entry: &Table,
    defaults: &BotDefaults,
    config: &BotConfig,
) -> Result<Option<ServerSettings>, mlua::Error> {
    let Some(host) = non_empty_string(entry, "server")? else {
        warn!(server = %name, "Skipping server: no host");
        return Ok(None);
    };

    let port = match entry.raw_get::<Value>("port")? {
        Value::Nil => config.default_port,
        Value::Integer(port) => match u16::try_from(port) {
            Ok(port) if port > 0 => port,
            _ => {
                warn!(server = %name, port, "Skipping server: port out of range");
                return Ok(None);
            }
        },
        Value::Number(port) if port.fract() == 0.0 && port >= 1.0 && port <= f64::from(u16::MAX) => {
            port as u16
        }
        other => {
            warn!(server = %name, found = ?other, "Skipping server: invalid port");
            return Ok(None);
        }
    };

    let tls = matches!(entry.raw_get::<Value>("tls")?, Value::Boolean(true));
    let verify_tls = !matches!(entry.raw_get::<Value>("tls_verify")?, Value::Boolean(false));

    Ok(Some(ServerSettings {
        host,
        port,
        tls,
        verify_tls,
        nick: non_empty_string(entry, "nick")?.unwrap_or_else(|| defaults.nick.clone()),
        username: non_empty_string(entry, "username")?
            .unwrap_or_else(|| defaults.username.clone()),
        realname: non_empty_string(entry, "realname")?
            .unwrap_or_else(|| defaults.realname.clone()),
        max_reconnect: config.max_reconnect,
    }))
}

fn non_empty_string(table: &Table, key: &str) -> Result<Option<String>, mlua::Error> {
    match table.raw_get::<Value>(key)? {
        Value::String(s) if !s.as_bytes().is_empty() => Ok(Some(s.to_str()?.to_string())),
        _ => Ok(None),
    }
}
