//! Interpreter-independent copies of Lua values.
//!
//! A worker call runs on a different interpreter than the one that scheduled
//! it, so its callable and arguments are captured here first: plain values are
//! deep-copied and functions are carried as bytecode. Upvalues are not
//! transferred: a restored function's `_ENV` is the worker's globals and every
//! other captured local starts out nil.

use mlua::{ChunkMode, Function, Lua, MultiValue, Table, Value};
use thiserror::Error;

/// Maximum table nesting accepted when capturing (also stops on cycles).
pub const MAX_DEPTH: usize = 32;

/// Chunk name given to restored functions in tracebacks.
const RESTORED_CHUNK_NAME: &str = "=worker";

/// Registry slot holding the `debug` library, out of reach of scripts.
const DEBUG_REGISTRY_KEY: &str = "bananaboat.debug";

#[derive(Debug, Error)]
pub enum PortableError {
    #[error("cannot pass a {0} to a worker")]
    Unsupported(&'static str),

    #[error("table nesting deeper than {MAX_DEPTH} (or cyclic)")]
    TooDeep,

    #[error("only Lua functions can be passed to a worker")]
    NotLuaFunction,

    #[error(transparent)]
    Lua(#[from] mlua::Error),
}

/// A Lua function reduced to its bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortableFunction {
    bytecode: Vec<u8>,
}

impl PortableFunction {
    pub fn capture(function: &Function) -> Result<Self, PortableError> {
        let bytecode = function.dump(false);
        if bytecode.is_empty() {
            return Err(PortableError::NotLuaFunction);
        }
        Ok(Self { bytecode })
    }

    /// Load the function into `lua`. Its environment is `lua`'s globals.
    pub fn restore(&self, lua: &Lua) -> mlua::Result<Function> {
        let function = lua
            .load(&self.bytecode[..])
            .set_name(RESTORED_CHUNK_NAME)
            .set_mode(ChunkMode::Binary)
            .into_function()?;
        bind_upvalues(lua, &function)?;
        Ok(function)
    }
}

/// Move the `debug` library from the globals into the registry.
///
/// Requires an interpreter opened with `StdLib::DEBUG`.
pub(super) fn stash_debug_library(lua: &Lua) -> mlua::Result<()> {
    let globals = lua.globals();
    let debug: Table = globals.get("debug")?;
    lua.set_named_registry_value(DEBUG_REGISTRY_KEY, debug)?;
    globals.raw_set("debug", Value::Nil)?;
    let package: Table = globals.get("package")?;
    let loaded: Table = package.get("loaded")?;
    loaded.raw_set("debug", Value::Nil)?;
    Ok(())
}

/// Point `_ENV` at `lua`'s globals and clear every other upvalue.
///
/// Loading a binary chunk stores the globals in the first upvalue whatever
/// its name is, so upvalues are matched by name here.
fn bind_upvalues(lua: &Lua, function: &Function) -> mlua::Result<()> {
    let debug: Table = lua.named_registry_value(DEBUG_REGISTRY_KEY)?;
    let get_upvalue: Function = debug.get("getupvalue")?;
    let set_upvalue: Function = debug.get("setupvalue")?;

    for index in 1i64.. {
        let Some(name) = get_upvalue.call::<Option<String>>((function.clone(), index))? else {
            break;
        };
        let value = if name == "_ENV" {
            Value::Table(lua.globals())
        } else {
            Value::Nil
        };
        set_upvalue.call::<()>((function.clone(), index, value))?;
    }
    Ok(())
}

/// Deep copy of a Lua value.
#[derive(Debug, Clone, PartialEq)]
pub enum PortableValue {
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(Vec<u8>),
    Table(Vec<(PortableValue, PortableValue)>),
    Function(PortableFunction),
}

impl PortableValue {
    pub fn capture(value: &Value) -> Result<Self, PortableError> {
        Self::capture_at(value, 0)
    }

    fn capture_at(value: &Value, depth: usize) -> Result<Self, PortableError> {
        Ok(match value {
            Value::Nil => Self::Nil,
            Value::Boolean(b) => Self::Boolean(*b),
            Value::Integer(i) => Self::Integer(*i),
            Value::Number(n) => Self::Number(*n),
            Value::String(s) => Self::String(s.as_bytes().to_vec()),
            Value::Function(f) => Self::Function(PortableFunction::capture(f)?),
            Value::Table(table) => {
                if depth >= MAX_DEPTH {
                    return Err(PortableError::TooDeep);
                }
                let mut entries = Vec::new();
                for pair in table.pairs::<Value, Value>() {
                    let (k, v) = pair?;
                    entries.push((Self::capture_at(&k, depth + 1)?, Self::capture_at(&v, depth + 1)?));
                }
                Self::Table(entries)
            }
            other => return Err(PortableError::Unsupported(other.type_name())),
        })
    }

    /// Rebuild the value inside `lua`, restoring nested functions too.
    pub fn restore(&self, lua: &Lua) -> mlua::Result<Value> {
        Ok(match self {
            Self::Nil => Value::Nil,
            Self::Boolean(b) => Value::Boolean(*b),
            Self::Integer(i) => Value::Integer(*i),
            Self::Number(n) => Value::Number(*n),
            Self::String(bytes) => Value::String(lua.create_string(bytes)?),
            Self::Function(f) => Value::Function(f.restore(lua)?),
            Self::Table(entries) => {
                let table = lua.create_table_with_capacity(0, entries.len())?;
                for (k, v) in entries {
                    table.raw_set(k.restore(lua)?, v.restore(lua)?)?;
                }
                Value::Table(table)
            }
        })
    }
}

/// Capture every value of a call's argument list.
pub fn capture_args(args: &MultiValue) -> Result<Vec<PortableValue>, PortableError> {
    args.iter().map(PortableValue::capture).collect()
}

/// Rebuild an argument list inside `lua`.
pub fn restore_args(lua: &Lua, args: &[PortableValue]) -> mlua::Result<MultiValue> {
    args.iter()
        .map(|arg| arg.restore(lua))
        .collect::<mlua::Result<Vec<_>>>()
        .map(MultiValue::from_vec)
}
