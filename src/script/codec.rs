//! Mapping between events/actions and Lua call arguments/return values.

use mlua::{Table, Value, Variadic};
use thiserror::Error;

use crate::event::{Action, Event};

/// A handler returned something that isn't a list of actions.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("handler returned a {0}, expected nil or a table")]
    NotATable(&'static str),

    #[error("action #{index} is a {found}, expected a table")]
    ActionNotATable { index: usize, found: &'static str },

    #[error("action #{index} has no string command")]
    MissingCommand { index: usize },

    #[error("action #{index} has params of type {found}, expected a table")]
    ParamsNotATable { index: usize, found: &'static str },

    #[error("action #{index} param #{param} is a {found}, expected a string")]
    BadParam {
        index: usize,
        param: usize,
        found: &'static str,
    },

    #[error(transparent)]
    Lua(#[from] mlua::Error),
}

/// Handler arguments: network, nick, user, host, then each parameter.
///
/// Sender parts the message doesn't carry are passed as empty strings.
pub fn event_args(event: &Event) -> Variadic<String> {
    let mut args = Variadic::new();
    args.push(event.network.clone());
    args.push(event.sender_nick.clone().unwrap_or_default());
    args.push(event.sender_user.clone().unwrap_or_default());
    args.push(event.sender_host.clone().unwrap_or_default());
    args.extend(event.params.iter().cloned());
    args
}

/// Decode a handler's return value into actions.
///
/// `nil` means no actions. A missing or empty `net` targets `origin`.
pub fn actions_from_value(origin: &str, value: Value) -> Result<Vec<Action>, CodecError> {
    let list = match value {
        Value::Nil => return Ok(Vec::new()),
        Value::Table(table) => table,
        other => return Err(CodecError::NotATable(other.type_name())),
    };

    let mut actions = Vec::new();
    for (i, entry) in list.sequence_values::<Value>().enumerate() {
        let index = i + 1;
        let record = match entry? {
            Value::Table(record) => record,
            other => {
                return Err(CodecError::ActionNotATable {
                    index,
                    found: other.type_name(),
                });
            }
        };
        actions.push(action_from_record(origin, index, &record)?);
    }
    Ok(actions)
}

fn action_from_record(origin: &str, index: usize, record: &Table) -> Result<Action, CodecError> {
    let command = match record.raw_get::<Value>("command")? {
        Value::String(s) if !s.as_bytes().is_empty() => s.to_str()?.to_string(),
        _ => return Err(CodecError::MissingCommand { index }),
    };

    let network = match record.raw_get::<Value>("net")? {
        Value::String(s) if !s.as_bytes().is_empty() => s.to_str()?.to_string(),
        _ => origin.to_owned(),
    };

    let params = match record.raw_get::<Value>("params")? {
        Value::Nil => Vec::new(),
        Value::Table(params) => {
            let mut out = Vec::new();
            for (j, param) in params.sequence_values::<Value>().enumerate() {
                out.push(param_to_string(index, j + 1, param?)?);
            }
            out
        }
        other => {
            return Err(CodecError::ParamsNotATable {
                index,
                found: other.type_name(),
            });
        }
    };

    Ok(Action {
        network,
        command,
        params,
    })
}

/// Strings pass through; numbers are formatted the way Lua's `tostring` would.
fn param_to_string(index: usize, param: usize, value: Value) -> Result<String, CodecError> {
    match value {
        Value::String(s) => Ok(s.to_str()?.to_string()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Number(n) => Ok(lua_number_string(n)),
        other => Err(CodecError::BadParam {
            index,
            param,
            found: other.type_name(),
        }),
    }
}

/// `%.14g`, plus a trailing `.0` when the result reads as an integer.
fn lua_number_string(n: f64) -> String {
    if n.is_nan() {
        return if n.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if n.is_infinite() {
        return if n < 0.0 { "-inf" } else { "inf" }.to_string();
    }

    // Rounds to 14 significant digits and yields the decimal exponent.
    let scientific = format!("{n:.13e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let mut out = if (-4..14).contains(&exponent) {
        let decimals = (13 - exponent) as usize;
        trim_fraction(&format!("{n:.decimals$}")).to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exponent.abs())
    };

    if out.chars().all(|c| c == '-' || c.is_ascii_digit()) {
        out.push_str(".0");
    }
    out
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlua::Lua;

    fn eval(lua: &Lua, src: &str) -> Value {
        lua.load(src).eval().unwrap()
    }

    #[test]
    fn test_event_args_without_prefix() {
        let event = Event::new("net", "PING", ["token"]);
        let args: Vec<String> = event_args(&event).iter().cloned().collect();
        assert_eq!(args, vec!["net", "", "", "", "token"]);
    }

    #[test]
    fn test_event_args_with_prefix() {
        let mut event = Event::new("net", "PRIVMSG", ["#chan", "hi"]);
        event.sender_nick = Some("n".into());
        event.sender_host = Some("h".into());
        let args: Vec<String> = event_args(&event).iter().cloned().collect();
        assert_eq!(args, vec!["net", "n", "", "h", "#chan", "hi"]);
    }

    #[test]
    fn test_nil_is_no_actions() {
        assert!(actions_from_value("net", Value::Nil).unwrap().is_empty());
    }

    #[test]
    fn test_defaults() {
        let lua = Lua::new();
        let value = eval(
            &lua,
            r##"return {
                { command = "PRIVMSG", params = { "#chan", "hello" } },
                { command = "QUIT", net = "" },
                { command = "JOIN", net = "other", params = { "#x", 5 } },
            }"##,
        );
        let actions = actions_from_value("origin", value).unwrap();
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].network, "origin");
        assert_eq!(actions[0].params, vec!["#chan", "hello"]);
        assert_eq!(actions[1].network, "origin");
        assert!(actions[1].params.is_empty());
        assert_eq!(actions[2].network, "other");
        assert_eq!(actions[2].params, vec!["#x", "5"]);
    }

    #[test]
    fn test_number_params_match_tostring() {
        let lua = Lua::new();
        let value = eval(
            &lua,
            "return { { command = 'X', params = { 5.0, 1e20, 2.5, 1e-5, 0.1, -3.0, 1/0, 2^53 } } }",
        );
        let actions = actions_from_value("n", value).unwrap();
        let expected: Vec<String> = lua
            .load("return { tostring(5.0), tostring(1e20), tostring(2.5), tostring(1e-5), tostring(0.1), tostring(-3.0), tostring(1/0), tostring(2^53) }")
            .eval::<Vec<String>>()
            .unwrap();
        assert_eq!(actions[0].params, expected);
        assert_eq!(
            actions[0].params,
            vec!["5.0", "1e+20", "2.5", "1e-05", "0.1", "-3.0", "inf", "9.007199254741e+15"]
        );
    }

    #[test]
    fn test_contract_violations() {
        let lua = Lua::new();
        assert!(matches!(
            actions_from_value("n", eval(&lua, "return 'nope'")),
            Err(CodecError::NotATable("string"))
        ));
        assert!(matches!(
            actions_from_value("n", eval(&lua, "return { 1 }")),
            Err(CodecError::ActionNotATable { index: 1, .. })
        ));
        assert!(matches!(
            actions_from_value("n", eval(&lua, "return { { params = {} } }")),
            Err(CodecError::MissingCommand { index: 1 })
        ));
        assert!(matches!(
            actions_from_value("n", eval(&lua, "return { { command = 'X', params = 'a' } }")),
            Err(CodecError::ParamsNotATable { index: 1, .. })
        ));
        assert!(matches!(
            actions_from_value("n", eval(&lua, "return { { command = 'X', params = { {} } } }")),
            Err(CodecError::BadParam { index: 1, param: 1, .. })
        ));
    }
}
