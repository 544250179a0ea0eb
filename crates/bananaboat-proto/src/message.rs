use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::{MessageParseError, ProtocolError};
use crate::parser::ParsedMessage;
use crate::prefix::Prefix;

/// An owned IRC message.
///
/// The command is kept as the raw token (`PRIVMSG`, `001`, ...) and parameters
/// as an ordered list with the trailing parameter already unwrapped.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Message {
    /// Message source, if any.
    pub prefix: Option<Prefix>,
    /// Command name or three-digit numeric.
    pub command: String,
    /// Parameters in order.
    pub params: Vec<String>,
}

impl Message {
    /// Create a prefix-less message, as a client sends it.
    pub fn new<C, I, P>(command: C, params: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            prefix: None,
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Attach a prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        if s.trim_end_matches(['\r', '\n']).is_empty() {
            return Err(ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause: MessageParseError::EmptyMessage,
            });
        }

        let parsed =
            ParsedMessage::parse(s).map_err(|(position, kind)| ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause: MessageParseError::ParseContext {
                    position,
                    context: format!("{:?}", kind),
                },
            })?;

        Ok(Message {
            prefix: parsed.prefix.map(Prefix::parse),
            command: parsed.command.to_owned(),
            params: parsed.params.iter().map(|p| (*p).to_owned()).collect(),
        })
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(ref prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }

        write!(f, "{}", self.command)?;

        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            let needs_trailing = param.is_empty() || param.contains(' ') || param.starts_with(':');
            if i == last && needs_trailing {
                write!(f, " :{}", param)?;
            } else {
                write!(f, " {}", param)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_privmsg() {
        let msg: Message = ":nick!user@host PRIVMSG #channel :Hello, world!\r\n"
            .parse()
            .unwrap();
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.prefix.as_ref().map(|p| p.name.as_str()), Some("nick"));
        assert_eq!(msg.params, vec!["#channel", "Hello, world!"]);
    }

    #[test]
    fn test_parse_without_prefix() {
        let msg: Message = "PING :irc.example.net".parse().unwrap();
        assert!(msg.prefix.is_none());
        assert_eq!(msg.params, vec!["irc.example.net"]);
    }

    #[test]
    fn test_empty_is_error() {
        assert!("".parse::<Message>().is_err());
        assert!("\r\n".parse::<Message>().is_err());
    }

    #[test]
    fn test_display_trailing_rules() {
        assert_eq!(
            Message::new("PRIVMSG", ["#chan", "hi"]).to_string(),
            "PRIVMSG #chan hi"
        );
        assert_eq!(
            Message::new("PRIVMSG", ["#chan", "hi there"]).to_string(),
            "PRIVMSG #chan :hi there"
        );
        assert_eq!(
            Message::new("TOPIC", ["#chan", ""]).to_string(),
            "TOPIC #chan :"
        );
        assert_eq!(
            Message::new("PRIVMSG", ["#chan", ":)"]).to_string(),
            "PRIVMSG #chan ::)"
        );
    }

    #[test]
    fn test_display_with_prefix() {
        let msg = Message::new("JOIN", ["#chan"]).with_prefix(Prefix::new("n", "u", "h"));
        assert_eq!(msg.to_string(), ":n!u@h JOIN #chan");
    }

    #[test]
    fn test_serialized_line_parses_back() {
        let msg = Message::new("USER", ["bananarama", "0", "*", "Banana Boat Bot"]);
        let reparsed: Message = msg.to_string().parse().unwrap();
        assert_eq!(reparsed, msg);
    }
}
