//! IRC message types for bananaboatbot.
//!
//! Only the parts of the protocol the bot actually touches live here: an owned
//! [`Message`] with an optional [`Prefix`], a nom-based parser, and a
//! serialiser that produces a single line without the trailing CRLF.
//!
//! ```
//! use bananaboat_proto::Message;
//!
//! let msg: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.params, vec!["#channel", "Hello!"]);
//! ```

#![deny(clippy::all)]

mod error;
mod message;
mod parser;
mod prefix;

pub use self::error::{MessageParseError, ProtocolError};
pub use self::message::Message;
pub use self::prefix::Prefix;
