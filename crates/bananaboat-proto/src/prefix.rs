//! IRC message prefix.
//!
//! A prefix identifies the origin of a message: either a bare server name or a
//! user's `nick!user@host` mask.

use std::fmt;

/// IRC message prefix.
///
/// Server prefixes carry only a `name`; user prefixes may carry any of the
/// three parts. Parsing is lenient and never fails.
#[derive(Clone, Default, Eq, PartialEq, Debug, Hash)]
pub struct Prefix {
    /// Nickname or server name.
    pub name: String,
    /// Username (`!user`), if present.
    pub user: Option<String>,
    /// Hostname (`@host`), if present.
    pub host: Option<String>,
}

impl Prefix {
    /// Create a user prefix from its three parts.
    pub fn new(nick: impl Into<String>, user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: nick.into(),
            user: Some(user.into()),
            host: Some(host.into()),
        }
    }

    /// Parse a prefix string (without the leading `:`).
    pub fn parse(s: &str) -> Self {
        let (rest, host) = match s.split_once('@') {
            Some((rest, host)) => (rest, Some(host.to_owned())),
            None => (s, None),
        };
        let (name, user) = match rest.split_once('!') {
            Some((name, user)) => (name, Some(user.to_owned())),
            None => (rest, None),
        };

        Self {
            name: name.to_owned(),
            user,
            host,
        }
    }

    /// Username, or an empty string when absent.
    pub fn user_or_empty(&self) -> &str {
        self.user.as_deref().unwrap_or("")
    }

    /// Hostname, or an empty string when absent.
    pub fn host_or_empty(&self) -> &str {
        self.host.as_deref().unwrap_or("")
    }
}

impl From<&str> for Prefix {
    fn from(s: &str) -> Self {
        Prefix::parse(s)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(user) = &self.user {
            write!(f, "!{}", user)?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{}", host)?;
        }
        Ok(())
    }
}
