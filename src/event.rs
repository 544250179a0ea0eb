//! Normalised inbound events and outbound actions.

use bananaboat_proto::Message;

/// An inbound protocol message as seen by scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Configured name of the originating network.
    pub network: String,
    pub sender_nick: Option<String>,
    pub sender_user: Option<String>,
    pub sender_host: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl Event {
    pub fn from_message(network: &str, message: &Message) -> Self {
        let prefix = message.prefix.as_ref();
        Self {
            network: network.to_owned(),
            sender_nick: prefix.map(|p| p.name.clone()),
            sender_user: prefix.and_then(|p| p.user.clone()),
            sender_host: prefix.and_then(|p| p.host.clone()),
            command: message.command.clone(),
            params: message.params.clone(),
        }
    }

    /// Build an event without sender information.
    pub fn new<I, P>(network: &str, command: &str, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            network: network.to_owned(),
            sender_nick: None,
            sender_user: None,
            sender_host: None,
            command: command.to_owned(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }
}

/// An outbound command produced by a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Target network, already defaulted to the originating one.
    pub network: String,
    pub command: String,
    pub params: Vec<String>,
}

impl Action {
    pub fn to_message(&self) -> Message {
        Message::new(self.command.as_str(), self.params.iter().map(String::as_str))
    }
}
