//! Line codec speaking [`Message`].

use bananaboat_proto::Message;
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};
use tracing::warn;

/// Longest accepted inbound line, tags included.
pub const MAX_LINE_LENGTH: usize = 8191;

/// Frames CRLF-terminated lines and parses them into messages.
///
/// Unparsable lines are logged and skipped rather than failing the stream.
pub struct IrcCodec {
    lines: LinesCodec,
}

impl IrcCodec {
    pub fn new() -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
        }
    }
}

impl Default for IrcCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for IrcCodec {
    type Item = Message;
    type Error = LinesCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, LinesCodecError> {
        while let Some(line) = self.lines.decode(src)? {
            if let Some(message) = parse_line(&line) {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>, LinesCodecError> {
        while let Some(line) = self.lines.decode_eof(src)? {
            if let Some(message) = parse_line(&line) {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }
}

impl Encoder<Message> for IrcCodec {
    type Error = LinesCodecError;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<(), LinesCodecError> {
        let line: String = message
            .to_string()
            .chars()
            .filter(|c| !matches!(c, '\r' | '\n' | '\0'))
            .collect();
        dst.reserve(line.len() + 2);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

fn parse_line(line: &str) -> Option<Message> {
    let line = line.trim_end_matches('\r');
    if line.is_empty() {
        return None;
    }
    match line.parse::<Message>() {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(line = %line, error = %e, "Skipping unparsable line");
            None
        }
    }
}
