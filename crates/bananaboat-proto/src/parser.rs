//! Nom-based IRC line parser.
//!
//! Produces borrowed slices into the input; [`crate::Message`] converts them to
//! owned strings.

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    error::ErrorKind,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

/// RFC 2812 caps a message at 15 parameters.
const MAX_PARAMS: usize = 15;

/// Parse IRCv3 message tags (the part after `@` and before the first space).
fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_until(" "))(input)
}

/// Parse message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Parse the command name (1*letter or 3digit).
fn parse_command(input: &str) -> IResult<&str, &str> {
    let (rest, cmd) = take_while1(|c: char| c.is_ascii_alphanumeric())(input)?;

    let is_all_letters = cmd.chars().all(|c| c.is_ascii_alphabetic());
    let is_three_digits = cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit());

    if is_all_letters || is_three_digits {
        Ok((rest, cmd))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::AlphaNumeric,
        )))
    }
}

/// Parse parameters after the command, including the trailing one.
///
/// Consecutive spaces collapse into a single separator.
fn parse_params(input: &str) -> (&str, SmallVec<[&str; MAX_PARAMS]>) {
    let mut params: SmallVec<[&str; MAX_PARAMS]> = SmallVec::new();
    let mut rest = input;

    while rest.starts_with(' ') {
        if params.len() >= MAX_PARAMS {
            break;
        }

        rest = rest.trim_start_matches(' ');

        if rest.is_empty() || rest.starts_with('\r') || rest.starts_with('\n') {
            break;
        }

        if let Some(after_colon) = rest.strip_prefix(':') {
            let end = after_colon.find(['\r', '\n']).unwrap_or(after_colon.len());
            params.push(&after_colon[..end]);
            rest = &after_colon[end..];
            break;
        }

        let end = rest.find([' ', '\r', '\n']).unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }

    (rest, params)
}

/// Parse a complete IRC line:
///
/// ```text
/// [@tags] [:prefix] <command> [params...] [:trailing]
/// ```
fn parse_message(input: &str) -> IResult<&str, ParsedMessage<'_>> {
    // Tags are accepted so servers with message-tags enabled don't break us,
    // but nothing downstream consumes them.
    let (input, _tags) = opt(parse_tags)(input)?;
    let (input, _) = space0(input)?;

    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;

    let (input, command) = parse_command(input)?;
    let (rest, params) = parse_params(input);

    Ok((
        rest,
        ParsedMessage {
            prefix,
            command,
            params,
        },
    ))
}

/// A parsed IRC message borrowing from its input.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedMessage<'a> {
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub params: SmallVec<[&'a str; MAX_PARAMS]>,
}

impl<'a> ParsedMessage<'a> {
    /// Parse a line, reporting the byte position where parsing stopped on failure.
    pub fn parse(input: &'a str) -> Result<Self, (usize, ErrorKind)> {
        match parse_message(input) {
            Ok((_remaining, msg)) => Ok(msg),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                Err((input.len() - e.input.len(), e.code))
            }
            Err(nom::Err::Incomplete(_)) => Err((input.len(), ErrorKind::Eof)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_tags_and_prefix() {
        let parsed =
            ParsedMessage::parse("@time=2023-01-01T00:00:00Z :nick!u@h PRIVMSG #ch :hi there")
                .unwrap();
        assert_eq!(parsed.prefix, Some("nick!u@h"));
        assert_eq!(parsed.command, "PRIVMSG");
        assert_eq!(parsed.params.as_slice(), &["#ch", "hi there"]);
    }

    #[test]
    fn test_parse_numeric() {
        let parsed = ParsedMessage::parse(":irc.example.net 001 bot :Welcome").unwrap();
        assert_eq!(parsed.command, "001");
        assert_eq!(parsed.params.as_slice(), &["bot", "Welcome"]);
    }

    #[test]
    fn test_parse_collapses_spaces() {
        let parsed = ParsedMessage::parse("MODE  #ch   +o    nick").unwrap();
        assert_eq!(parsed.params.as_slice(), &["#ch", "+o", "nick"]);
    }

    #[test]
    fn test_parse_empty_trailing() {
        let parsed = ParsedMessage::parse("TOPIC #ch :").unwrap();
        assert_eq!(parsed.params.as_slice(), &["#ch", ""]);
    }

    #[test]
    fn test_rejects_mixed_command() {
        assert!(ParsedMessage::parse("PRIV1MSG #ch :x").is_err());
        assert!(ParsedMessage::parse("0001 x").is_err());
    }

    #[test]
    fn test_stops_at_line_ending() {
        let parsed = ParsedMessage::parse("PING :token\r\n").unwrap();
        assert_eq!(parsed.params.as_slice(), &["token"]);
    }
}
