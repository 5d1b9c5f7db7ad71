//! Zero-copy IRC message parsing.
//!
//! A [`MessageRef`] borrows every token from the line it was parsed
//! from, so parsing a framed line allocates only the parameter vector.
//!
//! Grammar (RFC 1459 §2.3):
//!
//! ```text
//! message  := [ ":" prefix SPACE ] command [ SPACE params ]
//! command  := 3DIGIT | 1*LETTER
//! params   := *( SPACE param ) [ SPACE ":" trailing ]
//! ```

use nom::IResult;
use nom::bytes::complete::take_while1;
use nom::character::complete::char;
use nom::sequence::preceded;

use crate::error::MessageParseError;

/// Parameter cap per message; the 16th parameter is a parse error.
pub const MAX_PARAMS: usize = 15;

/// A parsed message borrowing from the input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef<'a> {
    /// Sender prefix, without the leading `:`.
    pub prefix: Option<&'a str>,
    /// Command name, case untouched.
    pub command: &'a str,
    /// Parameters, trailing included.
    pub params: Vec<&'a str>,
    /// Whether the final parameter was introduced with `:`.
    pub has_trailing: bool,
}

/// Parse the sender prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Parse the command token (letters or digits; shape is checked after).
fn parse_command(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric())(input)
}

/// Check the command shape: a word of letters, or exactly three digits.
fn command_shape_ok(cmd: &str) -> bool {
    if cmd.bytes().all(|b| b.is_ascii_alphabetic()) {
        return true;
    }
    cmd.len() == 3 && cmd.bytes().all(|b| b.is_ascii_digit())
}

impl<'a> MessageRef<'a> {
    /// Parse a single framed line (trailing `\r`/`\n` tolerated).
    pub fn parse(s: &'a str) -> Result<MessageRef<'a>, MessageParseError> {
        let line = s.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let mut rest = line;

        let prefix = if rest.starts_with(':') {
            let (after, pfx) = parse_prefix(rest).map_err(|_| MessageParseError::EmptyPrefix)?;
            // A prefix with nothing after it carries no message.
            if after.is_empty() {
                return Err(MessageParseError::EmptyPrefix);
            }
            rest = after.trim_start_matches(' ');
            Some(pfx)
        } else {
            None
        };

        let (after, command) =
            parse_command(rest).map_err(|_| MessageParseError::InvalidCommand)?;
        if !command_shape_ok(command) {
            return Err(MessageParseError::InvalidCommand);
        }
        rest = after;

        let (params, has_trailing) = parse_params(rest)?;

        Ok(MessageRef {
            prefix,
            command,
            params,
            has_trailing,
        })
    }

    /// Parameter at position `i`, if present.
    pub fn arg(&self, i: usize) -> Option<&'a str> {
        self.params.get(i).copied()
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Rebuild the wire form (no terminator). Separator runs collapse to
    /// single spaces; everything else round-trips byte-for-byte.
    pub fn to_line(&self) -> String {
        let mut s = String::new();
        if let Some(prefix) = self.prefix {
            s.push(':');
            s.push_str(prefix);
            s.push(' ');
        }
        s.push_str(self.command);
        for (i, param) in self.params.iter().enumerate() {
            s.push(' ');
            if i + 1 == self.params.len() && self.has_trailing {
                s.push(':');
            }
            s.push_str(param);
        }
        s
    }
}

/// Tokenize the parameter list following the command.
///
/// Runs of spaces separate parameters; a `:` opens the trailing
/// parameter, which swallows the rest of the line.
fn parse_params(input: &str) -> Result<(Vec<&str>, bool), MessageParseError> {
    let mut params: Vec<&str> = Vec::new();
    let mut has_trailing = false;
    let mut rest = input;

    while rest.starts_with(' ') {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }

        if params.len() == MAX_PARAMS {
            return Err(MessageParseError::TooManyParams { limit: MAX_PARAMS });
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            has_trailing = true;
            rest = "";
            break;
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }

    Ok((params, has_trailing))
}
