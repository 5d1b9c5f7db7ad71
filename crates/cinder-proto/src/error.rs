//! Parse error types.

use thiserror::Error;

/// Errors produced when a single protocol line fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageParseError {
    #[error("empty message")]
    EmptyMessage,

    #[error("prefix announced but no body follows")]
    EmptyPrefix,

    #[error("missing or malformed command")]
    InvalidCommand,

    #[error("too many parameters (limit {limit})")]
    TooManyParams { limit: usize },
}
