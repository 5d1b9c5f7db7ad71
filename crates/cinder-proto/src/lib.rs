//! IRC wire protocol primitives for cinderd.
//!
//! This crate owns everything that touches raw protocol bytes: the
//! 512-byte line framer, the zero-copy message parser, the scandinavian
//! case mapping, numeric replies, and name validity rules. It knows
//! nothing about connections or server state.

pub mod casemap;
pub mod error;
pub mod framer;
pub mod message;
pub mod reply;
pub mod trie;
pub mod validation;

pub use casemap::{irc_eq, irc_to_lower};
pub use error::MessageParseError;
pub use framer::{FramingError, LineFramer};
pub use message::{MAX_PARAMS, MessageRef};
pub use reply::Reply;
pub use validation::{MAX_CHANNEL_NAME_LENGTH, MAX_NICK_LENGTH, is_valid_channel_name, is_valid_nick};

/// Maximum length of a single IRC line on the wire, terminators included.
pub const MAX_MESSAGE_SIZE: usize = 512;
