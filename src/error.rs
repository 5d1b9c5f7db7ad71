//! Error taxonomy for command handling and channel operations.
//!
//! Handler errors surface at the dispatch boundary: the supervisor asks
//! [`HandlerError::to_reply`] for the numeric line (if any) after the
//! handler has released every lock, then writes it. `Quit` is not an
//! error reply; it instructs the supervisor to tear the session down.

use cinder_proto::Reply;
use thiserror::Error;

/// Errors produced by command handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("not enough parameters for {0}")]
    NeedMoreParams(String),

    #[error("no recipient for {0}")]
    NoRecipient(String),

    #[error("no text to send")]
    NoTextToSend,

    #[error("no nickname given")]
    NoNicknameGiven,

    #[error("erroneous nickname: {0}")]
    ErroneousNickname(String),

    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    #[error("no such nick: {0}")]
    NoSuchNick(String),

    #[error("no such channel: {0}")]
    NoSuchChannel(String),

    #[error("too many channels: {0}")]
    TooManyChannels(String),

    #[error("no origin specified")]
    NoOrigin,

    #[error("not on channel {0}")]
    NotOnChannel(String),

    #[error("not registered")]
    NotRegistered,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("already registered")]
    AlreadyRegistered,

    /// The client is quitting; carries the reason when one was given.
    #[error("client quit: {0:?}")]
    Quit(Option<String>),

    /// A state invariant failed to hold; logged, never shown to peers.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl HandlerError {
    /// Render the numeric reply line for this error, terminator included.
    ///
    /// `nick` is the registered nickname or `*` before registration.
    /// Returns `None` for conditions that carry no client-visible reply.
    pub fn to_reply(&self, server: &str, nick: &str) -> Option<String> {
        use Reply::*;
        let line = match self {
            Self::NeedMoreParams(cmd) => {
                format!(":{server} {ERR_NEEDMOREPARAMS} {nick} {cmd} :Not enough parameters\r\n")
            }
            Self::NoRecipient(cmd) => {
                format!(":{server} {ERR_NORECIPIENT} {nick} :No recipient given ({cmd})\r\n")
            }
            Self::NoTextToSend => {
                format!(":{server} {ERR_NOTEXTTOSEND} {nick} :No text to send\r\n")
            }
            Self::NoNicknameGiven => {
                format!(":{server} {ERR_NONICKNAMEGIVEN} {nick} :No nickname given\r\n")
            }
            Self::ErroneousNickname(bad) => {
                format!(":{server} {ERR_ERRONEUSNICKNAME} {nick} {bad} :Erroneous nickname\r\n")
            }
            Self::NicknameInUse(bad) => {
                format!(":{server} {ERR_NICKNAMEINUSE} {nick} {bad} :Nickname is already in use\r\n")
            }
            Self::NoSuchNick(target) => {
                format!(":{server} {ERR_NOSUCHNICK} {nick} {target} :No such nick/channel\r\n")
            }
            Self::NoSuchChannel(name) => {
                format!(":{server} {ERR_NOSUCHCHANNEL} {nick} {name} :No such channel\r\n")
            }
            Self::TooManyChannels(name) => {
                format!(":{server} {ERR_TOOMANYCHANNELS} {nick} {name} :You have joined too many channels\r\n")
            }
            Self::NoOrigin => {
                format!(":{server} {ERR_NOORIGIN} {nick} :No origin specified\r\n")
            }
            Self::NotOnChannel(name) => {
                format!(":{server} {ERR_NOTONCHANNEL} {nick} {name} :You're not on that channel\r\n")
            }
            Self::NotRegistered => {
                format!(":{server} {ERR_NOTREGISTERED} {nick} :You have not registered\r\n")
            }
            Self::UnknownCommand(cmd) => {
                format!(":{server} {ERR_UNKNOWNCOMMAND} {nick} {cmd} :Unknown command\r\n")
            }
            Self::AlreadyRegistered => {
                format!(":{server} {ERR_ALREADYREGISTRED} {nick} :You may not reregister\r\n")
            }
            Self::Quit(_) | Self::Internal(_) => return None,
        };
        Some(line)
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Channel engine failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("no such channel")]
    NoSuchChannel,

    #[error("not on channel")]
    NotOnChannel,

    #[error("invalid channel name")]
    InvalidName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_lines_match_the_wire_format() {
        let e = HandlerError::NicknameInUse("alice".into());
        assert_eq!(
            e.to_reply("irc.example.net", "*"),
            Some(":irc.example.net 433 * alice :Nickname is already in use\r\n".to_string())
        );

        let e = HandlerError::NeedMoreParams("JOIN".into());
        assert_eq!(
            e.to_reply("irc.example.net", "alice"),
            Some(":irc.example.net 461 alice JOIN :Not enough parameters\r\n".to_string())
        );
    }

    #[test]
    fn quit_produces_no_reply() {
        assert_eq!(HandlerError::Quit(Some("bye".into())).to_reply("s", "n"), None);
    }
}
