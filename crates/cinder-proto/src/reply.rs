//! Numeric replies.
//!
//! The subset of RFC 1459 numerics this server emits. The enum value is
//! the wire code; [`Reply::code`] renders the zero-padded three digits.

/// Numeric reply codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
#[repr(u16)]
pub enum Reply {
    RPL_WELCOME = 1,
    RPL_YOURHOST = 2,
    RPL_CREATED = 3,
    RPL_MYINFO = 4,

    RPL_WHOISUSER = 311,
    RPL_WHOISSERVER = 312,
    RPL_ENDOFWHOIS = 318,
    RPL_WHOISCHANNELS = 319,

    RPL_LIST = 322,
    RPL_LISTEND = 323,
    RPL_TOPIC = 332,

    RPL_NAMREPLY = 353,
    RPL_ENDOFNAMES = 366,

    RPL_MOTD = 372,
    RPL_MOTDSTART = 375,
    RPL_ENDOFMOTD = 376,

    ERR_NOSUCHNICK = 401,
    ERR_NOSUCHCHANNEL = 403,
    ERR_TOOMANYCHANNELS = 405,
    ERR_NOORIGIN = 409,
    ERR_NORECIPIENT = 411,
    ERR_NOTEXTTOSEND = 412,
    ERR_UNKNOWNCOMMAND = 421,
    ERR_NONICKNAMEGIVEN = 431,
    ERR_ERRONEUSNICKNAME = 432,
    ERR_NICKNAMEINUSE = 433,
    ERR_NOTONCHANNEL = 442,
    ERR_NOTREGISTERED = 451,
    ERR_NEEDMOREPARAMS = 461,
    ERR_ALREADYREGISTRED = 462,
}

impl Reply {
    /// The zero-padded wire form, e.g. `001` or `433`.
    pub fn code(self) -> String {
        format!("{:03}", self as u16)
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", *self as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_zero_padded() {
        assert_eq!(Reply::RPL_WELCOME.code(), "001");
        assert_eq!(Reply::RPL_MYINFO.code(), "004");
        assert_eq!(Reply::ERR_NICKNAMEINUSE.code(), "433");
        assert_eq!(format!("{}", Reply::RPL_NAMREPLY), "353");
    }
}
