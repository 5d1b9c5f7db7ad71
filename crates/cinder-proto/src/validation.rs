//! Validity rules for nicknames and channel names.

/// Longest accepted nickname, in bytes.
pub const MAX_NICK_LENGTH: usize = 15;

/// Longest accepted channel name, in bytes, `#` included.
pub const MAX_CHANNEL_NAME_LENGTH: usize = 50;

/// Bytes allowed anywhere in a nickname.
#[inline]
pub fn is_nick_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(b, b'-' | b'[' | b']' | b'\\' | b'`' | b'^' | b'{' | b'}' | b'|')
}

/// Whether `nick` is acceptable as a nickname (length is checked by the
/// caller against [`MAX_NICK_LENGTH`], since the error differs).
pub fn is_valid_nick(nick: &str) -> bool {
    !nick.is_empty() && nick.bytes().all(is_nick_byte)
}

/// Bytes allowed in a channel name after the leading `#`: anything but
/// NUL, BELL, CR, LF, space, comma and colon.
#[inline]
pub fn is_channel_byte(b: u8) -> bool {
    !matches!(b, 0x00 | 0x07 | b'\r' | b'\n' | b' ' | b',' | b':')
}

/// Whether `name` is an acceptable channel name.
pub fn is_valid_channel_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix('#') else {
        return false;
    };
    !rest.is_empty()
        && name.len() <= MAX_CHANNEL_NAME_LENGTH
        && rest.bytes().all(is_channel_byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_rfc_nicknames() {
        for nick in ["alice", "WiZ", "n-1", "[away]", "x^y", "{ops}", "a`b", "nick|cord"] {
            assert!(is_valid_nick(nick), "{nick}");
        }
    }

    #[test]
    fn rejects_bad_nicknames() {
        for nick in ["", "with space", "semi;colon", "at@host", "bang!", "ünïcode"] {
            assert!(!is_valid_nick(nick), "{nick}");
        }
    }

    #[test]
    fn channel_names_need_hash_and_clean_bytes() {
        assert!(is_valid_channel_name("#room"));
        assert!(is_valid_channel_name("#r00m.dev+x"));
        assert!(!is_valid_channel_name("room"));
        assert!(!is_valid_channel_name("#"));
        assert!(!is_valid_channel_name("#with space"));
        assert!(!is_valid_channel_name("#a,b"));
        assert!(!is_valid_channel_name("#a:b"));
        assert!(!is_valid_channel_name("#bell\x07"));
        assert!(!is_valid_channel_name(&format!("#{}", "x".repeat(MAX_CHANNEL_NAME_LENGTH))));
    }
}
