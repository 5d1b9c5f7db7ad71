//! The shared per-client handle.
//!
//! A [`ClientHandle`] is the face a registered client shows the rest of
//! the server: identity strings fixed at registration, the outbound
//! [`SendQueue`] any task may write into, and the joined-channel list.
//! Everything mutable a supervisor owns exclusively (framing buffer,
//! liveness, socket) lives in the session, not here.

use parking_lot::Mutex;

use super::queue::SendQueue;

pub struct ClientHandle {
    /// Nickname in the case the client registered it.
    pub nick: String,
    pub username: String,
    pub realname: String,
    /// Reverse-DNS hostname, or the address text when there is none.
    pub host: String,
    /// Cloaked host shown to other users.
    pub pubhost: String,
    /// Outbound lines plus the supervisor wakeup.
    pub queue: SendQueue,
    /// Channels this client is a member of, display case.
    channels: Mutex<Vec<String>>,
}

impl ClientHandle {
    pub fn new(nick: String, username: String, realname: String, host: String, pubhost: String) -> Self {
        Self {
            nick,
            username,
            realname,
            host,
            pubhost,
            queue: SendQueue::new(),
            channels: Mutex::new(Vec::new()),
        }
    }

    /// The `nick!user@pubhost` source mask used in relayed messages.
    pub fn mask(&self) -> String {
        format!("{}!{}@{}", self.nick, self.username, self.pubhost)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }

    /// Snapshot of the joined-channel list.
    pub fn channels(&self) -> Vec<String> {
        self.channels.lock().clone()
    }

    #[allow(dead_code)]
    pub fn in_channel(&self, name: &str) -> bool {
        self.channels.lock().iter().any(|c| c == name)
    }

    pub fn add_channel(&self, name: &str) {
        let mut channels = self.channels.lock();
        if !channels.iter().any(|c| c == name) {
            channels.push(name.to_string());
        }
    }

    /// Remove `name` from the joined list; false when it was absent.
    pub fn remove_channel(&self, name: &str) -> bool {
        let mut channels = self.channels.lock();
        match channels.iter().position(|c| c == name) {
            Some(i) => {
                channels.remove(i);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(nick: &str) -> ClientHandle {
        ClientHandle::new(
            nick.to_string(),
            nick.to_string(),
            "Test User".to_string(),
            "203.0.113.9".to_string(),
            "AAAA.BBBB.CCCC.IP".to_string(),
        )
    }

    #[test]
    fn mask_shows_the_cloaked_host() {
        let c = handle("alice");
        assert_eq!(c.mask(), "alice!alice@AAAA.BBBB.CCCC.IP");
    }

    #[test]
    fn channel_list_add_remove() {
        let c = handle("alice");
        c.add_channel("#room");
        c.add_channel("#room");
        assert_eq!(c.channel_count(), 1);
        assert!(c.in_channel("#room"));
        assert!(c.remove_channel("#room"));
        assert!(!c.remove_channel("#room"));
        assert_eq!(c.channel_count(), 0);
    }
}
