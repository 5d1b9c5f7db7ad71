//! Per-connection session state, owned by the supervisor.

use std::sync::Arc;
use std::time::Instant;

use super::client::ClientHandle;

/// Mutable connection state. Identity fields are staged here until NICK
/// and USER both arrive; registration then freezes them into the shared
/// [`ClientHandle`].
pub struct Session {
    pub nick: Option<String>,
    pub username: Option<String>,
    pub realname: Option<String>,
    /// Reverse-DNS hostname or the address text.
    pub host: String,
    /// Cloaked host, computed at accept time.
    pub pubhost: String,
    /// Whether the connection arrived over the TLS listener.
    pub secure: bool,
    pub registered: bool,
    /// Present exactly while registered.
    pub handle: Option<Arc<ClientHandle>>,
    pub last_activity: Instant,
    pub ping_pending: bool,
    pub ping_sent_at: Option<Instant>,
}

impl Session {
    pub fn new(host: String, pubhost: String, secure: bool) -> Self {
        Self {
            nick: None,
            username: None,
            realname: None,
            host,
            pubhost,
            secure,
            registered: false,
            handle: None,
            last_activity: Instant::now(),
            ping_pending: false,
            ping_sent_at: None,
        }
    }

    /// Numeric-reply target: the nickname once known, `*` before that.
    pub fn nick_or_star(&self) -> &str {
        self.nick.as_deref().unwrap_or("*")
    }

    /// Record liveness; clears any outstanding ping.
    pub fn mark_activity(&mut self) {
        self.last_activity = Instant::now();
        self.ping_pending = false;
        self.ping_sent_at = None;
    }
}
