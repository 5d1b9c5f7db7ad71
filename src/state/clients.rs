//! The client registry: case-folded nickname → live client.
//!
//! A client appears here exactly while it is registered. Insertion is
//! the registration commit point, so the collision check and the
//! binding of nickname to connection are one atomic step under the
//! registry lock.

use std::sync::Arc;

use super::client::ClientHandle;
use super::queue::Enqueue;
use super::registry::{InsertOutcome, Registry};
use cinder_proto::trie::NickAlphabet;

#[derive(Default)]
pub struct ClientDirectory {
    registry: Registry<NickAlphabet, Arc<ClientHandle>>,
}

impl ClientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handle` to its nickname. `Exists` means another live client
    /// holds an equivalent (case-folded) nick.
    pub fn register(&self, handle: Arc<ClientHandle>) -> InsertOutcome {
        let key = handle.nick.clone();
        self.registry.insert_if_absent(key.as_bytes(), handle)
    }

    /// Drop the binding, returning the handle for final cleanup.
    pub fn unregister(&self, nick: &str) -> Option<Arc<ClientHandle>> {
        self.registry.remove(nick.as_bytes())
    }

    pub fn is_nick_taken(&self, nick: &str) -> bool {
        self.registry.contains(nick.as_bytes())
    }

    pub fn count(&self) -> usize {
        self.registry.len()
    }

    /// Run `f` against the client registered under `nick`.
    ///
    /// `f` runs under the registry lock: it may enqueue into the
    /// target's queue and fire its wakeup, and nothing slower.
    pub fn with<R>(&self, nick: &str, f: impl FnOnce(&ClientHandle) -> R) -> Option<R> {
        self.registry.find_and_act(nick.as_bytes(), |handle| f(handle))
    }

    /// Queue a wire line for `nick` and wake its supervisor.
    ///
    /// `None`: no such client. `Some(Full)`: the recipient's queue was
    /// saturated and the line was dropped.
    pub fn deliver(&self, nick: &str, line: &str) -> Option<Enqueue> {
        self.with(nick, |handle| handle.queue.push_and_wake(line))
    }
}
