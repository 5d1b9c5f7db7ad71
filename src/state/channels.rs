//! The channel engine.
//!
//! One registry keyed by channel name; join, leave and broadcast are
//! compound operations executed under the registry's global lock so
//! that the membership snapshot they act on is the one delivery sees.
//! Recipient queues are resolved through the client registry inside
//! that hold. Lock order is channels, then clients, then queue; nothing
//! acquires them the other way around.

use std::sync::Arc;

use cinder_proto::irc_eq;
use tracing::warn;

use crate::error::ChannelError;

use super::channel::Channel;
use super::client::ClientHandle;
use super::clients::ClientDirectory;
use super::registry::{Registry, Resolved};
use cinder_proto::trie::ChannelAlphabet;

/// Membership view captured while the channel lock was held.
pub struct JoinSnapshot {
    pub topic: String,
    /// Full `nick!user@pubhost` masks of every member, joiner included.
    pub member_masks: Vec<String>,
}

/// Result of an attempted join.
pub enum JoinOutcome {
    Joined(JoinSnapshot),
    /// The client was already a member; nothing changed.
    AlreadyMember,
}

#[derive(Default)]
pub struct ChannelDirectory {
    registry: Registry<ChannelAlphabet, Channel>,
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.registry.len()
    }

    #[allow(dead_code)]
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name.as_bytes())
    }

    #[allow(dead_code)]
    pub fn member_count(&self, name: &str) -> Option<usize> {
        self.registry.find_and_act(name.as_bytes(), |chan| chan.member_count)
    }

    /// Atomically join `joiner` to `name`, creating the channel when it
    /// does not exist. Existing members are notified through their
    /// queues; the returned snapshot feeds the joiner's own
    /// acknowledgement block.
    pub fn join(
        &self,
        clients: &ClientDirectory,
        name: &str,
        joiner: &Arc<ClientHandle>,
    ) -> Result<JoinOutcome, ChannelError> {
        let join_notice = format!(":{} JOIN :{}\r\n", joiner.mask(), name);

        let resolved = self
            .registry
            .find_or_insert(
                name.as_bytes(),
                |chan| {
                    if chan.is_member(&joiner.nick) {
                        return JoinOutcome::AlreadyMember;
                    }
                    chan.add_member(&joiner.nick);
                    let mut member_masks = Vec::with_capacity(chan.member_count);
                    for nick in chan.member_nicks() {
                        if irc_eq(&nick, &joiner.nick) {
                            member_masks.push(joiner.mask());
                            continue;
                        }
                        match clients.with(&nick, |c| {
                            c.queue.push_and_wake(join_notice.as_str());
                            c.mask()
                        }) {
                            Some(mask) => member_masks.push(mask),
                            // Membership should never outlive registration.
                            None => warn!(channel = %name, %nick, "member without a registered client"),
                        }
                    }
                    JoinOutcome::Joined(JoinSnapshot {
                        topic: chan.topic.clone(),
                        member_masks,
                    })
                },
                || {
                    let mut chan = Channel::new(name);
                    chan.add_member(&joiner.nick);
                    let snapshot = JoinSnapshot {
                        topic: chan.topic.clone(),
                        member_masks: vec![joiner.mask()],
                    };
                    (chan, JoinOutcome::Joined(snapshot))
                },
            )
            .map_err(|_| ChannelError::InvalidName)?;

        Ok(resolved.into_inner())
    }

    /// Atomically remove `nick` from `name`, deliver `notice` to the
    /// remaining members, and drop the channel when the last member is
    /// gone. Used by PART and by QUIT teardown.
    pub fn leave(
        &self,
        clients: &ClientDirectory,
        name: &str,
        nick: &str,
        notice: &str,
    ) -> Result<(), ChannelError> {
        self.registry
            .find_act_remove(name.as_bytes(), |chan| {
                if !chan.remove_member(nick) {
                    return (Err(ChannelError::NotOnChannel), false);
                }
                for member in chan.member_nicks() {
                    clients.deliver(&member, notice);
                }
                (Ok(()), chan.member_count == 0)
            })
            .unwrap_or(Err(ChannelError::NotOnChannel))
    }

    /// Deliver `line` to every member of `name` except `sender`.
    pub fn broadcast(
        &self,
        clients: &ClientDirectory,
        name: &str,
        sender: &str,
        line: &str,
    ) -> Result<(), ChannelError> {
        self.registry
            .find_and_act(name.as_bytes(), |chan| {
                for member in chan.member_nicks() {
                    if !irc_eq(&member, sender) {
                        clients.deliver(&member, line);
                    }
                }
            })
            .ok_or(ChannelError::NoSuchChannel)
    }

    /// Remove `handle` from every channel it joined, delivering `notice`
    /// (a QUIT line) to each remaining audience. Idempotent: channels
    /// already left are skipped.
    pub fn quit_all(&self, clients: &ClientDirectory, handle: &ClientHandle, notice: &str) {
        for name in handle.channels() {
            if self.leave(clients, &name, &handle.nick, notice).is_err() {
                warn!(channel = %name, nick = %handle.nick, "joined-set entry without membership");
            }
            handle.remove_channel(&name);
        }
    }

    /// `(name, member_count, topic)` for every channel, in trie order.
    pub fn list(&self) -> Vec<(String, usize, String)> {
        let mut out = Vec::new();
        self.registry.for_each(|_, chan| {
            out.push((chan.name.clone(), chan.member_count, chan.topic.clone()));
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::channel::DEFAULT_TOPIC;
    use crate::state::queue::Enqueue;

    fn client(dir: &ClientDirectory, nick: &str) -> Arc<ClientHandle> {
        let handle = Arc::new(ClientHandle::new(
            nick.to_string(),
            nick.to_lowercase(),
            "Test User".to_string(),
            "host.example".to_string(),
            format!("{nick}.cloak"),
        ));
        dir.register(handle.clone());
        handle
    }

    #[test]
    fn first_join_creates_channel_with_one_member() {
        let clients = ClientDirectory::new();
        let channels = ChannelDirectory::new();
        let alice = client(&clients, "alice");

        let outcome = channels.join(&clients, "#room", &alice).unwrap();
        let JoinOutcome::Joined(snapshot) = outcome else {
            panic!("expected a join");
        };
        assert_eq!(snapshot.member_masks, vec!["alice!alice@alice.cloak"]);
        assert_eq!(snapshot.topic, DEFAULT_TOPIC);
        assert_eq!(channels.member_count("#room"), Some(1));
        // The sole joiner gets no queued notification.
        assert!(alice.queue.is_empty());
    }

    #[test]
    fn second_join_notifies_existing_members() {
        let clients = ClientDirectory::new();
        let channels = ChannelDirectory::new();
        let alice = client(&clients, "alice");
        let bob = client(&clients, "bob");

        channels.join(&clients, "#room", &alice).unwrap();
        let JoinOutcome::Joined(snapshot) = channels.join(&clients, "#room", &bob).unwrap() else {
            panic!("expected a join");
        };

        assert_eq!(snapshot.member_masks.len(), 2);
        assert!(snapshot.member_masks.contains(&"bob!bob@bob.cloak".to_string()));
        assert_eq!(alice.queue.drain(), vec![":bob!bob@bob.cloak JOIN :#room\r\n"]);
        assert!(bob.queue.is_empty());
    }

    #[test]
    fn rejoin_is_silently_ignored() {
        let clients = ClientDirectory::new();
        let channels = ChannelDirectory::new();
        let alice = client(&clients, "alice");

        channels.join(&clients, "#room", &alice).unwrap();
        assert!(matches!(
            channels.join(&clients, "#room", &alice).unwrap(),
            JoinOutcome::AlreadyMember
        ));
        assert_eq!(channels.member_count("#room"), Some(1));
    }

    #[test]
    fn broadcast_skips_the_sender() {
        let clients = ClientDirectory::new();
        let channels = ChannelDirectory::new();
        let alice = client(&clients, "alice");
        let bob = client(&clients, "bob");
        channels.join(&clients, "#room", &alice).unwrap();
        channels.join(&clients, "#room", &bob).unwrap();
        alice.queue.drain();

        let line = ":alice!alice@alice.cloak PRIVMSG #room :hello\r\n";
        channels.broadcast(&clients, "#room", "alice", line).unwrap();

        assert_eq!(bob.queue.drain(), vec![line]);
        assert!(alice.queue.is_empty());

        assert_eq!(
            channels.broadcast(&clients, "#ghost", "alice", line),
            Err(ChannelError::NoSuchChannel)
        );
    }

    #[test]
    fn last_leave_tears_the_channel_down() {
        let clients = ClientDirectory::new();
        let channels = ChannelDirectory::new();
        let alice = client(&clients, "alice");
        let bob = client(&clients, "bob");
        channels.join(&clients, "#room", &alice).unwrap();
        channels.join(&clients, "#room", &bob).unwrap();
        alice.queue.drain();

        let part = ":bob!bob@bob.cloak PART #room :bob\r\n";
        channels.leave(&clients, "#room", "bob", part).unwrap();
        assert_eq!(channels.member_count("#room"), Some(1));
        assert_eq!(alice.queue.drain(), vec![part]);

        channels.leave(&clients, "#room", "alice", ":x PART #room :x\r\n").unwrap();
        // Member count never observed at zero: the channel is gone.
        assert!(!channels.contains("#room"));
        assert_eq!(channels.count(), 0);

        assert_eq!(
            channels.leave(&clients, "#room", "alice", "x"),
            Err(ChannelError::NotOnChannel)
        );
    }

    #[test]
    fn leave_of_non_member_is_not_on_channel() {
        let clients = ClientDirectory::new();
        let channels = ChannelDirectory::new();
        let alice = client(&clients, "alice");
        let bob = client(&clients, "bob");
        channels.join(&clients, "#room", &alice).unwrap();

        assert_eq!(
            channels.leave(&clients, "#room", &bob.nick, "x"),
            Err(ChannelError::NotOnChannel)
        );
        assert_eq!(channels.member_count("#room"), Some(1));
    }

    #[test]
    fn quit_all_broadcasts_once_per_channel_and_clears_the_joined_set() {
        let clients = ClientDirectory::new();
        let channels = ChannelDirectory::new();
        let alice = client(&clients, "alice");
        let bob = client(&clients, "bob");

        for name in ["#one", "#two"] {
            channels.join(&clients, name, &alice).unwrap();
            alice.add_channel(name);
            channels.join(&clients, name, &bob).unwrap();
            bob.add_channel(name);
        }
        alice.queue.drain();

        let quit = ":alice!alice@alice.cloak QUIT :bye\r\n";
        channels.quit_all(&clients, &alice, quit);

        // Exactly one QUIT per shared channel, channels survive with bob.
        assert_eq!(bob.queue.drain(), vec![quit, quit]);
        assert_eq!(alice.channel_count(), 0);
        assert_eq!(channels.member_count("#one"), Some(1));
        assert_eq!(channels.member_count("#two"), Some(1));
    }

    #[test]
    fn join_then_part_restores_prior_state() {
        let clients = ClientDirectory::new();
        let channels = ChannelDirectory::new();
        let alice = client(&clients, "alice");

        channels.join(&clients, "#fresh", &alice).unwrap();
        alice.add_channel("#fresh");
        channels.leave(&clients, "#fresh", "alice", "x").unwrap();
        alice.remove_channel("#fresh");

        assert!(!channels.contains("#fresh"));
        assert_eq!(alice.channel_count(), 0);
    }

    #[test]
    fn queue_saturation_drops_but_delivery_continues() {
        let clients = ClientDirectory::new();
        let channels = ChannelDirectory::new();
        let alice = client(&clients, "alice");
        let bob = client(&clients, "bob");
        let carol = client(&clients, "carol");
        channels.join(&clients, "#room", &alice).unwrap();
        channels.join(&clients, "#room", &bob).unwrap();
        channels.join(&clients, "#room", &carol).unwrap();
        alice.queue.drain();
        bob.queue.drain();

        // Saturate bob's queue.
        while bob.queue.push("x\r\n") == Enqueue::Queued {}

        channels
            .broadcast(&clients, "#room", "alice", ":a PRIVMSG #room :hi\r\n")
            .unwrap();

        // Bob lost the line, carol still got it.
        assert!(bob.queue.drain().iter().all(|l| l == "x\r\n"));
        assert_eq!(carol.queue.drain(), vec![":a PRIVMSG #room :hi\r\n"]);
    }

    #[test]
    fn list_reports_counts_and_topics() {
        let clients = ClientDirectory::new();
        let channels = ChannelDirectory::new();
        let alice = client(&clients, "alice");
        let bob = client(&clients, "bob");
        channels.join(&clients, "#alpha", &alice).unwrap();
        channels.join(&clients, "#alpha", &bob).unwrap();
        channels.join(&clients, "#beta", &alice).unwrap();

        let listing = channels.list();
        assert_eq!(listing.len(), 2);
        assert!(listing.contains(&("#alpha".to_string(), 2, DEFAULT_TOPIC.to_string())));
        assert!(listing.contains(&("#beta".to_string(), 1, DEFAULT_TOPIC.to_string())));
    }
}
