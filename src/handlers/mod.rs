//! Command dispatch.
//!
//! Two trie-keyed tables map `(registration state, command name)` to a
//! handler object; lookup through the command trie is case-insensitive.
//! Handlers run synchronously: registry work happens inline, and replies
//! to the issuing client accumulate in the [`Context`] for the
//! supervisor to write out after dispatch, so no handler can suspend
//! while any lock is held. Deliveries to other clients go through their
//! send queues instead.

mod channel;
mod connection;
mod messaging;
mod whois;


use std::sync::Arc;

use cinder_proto::trie::{CommandAlphabet, Trie};
use cinder_proto::{MAX_MESSAGE_SIZE, MessageRef, Reply};

use crate::error::{HandlerError, HandlerResult};
use crate::state::ClientHandle;
use crate::state::hub::Hub;
use crate::state::session::Session;

use channel::{JoinHandler, ListHandler, PartHandler};
use connection::{NickHandler, PongHandler, QuitHandler, UserHandler};
use messaging::PrivmsgHandler;
use whois::WhoisHandler;

/// Everything a handler may touch.
pub struct Context<'a> {
    pub hub: &'a Hub,
    pub session: &'a mut Session,
    /// Lines queued for the issuing client, written by the supervisor
    /// once the handler has returned.
    pub replies: &'a mut Vec<String>,
}

impl Context<'_> {
    /// The shared handle of the issuing client. Only meaningful for
    /// handlers in the registered table.
    pub fn client(&self) -> Result<Arc<ClientHandle>, HandlerError> {
        self.session
            .handle
            .clone()
            .ok_or(HandlerError::Internal("registered session without client handle"))
    }

    /// Push a finished wire line for the issuing client.
    pub fn reply(&mut self, line: String) {
        self.replies.push(line);
    }

    /// Push a numeric reply; `rest` is everything after the target nick.
    pub fn numeric(&mut self, reply: Reply, rest: &str) {
        let line = format!(
            ":{} {} {} {}",
            self.hub.info.name,
            reply,
            self.session.nick_or_star(),
            rest
        );
        self.replies.push(finish_line(line));
    }
}

/// Clamp `line` to the 512-byte envelope and terminate it.
pub fn finish_line(mut line: String) -> String {
    if line.len() > MAX_MESSAGE_SIZE - 2 {
        let mut cut = MAX_MESSAGE_SIZE - 2;
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        line.truncate(cut);
    }
    line.push_str("\r\n");
    line
}

/// A command handler.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context<'_>, msg: &MessageRef<'_>) -> HandlerResult;
}

type Table = Trie<CommandAlphabet, Box<dyn Handler>>;

/// The two dispatch tables.
pub struct Dispatcher {
    unregistered: Table,
    registered: Table,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn register(table: &mut Table, name: &str, handler: Box<dyn Handler>) {
    table
        .insert(name.as_bytes(), handler)
        .expect("command names are alphabetic");
}

impl Dispatcher {
    pub fn new() -> Self {
        let mut unregistered = Trie::new();
        register(&mut unregistered, "NICK", Box::new(NickHandler));
        register(&mut unregistered, "USER", Box::new(UserHandler));
        register(&mut unregistered, "PONG", Box::new(PongHandler));

        let mut registered = Trie::new();
        register(&mut registered, "NICK", Box::new(NickHandler));
        register(&mut registered, "USER", Box::new(UserHandler));
        register(&mut registered, "PONG", Box::new(PongHandler));
        register(&mut registered, "QUIT", Box::new(QuitHandler));
        register(&mut registered, "PRIVMSG", Box::new(PrivmsgHandler));
        register(&mut registered, "WHOIS", Box::new(WhoisHandler));
        register(&mut registered, "JOIN", Box::new(JoinHandler));
        register(&mut registered, "PART", Box::new(PartHandler));
        register(&mut registered, "LIST", Box::new(ListHandler));

        Self {
            unregistered,
            registered,
        }
    }

    /// Route one parsed message to its handler.
    pub fn dispatch(&self, ctx: &mut Context<'_>, msg: &MessageRef<'_>) -> HandlerResult {
        let table = if ctx.session.registered {
            &self.registered
        } else {
            &self.unregistered
        };
        match table.get(msg.command.as_bytes()) {
            Some(handler) => handler.handle(ctx, msg),
            None if ctx.session.registered => {
                Err(HandlerError::UnknownCommand(msg.command.to_string()))
            }
            None => Err(HandlerError::NotRegistered),
        }
    }
}
