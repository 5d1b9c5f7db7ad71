//! PRIVMSG delivery.

use cinder_proto::MessageRef;

use crate::error::{HandlerError, HandlerResult};

use super::{Context, Handler, finish_line};

pub struct PrivmsgHandler;

impl Handler for PrivmsgHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &MessageRef<'_>) -> HandlerResult {
        let target = msg.arg(0).ok_or(HandlerError::NoRecipient("PRIVMSG".to_string()))?;
        let text = msg.arg(1).ok_or(HandlerError::NoTextToSend)?;
        let sender = ctx.client()?;

        // finish_line clamps to the 512-byte envelope, so an oversized
        // text loses its tail rather than producing an oversized line.
        let line = finish_line(format!(":{} PRIVMSG {} :{}", sender.mask(), target, text));

        if target.starts_with('#') {
            ctx.hub
                .channels
                .broadcast(&ctx.hub.clients, target, &sender.nick, &line)
                .map_err(|_| HandlerError::NoSuchNick(target.to_string()))?;
        } else {
            // A saturated recipient queue drops the line silently; only
            // an unknown target is an error.
            ctx.hub
                .clients
                .deliver(target, &line)
                .ok_or_else(|| HandlerError::NoSuchNick(target.to_string()))?;
        }
        Ok(())
    }
}
