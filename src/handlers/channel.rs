//! Channel commands: JOIN, PART, LIST.

use cinder_proto::validation::is_valid_channel_name;
use cinder_proto::{MessageRef, Reply};

use crate::error::{HandlerError, HandlerResult};
use crate::state::{CHANNEL_MODES, JoinOutcome};

use super::{Context, Handler, finish_line};

pub struct JoinHandler;

impl Handler for JoinHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &MessageRef<'_>) -> HandlerResult {
        let name = msg.arg(0).ok_or(HandlerError::NeedMoreParams("JOIN".to_string()))?;
        if !is_valid_channel_name(name) {
            return Err(HandlerError::NoSuchChannel(name.to_string()));
        }

        let joiner = ctx.client()?;
        if joiner.channel_count() >= ctx.hub.chanlimit {
            return Err(HandlerError::TooManyChannels(name.to_string()));
        }

        let outcome = ctx
            .hub
            .channels
            .join(&ctx.hub.clients, name, &joiner)
            .map_err(|_| HandlerError::NoSuchChannel(name.to_string()))?;

        let snapshot = match outcome {
            JoinOutcome::Joined(snapshot) => snapshot,
            JoinOutcome::AlreadyMember => return Ok(()),
        };
        joiner.add_channel(name);

        // Acknowledgement block, from the snapshot taken under the
        // channel lock: echo, modes, topic, one NAMES line per member.
        ctx.reply(finish_line(format!(":{} JOIN :{}", joiner.mask(), name)));
        ctx.reply(finish_line(format!(
            ":{} MODE {} {}",
            ctx.hub.info.name, name, CHANNEL_MODES
        )));
        ctx.numeric(Reply::RPL_TOPIC, &format!("{name} :{}", snapshot.topic));
        for mask in &snapshot.member_masks {
            ctx.numeric(Reply::RPL_NAMREPLY, &format!("= {name} :{mask}"));
        }
        ctx.numeric(Reply::RPL_ENDOFNAMES, &format!("{name} :End of NAMES list"));
        Ok(())
    }
}

pub struct PartHandler;

impl Handler for PartHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &MessageRef<'_>) -> HandlerResult {
        let name = msg.arg(0).ok_or(HandlerError::NeedMoreParams("PART".to_string()))?;
        let leaver = ctx.client()?;
        let reason = msg.arg(1).unwrap_or(&leaver.nick);
        let notice = finish_line(format!(":{} PART {} :{}", leaver.mask(), name, reason));

        ctx.hub
            .channels
            .leave(&ctx.hub.clients, name, &leaver.nick, &notice)
            .map_err(|_| HandlerError::NotOnChannel(name.to_string()))?;

        leaver.remove_channel(name);
        ctx.reply(notice);
        Ok(())
    }
}

pub struct ListHandler;

impl Handler for ListHandler {
    fn handle(&self, ctx: &mut Context<'_>, _msg: &MessageRef<'_>) -> HandlerResult {
        for (name, members, topic) in ctx.hub.channels.list() {
            ctx.numeric(Reply::RPL_LIST, &format!("{name} {members} :{topic}"));
        }
        ctx.numeric(Reply::RPL_LISTEND, ":End of /LIST");
        Ok(())
    }
}
