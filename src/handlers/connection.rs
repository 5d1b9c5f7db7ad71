//! Registration and liveness commands: NICK, USER, PONG, QUIT.

use std::sync::Arc;

use cinder_proto::validation::{MAX_NICK_LENGTH, is_valid_nick};
use cinder_proto::{MessageRef, Reply};
use tracing::debug;

use crate::error::{HandlerError, HandlerResult};
use crate::state::hub::VERSION;
use crate::state::{CHANNEL_MODES, ClientHandle, InsertOutcome};

use super::{Context, Handler};

pub struct NickHandler;

impl Handler for NickHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &MessageRef<'_>) -> HandlerResult {
        // Nick changes after registration are not supported.
        if ctx.session.registered {
            return Err(HandlerError::AlreadyRegistered);
        }

        let nick = msg.arg(0).ok_or(HandlerError::NoNicknameGiven)?;
        if nick.len() > MAX_NICK_LENGTH || !is_valid_nick(nick) {
            return Err(HandlerError::ErroneousNickname(nick.to_string()));
        }
        if ctx.hub.clients.is_nick_taken(nick) {
            return Err(HandlerError::NicknameInUse(nick.to_string()));
        }

        ctx.session.nick = Some(nick.to_string());
        try_complete_registration(ctx)
    }
}

pub struct UserHandler;

impl Handler for UserHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &MessageRef<'_>) -> HandlerResult {
        if ctx.session.registered {
            return Err(HandlerError::AlreadyRegistered);
        }
        if msg.param_count() < 4 {
            return Err(HandlerError::NeedMoreParams("USER".to_string()));
        }

        ctx.session.username = msg.arg(0).map(String::from);
        ctx.session.realname = msg.arg(3).map(String::from);
        try_complete_registration(ctx)
    }
}

pub struct PongHandler;

impl Handler for PongHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &MessageRef<'_>) -> HandlerResult {
        if msg.param_count() == 0 {
            return Err(HandlerError::NoOrigin);
        }
        ctx.session.mark_activity();
        Ok(())
    }
}

pub struct QuitHandler;

impl Handler for QuitHandler {
    fn handle(&self, _ctx: &mut Context<'_>, msg: &MessageRef<'_>) -> HandlerResult {
        // The supervisor broadcasts the notice and tears the session down.
        Err(HandlerError::Quit(msg.arg(0).map(String::from)))
    }
}

/// Once NICK and USER have both been seen, bind the nickname in the
/// client registry (the atomic commit point of registration) and emit
/// the welcome block. Losing the nickname race here un-stages the nick
/// so the client can pick another.
fn try_complete_registration(ctx: &mut Context<'_>) -> HandlerResult {
    let (Some(nick), Some(username), Some(realname)) = (
        ctx.session.nick.clone(),
        ctx.session.username.clone(),
        ctx.session.realname.clone(),
    ) else {
        return Ok(());
    };

    let handle = Arc::new(ClientHandle::new(
        nick.clone(),
        username,
        realname,
        ctx.session.host.clone(),
        ctx.session.pubhost.clone(),
    ));

    match ctx.hub.clients.register(handle.clone()) {
        InsertOutcome::Inserted => {}
        InsertOutcome::Exists => {
            ctx.session.nick = None;
            return Err(HandlerError::NicknameInUse(nick));
        }
        InsertOutcome::Invalid => {
            ctx.session.nick = None;
            return Err(HandlerError::ErroneousNickname(nick));
        }
    }

    ctx.session.registered = true;
    ctx.session.handle = Some(handle.clone());
    debug!(%nick, host = %handle.host, clients = ctx.hub.clients.count(), "Client registered");

    send_welcome(ctx, &handle);
    Ok(())
}

/// The 001–004 block followed by the MOTD.
fn send_welcome(ctx: &mut Context<'_>, handle: &ClientHandle) {
    let server = ctx.hub.info.name.clone();
    let network = ctx.hub.info.network.clone();
    let created = ctx.hub.info.created.format("%a %b %e %Y at %H:%M:%S UTC");

    ctx.numeric(
        Reply::RPL_WELCOME,
        &format!(
            ":Welcome to the {network} Internet Relay Chat Network {}",
            handle.mask()
        ),
    );
    ctx.numeric(
        Reply::RPL_YOURHOST,
        &format!(":Your host is {server}, running version {VERSION}"),
    );
    ctx.numeric(Reply::RPL_CREATED, &format!(":This server was created {created}"));
    ctx.numeric(
        Reply::RPL_MYINFO,
        &format!("{server} {VERSION} i {}", CHANNEL_MODES.trim_start_matches('+')),
    );

    ctx.numeric(
        Reply::RPL_MOTDSTART,
        &format!(":- {server} Message of the day - "),
    );
    let motd = ctx.hub.motd.clone();
    for line in &motd {
        ctx.numeric(Reply::RPL_MOTD, &format!(":- {line}"));
    }
    ctx.numeric(Reply::RPL_ENDOFMOTD, ":End of /MOTD command");
}
