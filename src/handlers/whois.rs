//! WHOIS queries.

use cinder_proto::{MAX_MESSAGE_SIZE, MessageRef, Reply};

use crate::error::{HandlerError, HandlerResult};

use super::{Context, Handler};

pub struct WhoisHandler;

impl Handler for WhoisHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &MessageRef<'_>) -> HandlerResult {
        let target = msg.arg(0).ok_or(HandlerError::NoNicknameGiven)?;

        let info = ctx.hub.clients.with(target, |c| {
            (c.nick.clone(), c.username.clone(), c.pubhost.clone(), c.realname.clone(), c.channels())
        });
        let Some((nick, username, pubhost, realname, channels)) = info else {
            return Err(HandlerError::NoSuchNick(target.to_string()));
        };

        ctx.numeric(
            Reply::RPL_WHOISUSER,
            &format!("{nick} {username} {pubhost} * :{realname}"),
        );
        ctx.numeric(
            Reply::RPL_WHOISSERVER,
            &format!("{nick} {} :{}", ctx.hub.info.name, ctx.hub.info.description),
        );

        for chunk in chunk_channels(&channels, whois_budget(ctx, &nick)) {
            ctx.numeric(Reply::RPL_WHOISCHANNELS, &format!("{nick} :{chunk}"));
        }

        ctx.numeric(Reply::RPL_ENDOFWHOIS, &format!("{nick} :End of /WHOIS list"));
        Ok(())
    }
}

/// Bytes available for the channel list in one 319 line:
/// `:<server> 319 <me> <nick> :<list>\r\n` must stay within the envelope.
fn whois_budget(ctx: &Context<'_>, nick: &str) -> usize {
    let overhead = 1 + ctx.hub.info.name.len() // :server
        + 1 + 3                                // space, code
        + 1 + ctx.session.nick_or_star().len() // space, me
        + 1 + nick.len()                       // space, nick
        + 2                                    // " :"
        + 2;                                   // terminator
    MAX_MESSAGE_SIZE - overhead
}

/// Pack channel names into space-separated chunks of at most `budget`
/// bytes, splitting onto continuation lines when a name would overflow.
fn chunk_channels(channels: &[String], budget: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for name in channels {
        let needed = if current.is_empty() { name.len() } else { name.len() + 1 };
        if !current.is_empty() && current.len() + needed > budget {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(name);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
