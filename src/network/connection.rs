//! The per-connection supervisor.
//!
//! Each connection runs in its own task, in two phases:
//!
//! 1. Registration: reads and dispatch only, until NICK + USER complete.
//! 2. Registered: a `tokio::select!` loop over socket readability, the
//!    send-queue wakeup, the ping schedule, and server shutdown.
//!
//! The socket reads straight into the framer's buffer; handlers run
//! synchronously over each framed line, and the replies they accumulate
//! are written once the batch is processed. Teardown broadcasts the
//! quit notice to every joined channel, unbinds the nickname, and sends
//! a final ERROR line.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cinder_proto::{FramingError, LineFramer, MessageRef};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::error::HandlerError;
use crate::handlers::{Context, Dispatcher, finish_line};
use crate::state::hub::Hub;
use crate::state::session::Session;
use crate::state::ClientHandle;

/// Cadence of ping-state checks, capped by the configured idle timer.
const PING_CHECK_INTERVAL_SECS: u64 = 15;

/// Default quit reason when the peer gives none or just vanishes.
const DEFAULT_QUIT_REASON: &str = "Client Quit";

/// Outcome of processing one batch of framed lines.
enum Flow {
    Continue,
    Quit(Option<String>),
}

enum Event {
    Read(std::io::Result<usize>),
    Wake,
    PingTick,
    Shutdown,
}

pub struct Connection<S> {
    stream: S,
    addr: SocketAddr,
    hub: Arc<Hub>,
    dispatcher: Arc<Dispatcher>,
    framer: LineFramer,
    session: Session,
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> Connection<S> {
    pub fn new(
        stream: S,
        addr: SocketAddr,
        hub: Arc<Hub>,
        dispatcher: Arc<Dispatcher>,
        host: String,
        pubhost: String,
        secure: bool,
    ) -> Self {
        Self {
            stream,
            addr,
            hub,
            dispatcher,
            framer: LineFramer::new(),
            session: Session::new(host, pubhost, secure),
        }
    }

    /// Run the connection to completion.
    #[instrument(skip(self), fields(addr = %self.addr, secure = %self.session.secure), name = "connection")]
    pub async fn run(mut self) {
        info!(host = %self.session.host, "Client connected");

        let mut shutdown_rx = self.hub.shutdown.subscribe();

        if !self.run_registration(&mut shutdown_rx).await {
            info!("Client disconnected before registering");
            return;
        }

        let Some(handle) = self.session.handle.clone() else {
            warn!("Registered session without client handle");
            return;
        };

        let reason = self.run_registered(&handle, &mut shutdown_rx).await;
        self.teardown(&handle, &reason).await;
        info!(nick = %handle.nick, %reason, "Client disconnected");
    }

    /// Phase 1. True once the session registered; false when the peer
    /// went away first.
    async fn run_registration(&mut self, shutdown_rx: &mut broadcast::Receiver<()>) -> bool {
        while !self.session.registered {
            let event = tokio::select! {
                result = self.stream.read(self.framer.space()) => Event::Read(result),
                _ = shutdown_rx.recv() => Event::Shutdown,
            };
            match event {
                Event::Read(Ok(0)) => return false,
                Event::Read(Ok(n)) => {
                    self.framer.advance(n);
                    let mut out = Vec::new();
                    let flow = self.process_input(&mut out);
                    if write_lines(&mut self.stream, &out).await.is_err() {
                        return false;
                    }
                    if let Flow::Quit(_) = flow {
                        // Nothing registered yet, so nothing to broadcast.
                        let _ = self.send_error_line(DEFAULT_QUIT_REASON).await;
                        return false;
                    }
                }
                Event::Read(Err(e)) => {
                    debug!(error = %e, "Read error during registration");
                    return false;
                }
                Event::Shutdown | Event::Wake | Event::PingTick => {
                    let _ = self.send_error_line("Server shutting down").await;
                    return false;
                }
            }
        }
        true
    }

    /// Phase 2. Returns the quit reason.
    async fn run_registered(
        &mut self,
        handle: &Arc<ClientHandle>,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> String {
        let check_secs = self.hub.ping_freq.clamp(1, PING_CHECK_INTERVAL_SECS);
        let mut ping_timer = tokio::time::interval(Duration::from_secs(check_secs));
        // The first tick completes immediately; skip it.
        ping_timer.tick().await;

        loop {
            let event = tokio::select! {
                result = self.stream.read(self.framer.space()) => Event::Read(result),
                _ = handle.queue.wait() => Event::Wake,
                _ = ping_timer.tick() => Event::PingTick,
                _ = shutdown_rx.recv() => Event::Shutdown,
            };

            match event {
                Event::Read(Ok(0)) => return DEFAULT_QUIT_REASON.to_string(),
                Event::Read(Ok(n)) => {
                    self.framer.advance(n);
                    let mut out = Vec::new();
                    let flow = self.process_input(&mut out);
                    if write_lines(&mut self.stream, &out).await.is_err() {
                        return DEFAULT_QUIT_REASON.to_string();
                    }
                    if let Flow::Quit(reason) = flow {
                        return reason.unwrap_or_else(|| DEFAULT_QUIT_REASON.to_string());
                    }
                }
                Event::Read(Err(e)) => {
                    debug!(error = %e, "Read error");
                    return DEFAULT_QUIT_REASON.to_string();
                }
                Event::Wake => {
                    // Drain everything present at the wake; further
                    // fires during the drain coalesce into the next one.
                    let lines = handle.queue.drain();
                    if write_lines(&mut self.stream, &lines).await.is_err() {
                        return DEFAULT_QUIT_REASON.to_string();
                    }
                }
                Event::PingTick => {
                    if let Some(reason) = self.check_ping().await {
                        return reason;
                    }
                }
                Event::Shutdown => return "Server shutting down".to_string(),
            }
        }
    }

    /// Frame, parse and dispatch every complete line buffered so far.
    /// Replies for this client accumulate in `out`.
    fn process_input(&mut self, out: &mut Vec<String>) -> Flow {
        loop {
            let line = match self.framer.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => return Flow::Continue,
                Err(FramingError::Overflow) => {
                    warn!(addr = %self.addr, "Framing violation: no terminator in 512 bytes, input discarded");
                    continue;
                }
            };

            let Ok(text) = std::str::from_utf8(line) else {
                debug!(addr = %self.addr, "Dropping non-UTF-8 line");
                continue;
            };
            let text = text.trim_end_matches('\r');
            if text.is_empty() {
                continue;
            }

            let msg = match MessageRef::parse(text) {
                Ok(msg) => msg,
                Err(e) => {
                    debug!(addr = %self.addr, error = %e, "Dropping unparseable line");
                    continue;
                }
            };

            self.session.mark_activity();

            let mut ctx = Context {
                hub: &self.hub,
                session: &mut self.session,
                replies: &mut *out,
            };
            match self.dispatcher.dispatch(&mut ctx, &msg) {
                Ok(()) => {}
                Err(HandlerError::Quit(reason)) => return Flow::Quit(reason),
                Err(e) => {
                    debug!(command = %msg.command, error = %e, "Handler error");
                    if let Some(reply) =
                        e.to_reply(&self.hub.info.name, self.session.nick_or_star())
                    {
                        out.push(reply);
                    }
                }
            }
        }
    }

    /// Send a PING when idle, and give up on a client that never
    /// answered the last one. Returns the quit reason on timeout.
    async fn check_ping(&mut self) -> Option<String> {
        let now = Instant::now();
        if self.session.ping_pending {
            let sent_at = self.session.ping_sent_at?;
            if now.duration_since(sent_at).as_secs() >= self.hub.ping_timeout {
                warn!(addr = %self.addr, "Ping timeout");
                return Some("Ping timeout".to_string());
            }
            return None;
        }

        let idle = now.duration_since(self.session.last_activity).as_secs();
        if idle >= self.hub.ping_freq {
            let ping = format!("PING :{}\r\n", self.hub.info.name);
            if self.stream.write_all(ping.as_bytes()).await.is_err() {
                return Some(DEFAULT_QUIT_REASON.to_string());
            }
            self.session.ping_pending = true;
            self.session.ping_sent_at = Some(now);
        }
        None
    }

    /// Broadcast the quit, unbind the nickname, close the socket.
    /// Safe to reach with partially torn-down state.
    async fn teardown(&mut self, handle: &Arc<ClientHandle>, reason: &str) {
        let notice = finish_line(format!(":{} QUIT :{}", handle.mask(), reason));
        self.hub.channels.quit_all(&self.hub.clients, handle, &notice);
        self.hub.clients.unregister(&handle.nick);
        self.session.registered = false;
        self.session.handle = None;

        // Flush anything still queued, then say goodbye.
        if !handle.queue.is_empty() {
            let _ = write_lines(&mut self.stream, &handle.queue.drain()).await;
        }
        let _ = self.send_error_line(reason).await;
        let _ = self.stream.shutdown().await;
    }

    async fn send_error_line(&mut self, reason: &str) -> std::io::Result<()> {
        let line = finish_line(format!("ERROR :Closing Link: {} ({})", self.session.host, reason));
        self.stream.write_all(line.as_bytes()).await
    }
}

async fn write_lines<S: AsyncWrite + Unpin>(stream: &mut S, lines: &[String]) -> std::io::Result<()> {
    for line in lines {
        stream.write_all(line.as_bytes()).await?;
    }
    Ok(())
}
