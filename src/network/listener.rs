//! Listeners: accept loops for the plaintext and TLS endpoints.
//!
//! Each accepted socket gets its reverse DNS and cloaked host computed
//! up front, then a supervisor task of its own. The TLS endpoint
//! performs the handshake before handing the stream to the same
//! supervisor code.

use std::net::IpAddr;
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info};

use crate::config::{Config, SocketConfig};
use crate::handlers::Dispatcher;
use crate::state::hub::Hub;

use super::connection::Connection;
use super::lookup::DnsResolver;
use super::tls::build_acceptor;

pub struct Listener {
    standard: Option<TcpListener>,
    secure: Option<(TcpListener, TlsAcceptor)>,
    hub: Arc<Hub>,
    dispatcher: Arc<Dispatcher>,
    resolver: Arc<DnsResolver>,
}

/// Bind with an explicit accept backlog.
fn bind_with_backlog(config: &SocketConfig) -> std::io::Result<TcpListener> {
    let socket = Socket::new(
        Domain::for_address(config.address),
        Type::STREAM,
        Some(Protocol::TCP),
    )?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&config.address.into())?;
    socket.listen(config.backlog as i32)?;
    TcpListener::from_std(socket.into())
}

impl Listener {
    /// Bind every configured endpoint.
    pub fn bind(config: &Config, hub: Arc<Hub>, dispatcher: Arc<Dispatcher>) -> anyhow::Result<Self> {
        let standard = match &config.listen.standard {
            Some(socket_config) => {
                let listener = bind_with_backlog(socket_config)?;
                info!(address = %socket_config.address, "Listening (plaintext)");
                Some(listener)
            }
            None => None,
        };

        let secure = match &config.listen.secure {
            Some(socket_config) => {
                let tls = config
                    .tls
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("listen.secure requires [tls]"))?;
                let acceptor = build_acceptor(&tls.certificate, &tls.pkey)?;
                let listener = bind_with_backlog(socket_config)?;
                info!(address = %socket_config.address, "Listening (TLS)");
                Some((listener, acceptor))
            }
            None => None,
        };

        Ok(Self {
            standard,
            secure,
            hub,
            dispatcher,
            resolver: Arc::new(DnsResolver::new()),
        })
    }

    /// Run the accept loops until shutdown is signalled.
    pub async fn run(self) {
        let mut shutdown_rx = self.hub.shutdown.subscribe();
        info!(server = %self.hub.info.name, id = %self.hub.info.id, "Accepting connections");

        if let Some(listener) = self.standard {
            let hub = Arc::clone(&self.hub);
            let dispatcher = Arc::clone(&self.dispatcher);
            let resolver = Arc::clone(&self.resolver);
            tokio::spawn(accept_plaintext(listener, hub, dispatcher, resolver));
        }

        if let Some((listener, acceptor)) = self.secure {
            let hub = Arc::clone(&self.hub);
            let dispatcher = Arc::clone(&self.dispatcher);
            let resolver = Arc::clone(&self.resolver);
            tokio::spawn(accept_tls(listener, acceptor, hub, dispatcher, resolver));
        }

        let _ = shutdown_rx.recv().await;
        info!(
            clients = self.hub.clients.count(),
            channels = self.hub.channels.count(),
            "Listener stopping"
        );
    }
}

/// Reverse DNS then cloak: a PTR name is cloaked as a hostname, a bare
/// address through the IPv4 transform (hostname transform of the
/// address text for IPv6).
async fn identify(hub: &Hub, resolver: &DnsResolver, ip: IpAddr) -> (String, String) {
    match resolver.reverse_lookup(ip).await {
        Some(host) => {
            let pubhost = hub.cloak.hide_host(&host);
            (host, pubhost)
        }
        None => {
            let text = ip.to_string();
            let pubhost = match ip {
                IpAddr::V4(_) => hub.cloak.hide_ipv4(&text),
                IpAddr::V6(_) => hub.cloak.hide_host(&text),
            };
            (text, pubhost)
        }
    }
}

async fn accept_plaintext(
    listener: TcpListener,
    hub: Arc<Hub>,
    dispatcher: Arc<Dispatcher>,
    resolver: Arc<DnsResolver>,
) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "Accept failed");
                continue;
            }
        };
        let hub = Arc::clone(&hub);
        let dispatcher = Arc::clone(&dispatcher);
        let resolver = Arc::clone(&resolver);
        tokio::spawn(async move {
            let (host, pubhost) = identify(&hub, &resolver, addr.ip()).await;
            Connection::new(stream, addr, hub, dispatcher, host, pubhost, false)
                .run()
                .await;
        });
    }
}

async fn accept_tls(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    hub: Arc<Hub>,
    dispatcher: Arc<Dispatcher>,
    resolver: Arc<DnsResolver>,
) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "Accept failed");
                continue;
            }
        };
        let acceptor = acceptor.clone();
        let hub = Arc::clone(&hub);
        let dispatcher = Arc::clone(&dispatcher);
        let resolver = Arc::clone(&resolver);
        tokio::spawn(async move {
            let stream = match acceptor.accept(stream).await {
                Ok(tls_stream) => tls_stream,
                Err(e) => {
                    debug!(%addr, error = %e, "TLS handshake failed");
                    return;
                }
            };
            let (host, pubhost) = identify(&hub, &resolver, addr.ip()).await;
            Connection::new(stream, addr, hub, dispatcher, host, pubhost, true)
                .run()
                .await;
        });
    }
}
