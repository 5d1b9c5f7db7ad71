//! The Hub: shared server state.
//!
//! Everything the connection supervisors share lives here, built once
//! at startup and threaded to each supervisor as an `Arc`; there are
//! no ambient globals. The registries carry their own locks, the rest
//! is immutable.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::config::Config;
use crate::security::CloakKeys;

use super::channels::ChannelDirectory;
use super::clients::ClientDirectory;

/// Compile-time version string shown in the welcome block.
pub const VERSION: &str = concat!("cinderd-", env!("CARGO_PKG_VERSION"));

/// This server's identity, fixed at startup.
pub struct ServerInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub network: String,
    pub created: DateTime<Utc>,
}

pub struct Hub {
    pub clients: ClientDirectory,
    pub channels: ChannelDirectory,
    pub info: ServerInfo,
    pub cloak: CloakKeys,
    pub motd: Vec<String>,
    pub chanlimit: usize,
    /// Idle seconds before the server pings a registered client.
    pub ping_freq: u64,
    /// Seconds after a PING without activity before disconnect.
    pub ping_timeout: u64,
    /// Fired once at shutdown; every supervisor subscribes.
    pub shutdown: broadcast::Sender<()>,
}

impl Hub {
    pub fn new(config: &Config, motd: Vec<String>) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            clients: ClientDirectory::new(),
            channels: ChannelDirectory::new(),
            info: ServerInfo {
                id: config.server.id.clone(),
                name: config.server.name.clone(),
                description: config.server.description.clone(),
                network: config.server.network.clone(),
                created: Utc::now(),
            },
            cloak: CloakKeys {
                net_prefix: config.cloak.net_prefix.clone(),
                key1: config.cloak.key1.clone(),
                key2: config.cloak.key2.clone(),
                key3: config.cloak.key3.clone(),
            },
            motd,
            chanlimit: config.channels.chanlimit,
            ping_freq: config.timeouts.ping_freq,
            ping_timeout: config.timeouts.timeout,
            shutdown,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A Hub with fixed identity for handler and engine tests.
    pub fn test_hub() -> Hub {
        let config: Config = toml::from_str(
            r#"
[server]
id = "001"
name = "irc.example.net"
description = "Example IRC server"
network = "ExampleNet"

[admin]
name = "Operator"
nick = "oper"
email = "oper@example.net"

[cloak]
net_prefix = "EX"
key1 = "aRstc2l3g0Zwe"
key2 = "0mQz93fjHa7T1"
key3 = "pLx5VbnK2ReQ8"

[timeouts]
ping_freq = 60
timeout = 120

[listen.standard]
address = "127.0.0.1:6667"

[channels]
chanlimit = 3
"#,
        )
        .unwrap();
        Hub::new(&config, vec!["Welcome to ExampleNet.".to_string()])
    }
}
