//! Configuration type definitions.

use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use super::defaults::{default_backlog, default_chanlimit, default_ping_freq, default_timeout};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub cloak: CloakConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    pub listen: ListenConfig,
    /// TLS material; required when a secure listener is configured.
    pub tls: Option<TlsConfig>,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
}

/// This server's identity.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Short server id advertised in diagnostics (e.g. "001").
    pub id: String,
    /// Server name used as the source of every numeric (e.g.
    /// "irc.example.net").
    pub name: String,
    pub description: String,
    /// Network name shown in the welcome line.
    pub network: String,
}

/// Administrative contact.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub name: String,
    pub nick: String,
    pub email: String,
}

/// Cloaking salts. Keys must be 5–100 alphanumeric bytes.
#[derive(Debug, Clone, Deserialize)]
pub struct CloakConfig {
    pub net_prefix: String,
    pub key1: String,
    pub key2: String,
    pub key3: String,
}

/// Liveness timers, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsConfig {
    /// Idle seconds before the server sends PING.
    #[serde(default = "default_ping_freq")]
    pub ping_freq: u64,
    /// Seconds after a PING without activity before disconnect.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            ping_freq: default_ping_freq(),
            timeout: default_timeout(),
        }
    }
}

/// The two listen endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Plaintext endpoint.
    pub standard: Option<SocketConfig>,
    /// TLS endpoint.
    pub secure: Option<SocketConfig>,
}

/// One listen endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketConfig {
    /// Address to bind (e.g. "0.0.0.0:6667").
    pub address: SocketAddr,
    /// Accept backlog for not-yet-served connections.
    #[serde(default = "default_backlog")]
    pub backlog: u32,
}

/// TLS certificate material.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Path to the certificate chain (PEM).
    pub certificate: String,
    /// Path to the PKCS#8 private key (PEM).
    pub pkey: String,
}

/// Auxiliary files.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesConfig {
    /// Path to the MOTD file; a built-in block is used when absent.
    pub motd: Option<String>,
}

/// Channel limits.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelsConfig {
    /// Most channels a single client may be in at once.
    #[serde(default = "default_chanlimit")]
    pub chanlimit: usize,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            chanlimit: default_chanlimit(),
        }
    }
}

impl Config {
    /// Load and parse the configuration file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }
}
