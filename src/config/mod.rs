//! Configuration loading and validation.
//!
//! Read once at startup from a TOML file, validated, then treated as an
//! immutable snapshot for the life of the process.

mod defaults;
mod types;
mod validation;

pub use types::{
    AdminConfig, ChannelsConfig, CloakConfig, Config, FilesConfig, ListenConfig, ServerConfig,
    SocketConfig, TimeoutsConfig, TlsConfig,
};
pub use validation::validate;
