//! Configuration validation.
//!
//! Runs once at startup, after parsing and before anything binds a
//! socket. Collects every problem instead of stopping at the first so
//! an operator can fix a config file in one pass.

use super::types::Config;

fn is_valid_cloak_key(key: &str) -> bool {
    (5..=100).contains(&key.len()) && key.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Validate the parsed configuration, returning every failure found.
pub fn validate(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push("server.name must not be empty".to_string());
    }
    if config.server.name.contains(' ') {
        errors.push("server.name must not contain spaces".to_string());
    }
    if config.server.network.is_empty() {
        errors.push("server.network must not be empty".to_string());
    }

    for (field, key) in [
        ("cloak.key1", &config.cloak.key1),
        ("cloak.key2", &config.cloak.key2),
        ("cloak.key3", &config.cloak.key3),
    ] {
        if !is_valid_cloak_key(key) {
            errors.push(format!("{field} must be 5-100 alphanumeric characters"));
        }
    }
    if config.cloak.net_prefix.is_empty() {
        errors.push("cloak.net_prefix must not be empty".to_string());
    }

    if config.timeouts.ping_freq == 0 {
        errors.push("timeouts.ping_freq must be positive".to_string());
    }
    if config.timeouts.timeout == 0 {
        errors.push("timeouts.timeout must be positive".to_string());
    }

    if config.listen.standard.is_none() && config.listen.secure.is_none() {
        errors.push("at least one of listen.standard / listen.secure is required".to_string());
    }
    if config.listen.secure.is_some() && config.tls.is_none() {
        errors.push("listen.secure requires a [tls] section".to_string());
    }

    if config.channels.chanlimit == 0 {
        errors.push("channels.chanlimit must be at least 1".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
