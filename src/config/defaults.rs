//! Serde default values for optional configuration fields.

pub fn default_ping_freq() -> u64 {
    90
}

pub fn default_timeout() -> u64 {
    180
}

pub fn default_backlog() -> u32 {
    16
}

pub fn default_chanlimit() -> usize {
    10
}
