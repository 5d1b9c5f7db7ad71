//! Security primitives: host cloaking.

pub mod cloak;

pub use cloak::CloakKeys;
