//! Shared building blocks: errors, configuration, events, size formatting.

pub mod config;
pub mod errors;
pub mod events;
pub mod format;
