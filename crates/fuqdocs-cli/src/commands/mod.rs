//! CLI command implementations

pub mod config;
pub mod document;
pub mod status;
pub mod theme;
pub mod watch;
