//! Subcommand implementations.

pub mod config;
pub mod merge;
pub mod serve;
