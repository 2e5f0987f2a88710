//! Subcommand implementations.

pub mod check;
pub mod snapshot;
