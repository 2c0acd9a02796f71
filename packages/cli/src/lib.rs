//! Command-line host for layerfs.
//!
//! Loads a JSON overlay config, provisions it, and runs one read-only
//! command against the composed tree.

mod commands;

pub use commands::{dispatch, Cli, CliError, Command};
