//! CLI tool for running and inspecting ring nodes.
//!
//! Provides commands for:
//! - Running a node and joining it to a ring
//! - Inspecting one node's links
//! - Walking and verifying a whole ring
//! - Hashing hostnames onto the ring

pub mod commands;
pub mod config;
pub mod logging;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
