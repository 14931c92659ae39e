//! Command-line configuration.
//!
//! Every flag can also be set through a `RINGLINK_*` environment variable.

use std::time::Duration;

use clap::Parser;

use crate::commands::{Command, CommandResult};
use crate::logging;

/// Top-level configuration, parsed from the command line.
#[derive(Debug, Parser)]
#[command(name = "ringlink", version, about = "Run and inspect hash-ordered ring nodes")]
pub struct CliConfig {
    /// Log level filter (e.g. `info`, `debug`). `RUST_LOG` overrides it.
    #[arg(long, global = true, env = "RINGLINK_LOG", default_value = "info")]
    pub log_level: String,

    /// Milliseconds a remote call may take, connect included, before it
    /// fails.
    #[arg(
        long,
        global = true,
        env = "RINGLINK_CALL_TIMEOUT",
        value_name = "MS",
        default_value_t = 10_000
    )]
    pub call_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub async fn run(self) -> anyhow::Result<()> {
        logging::init(&self.log_level);

        let result = self
            .command
            .execute(Duration::from_millis(self.call_timeout))
            .await?;
        println!("{result}");

        if let CommandResult::Walk { violations, .. } = &result {
            if !violations.is_empty() {
                anyhow::bail!("ring is inconsistent ({} violations)", violations.len());
            }
        }
        Ok(())
    }
}
