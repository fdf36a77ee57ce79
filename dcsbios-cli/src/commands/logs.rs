//! `dcsbios-install logs`: tail the service journal.
//!
//! Read-only, so it skips the identity check the mutating commands run.

use anyhow::{Context, Result};
use clap::Args;

use super::Session;

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Number of trailing lines to show.
    #[arg(long, default_value_t = 100)]
    pub lines: usize,
}

impl LogsArgs {
    pub fn run(self, session: &Session) -> Result<()> {
        let logs = session
            .controller()
            .logs(self.lines)
            .context("failed to read service journal")?;
        print!("{logs}");
        Ok(())
    }
}
