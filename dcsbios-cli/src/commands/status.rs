//! `dcsbios-install status`: probed state plus systemd's own view.
//!
//! Read-only, so it skips the identity check the mutating commands run.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use dcsbios_core::{ServiceState, TargetState};

use super::Session;

/// Arguments for `dcsbios-install status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, session: &Session) -> Result<()> {
        let status = session
            .controller()
            .status()
            .context("cannot report status")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&status).context("failed to render status JSON")?
            );
            return Ok(());
        }

        println!(
            "{}: {}",
            session.layout.unit_name().bold(),
            paint(status.state)
        );
        println!("boot: {}", status.boot);
        print_facts(&status.facts);
        if !status.manager_output.trim().is_empty() {
            println!();
            print!("{}", status.manager_output);
        }
        Ok(())
    }
}

fn paint(state: ServiceState) -> colored::ColoredString {
    let label = state.to_string();
    match state {
        ServiceState::Running => label.green(),
        ServiceState::Failed => label.red(),
        ServiceState::NotInstalled => label.dimmed(),
        ServiceState::Registered | ServiceState::Enabled => label.yellow(),
    }
}

fn print_facts(facts: &TargetState) {
    let rows = [
        ("python dependency", facts.dependencies_satisfied),
        ("files deployed", facts.artifacts_deployed),
        ("unit registered", facts.unit_registered),
        ("start on boot", facts.unit_enabled),
        ("active", facts.service_active),
    ];
    for (label, ok) in rows {
        let mark = if ok { "✓".green() } else { "✗".red() };
        println!("  {mark} {label}");
    }
}
