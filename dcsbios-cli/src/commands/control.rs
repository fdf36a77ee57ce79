//! `dcsbios-install start|stop|restart|enable|disable|uninstall`
//!
//! Every command here mutates the host, so each passes the registration and
//! identity checks in [`prepare`] before systemd is touched.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use dcsbios_installer::{identity, ServiceController, StartReport};

use super::Session;

/// Arguments for `dcsbios-install uninstall`.
#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Also remove the install directory.
    #[arg(long)]
    pub purge: bool,
}

impl UninstallArgs {
    pub fn run(self, session: &Session) -> Result<()> {
        let controller = prepare(session)?;
        let report = controller
            .uninstall(self.purge)
            .context("failed to uninstall service")?;

        for failure in &report.failures {
            println!("  {} {failure}", "!".yellow());
        }
        println!(
            "{} {} uninstalled",
            "✓".green(),
            session.layout.unit_name()
        );
        Ok(())
    }
}

pub fn start(session: &Session) -> Result<()> {
    let report = prepare(session)?
        .start()
        .context("failed to start service")?;
    print_started(session, "started", report);
    Ok(())
}

pub fn stop(session: &Session) -> Result<()> {
    prepare(session)?.stop().context("failed to stop service")?;
    println!("{} {} stopped", "✓".green(), session.layout.unit_name());
    Ok(())
}

pub fn restart(session: &Session) -> Result<()> {
    let report = prepare(session)?
        .restart()
        .context("failed to restart service")?;
    print_started(session, "restarted", report);
    Ok(())
}

pub fn enable(session: &Session) -> Result<()> {
    prepare(session)?
        .enable()
        .context("failed to enable service")?;
    println!("{} {} starts on boot", "✓".green(), session.layout.unit_name());
    Ok(())
}

pub fn disable(session: &Session) -> Result<()> {
    prepare(session)?
        .disable()
        .context("failed to disable service")?;
    println!(
        "{} {} no longer starts on boot",
        "✓".green(),
        session.layout.unit_name()
    );
    Ok(())
}

/// Registration first, then identity; nothing reaches systemd if either fails.
fn prepare(session: &Session) -> Result<ServiceController<'_>> {
    let controller = session.controller();
    controller.require_registered()?;
    identity::ensure_permitted(session.host.as_ref(), &session.layout)
        .context("identity check failed")?;
    Ok(controller)
}

pub(crate) fn print_started(session: &Session, verb: &str, report: StartReport) {
    let unit = session.layout.unit_name();
    if report.active || session.dry_run {
        println!("{} {unit} {verb}", "✓".green());
    } else {
        println!(
            "{} {unit} {verb} but is not active; inspect `dcsbios-install logs`",
            "!".yellow().bold()
        );
    }
}
