//! `dcsbios-install [install]`: the full reconciliation pipeline.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use dcsbios_installer::{ArtifactSource, HttpFetcher, InstallReport, Installer, Resolution};

use super::Session;

/// Arguments for `dcsbios-install install`.
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Deploy from this directory (default: the installer's own directory).
    #[arg(long, value_name = "DIR", conflicts_with = "remote")]
    pub local: Option<PathBuf>,

    /// Fetch artifacts over HTTPS, optionally from another base URL.
    #[arg(long, value_name = "URL", num_args = 0..=1, default_missing_value = "")]
    pub remote: Option<String>,
}

impl InstallArgs {
    pub fn run(self, session: &Session) -> Result<()> {
        let source = self.source()?;
        let fetcher = HttpFetcher::default();

        let report = Installer::new(session.host.as_ref(), &fetcher, source)
            .with_layout(session.layout.clone())
            .run()
            .context("installation failed; fix the cause and re-run, every step is idempotent")?;

        print_report(session, &report);
        Ok(())
    }

    /// `--local` or `--remote` was given.
    pub fn selects_source(&self) -> bool {
        self.local.is_some() || self.remote.is_some()
    }

    fn source(&self) -> Result<ArtifactSource> {
        if let Some(url) = self.remote.as_deref() {
            let base = (!url.is_empty()).then_some(url);
            return Ok(ArtifactSource::remote(base));
        }
        match &self.local {
            Some(dir) => {
                let dir = dir
                    .canonicalize()
                    .with_context(|| format!("cannot resolve path '{}'", dir.display()))?;
                Ok(ArtifactSource::Local(dir))
            }
            None => ArtifactSource::beside_executable()
                .context("cannot locate the installer's directory"),
        }
    }
}

fn print_report(session: &Session, report: &InstallReport) {
    let prefix = if session.dry_run { "[dry-run] " } else { "" };
    let unit = session.layout.unit_name();

    match &report.resolution {
        Some(Resolution::AlreadySatisfied) => println!("{prefix}  ·  python dependency present"),
        Some(Resolution::Installed { strategy }) => {
            println!("{prefix}  ✎  python dependency installed via {strategy}")
        }
        None => {}
    }
    for file in &report.deployed.copied {
        println!(
            "{prefix}  ✎  {}",
            session.layout.installed(file).display()
        );
    }
    if let Some(path) = &report.unit_path {
        println!("{prefix}  ✎  {}", path.display());
    }

    if report.start_warning() && !session.dry_run {
        println!(
            "{} {unit} was started but is not active; inspect `dcsbios-install logs`",
            "!".yellow().bold()
        );
    }
    println!(
        "{prefix}{} {unit} installed ({})",
        "✓".green(),
        report.final_state.service_state()
    );
}
