//! dcsbios-install: installs and controls the DCS-BIOS service on a Pi.
//!
//! # Usage
//!
//! ```text
//! dcsbios-install [install] [--local <dir> | --remote [<url>]]
//! dcsbios-install status [--json]
//! dcsbios-install start|stop|restart
//! dcsbios-install enable|disable
//! dcsbios-install uninstall [--purge]
//! dcsbios-install logs [--lines <n>]
//! dcsbios-install help
//! ```
//!
//! Every invocation accepts `--dry-run` (log privileged commands instead of
//! running them) and `-v` (debug logging).

mod commands;

use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{
    control::UninstallArgs, install::InstallArgs, logs::LogsArgs, status::StatusArgs, Session,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "dcsbios-install",
    version,
    about = "Install and manage the DCS-BIOS background service",
    long_about = None,
)]
struct Cli {
    /// Log privileged commands instead of running them.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Source selection for the default install.
    #[command(flatten)]
    install: InstallArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install dependencies, deploy, register, enable and start (default).
    Install(InstallArgs),

    /// Show service state.
    Status(StatusArgs),

    /// Start the service.
    Start,

    /// Stop the service.
    Stop,

    /// Restart the service.
    Restart,

    /// Start the service on boot.
    Enable,

    /// Stop starting the service on boot; a running service keeps running.
    Disable,

    /// Stop, disable and unregister the service.
    Uninstall(UninstallArgs),

    /// Print recent service journal lines.
    Logs(LogsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    init_tracing(cli.verbose);

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(1)
        }
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    if cli.command.is_some() && cli.install.selects_source() {
        bail!("--local and --remote only apply to install");
    }
    let session = Session::from_env(cli.dry_run);
    match cli.command {
        None => cli.install.run(&session),
        Some(Commands::Install(args)) => args.run(&session),
        Some(Commands::Status(args)) => args.run(&session),
        Some(Commands::Start) => commands::control::start(&session),
        Some(Commands::Stop) => commands::control::stop(&session),
        Some(Commands::Restart) => commands::control::restart(&session),
        Some(Commands::Enable) => commands::control::enable(&session),
        Some(Commands::Disable) => commands::control::disable(&session),
        Some(Commands::Uninstall(args)) => args.run(&session),
        Some(Commands::Logs(args)) => args.run(&session),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
