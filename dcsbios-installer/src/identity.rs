//! Entry identity precondition.
//!
//! Checked once before any mutation: never root, and either the expected
//! run-as user or a user who can `sudo` without a password.

use dcsbios_core::{ExecutionContext, InstallError, InstallLayout};

use crate::host::{Host, Invocation};

/// Discover who is running the installer.
///
/// Elevation is probed with `sudo -n true` only when the user is not already
/// the expected identity.
pub fn execution_context(
    host: &dyn Host,
    layout: &InstallLayout,
) -> Result<ExecutionContext, InstallError> {
    let uid_raw = read_trimmed(host, &Invocation::new("id", ["-u"]))?;
    let uid = uid_raw.parse::<u32>().map_err(|_| InstallError::CommandFailed {
        command: "id -u".to_string(),
        status: "exit 0".to_string(),
        stderr: format!("unexpected uid '{uid_raw}'"),
    })?;
    let user = read_trimmed(host, &Invocation::new("id", ["-un"]))?;

    let can_elevate = if uid != 0 && user != layout.user {
        host.run(&Invocation::new("sudo", ["-n", "true"]))
            .map(|outcome| outcome.success())
            .unwrap_or(false)
    } else {
        false
    };

    Ok(ExecutionContext {
        uid,
        user,
        can_elevate,
    })
}

/// Decide whether this context may proceed.
pub fn check(context: &ExecutionContext, layout: &InstallLayout) -> Result<(), InstallError> {
    if context.is_root() {
        return Err(InstallError::RunningAsRoot {
            expected: layout.user.clone(),
        });
    }
    if context.user == layout.user || context.can_elevate {
        return Ok(());
    }
    Err(InstallError::IdentityRefused {
        user: context.user.clone(),
        expected: layout.user.clone(),
    })
}

/// Probe and check in one go.
pub fn ensure_permitted(
    host: &dyn Host,
    layout: &InstallLayout,
) -> Result<ExecutionContext, InstallError> {
    let context = execution_context(host, layout)?;
    check(&context, layout)?;
    tracing::debug!(
        "running as {} (uid {}, passwordless sudo: {})",
        context.user,
        context.uid,
        context.can_elevate
    );
    Ok(context)
}

fn read_trimmed(host: &dyn Host, invocation: &Invocation) -> Result<String, InstallError> {
    let outcome = host.run_checked(invocation)?;
    Ok(outcome.stdout.trim().to_string())
}
