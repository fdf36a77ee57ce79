//! Dependency resolution: make the daemon's one Python dependency importable
//! system-wide, preferring the distribution package over pip.

use std::path::{Path, PathBuf};

use dcsbios_core::{identity, InstallError};

use crate::chain::{Attempt, Chain, ChainMode};
use crate::host::{Host, Invocation};
use crate::probe::dependency_importable;

/// pip's message when it does not know `--break-system-packages`.
pub const FLAG_REJECTED: &str = "no such option";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Already importable; nothing was run.
    AlreadySatisfied,
    /// Installed by the named strategy.
    Installed { strategy: String },
}

/// Ensure the dependency is importable, installing it if needed.
///
/// `manifest` is the `requirements.txt` inside the artifact source, used
/// only when the native package cannot be installed.
pub fn ensure_dependencies(
    host: &dyn Host,
    manifest: Option<&Path>,
) -> Result<Resolution, InstallError> {
    if dependency_importable(host) {
        tracing::info!("python module '{}' already importable", identity::DEPENDENCY_MODULE);
        return Ok(Resolution::AlreadySatisfied);
    }

    ensure_installer(host)?;

    let report = dependency_chain(manifest).run(host)?;
    let strategy = report.succeeded.unwrap_or_else(|| "none".to_string());
    Ok(Resolution::Installed { strategy })
}

/// Install pip through apt when it is missing. Not part of the fallback chain:
/// failure here is a plain step error.
pub fn ensure_installer(host: &dyn Host) -> Result<(), InstallError> {
    let present = host
        .run(&Invocation::new(identity::INSTALLER_PROGRAM, ["--version"]))
        .map(|outcome| outcome.success())
        .unwrap_or(false);
    if present {
        return Ok(());
    }

    tracing::info!(
        "{} not found, installing {}",
        identity::INSTALLER_PROGRAM,
        identity::INSTALLER_PACKAGE
    );
    host.run_checked(&apt_update())?;
    host.run_checked(&apt_install(identity::INSTALLER_PACKAGE))?;
    Ok(())
}

/// The ordered strategies, as data.
pub fn dependency_chain(manifest: Option<&Path>) -> Chain {
    let target: Vec<String> = match manifest {
        Some(path) => vec!["-r".to_string(), Invocation::path_arg(path)],
        None => vec![identity::FALLBACK_PACKAGE.to_string()],
    };
    let source_label = match manifest {
        Some(_) => identity::MANIFEST_FILE.to_string(),
        None => identity::FALLBACK_PACKAGE.to_string(),
    };

    Chain::new("dependency resolution", ChainMode::FirstSuccess)
        .then(Attempt::new(
            format!("apt {}", identity::NATIVE_PACKAGE),
            vec![apt_update(), apt_install(identity::NATIVE_PACKAGE)],
        ))
        .then(Attempt::new(
            format!(
                "{} {} ({})",
                identity::INSTALLER_PROGRAM,
                identity::SYSTEM_WIDE_FLAG,
                source_label
            ),
            vec![pip_install(true, &target)],
        ))
        .then(
            Attempt::new(
                format!("{} ({})", identity::INSTALLER_PROGRAM, source_label),
                vec![pip_install(false, &target)],
            )
            .only_if_previous_failed_with(FLAG_REJECTED),
        )
}

/// `<dir>/requirements.txt` if it exists on the host.
pub fn manifest_in(host: &dyn Host, dir: &Path) -> Option<PathBuf> {
    let path = dir.join(identity::MANIFEST_FILE);
    host.exists(&path).then_some(path)
}

fn apt_update() -> Invocation {
    Invocation::privileged("apt-get", ["update"])
}

fn apt_install(package: &str) -> Invocation {
    Invocation::privileged("apt-get", ["install", "-y", package])
}

fn pip_install(system_wide: bool, target: &[String]) -> Invocation {
    let mut args = vec!["install".to_string()];
    if system_wide {
        args.push(identity::SYSTEM_WIDE_FLAG.to_string());
    }
    args.extend(target.iter().cloned());
    Invocation::privileged(identity::INSTALLER_PROGRAM, args)
}
