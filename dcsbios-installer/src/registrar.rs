//! Service registrar: hand the unit definition to systemd.

use std::path::PathBuf;

use dcsbios_core::{ArtifactKind, ArtifactSet, InstallError, InstallLayout};

use crate::host::{Host, Invocation};
use crate::source::StagedArtifacts;

/// Unit files are world-readable, owner-writable.
pub const UNIT_MODE: &str = "644";

/// Install the unit file and reload the manager's unit index.
///
/// Runs after every deployment; systemd would otherwise keep serving a stale
/// cached definition.
pub fn register(
    host: &dyn Host,
    layout: &InstallLayout,
    artifacts: &ArtifactSet,
    staged: &StagedArtifacts,
) -> Result<PathBuf, InstallError> {
    let file_name = artifacts
        .get(ArtifactKind::UnitDefinition)
        .map(|a| a.file_name)
        .unwrap_or(dcsbios_core::identity::UNIT_FILE);
    let src = staged.path_of(file_name);
    let dest = layout.unit_path();

    host.run_checked(&Invocation::privileged(
        "install",
        [
            "-m".to_string(),
            UNIT_MODE.to_string(),
            Invocation::path_arg(&src),
            Invocation::path_arg(&dest),
        ],
    ))?;
    daemon_reload(host)?;

    tracing::info!("registered {}", dest.display());
    Ok(dest)
}

pub fn daemon_reload(host: &dyn Host) -> Result<(), InstallError> {
    host.run_checked(&reload_invocation())?;
    Ok(())
}

pub(crate) fn reload_invocation() -> Invocation {
    Invocation::privileged("systemctl", ["daemon-reload"])
}
