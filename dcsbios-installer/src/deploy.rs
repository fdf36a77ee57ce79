//! Deployer: copy the staged artifacts into the install directory.
//!
//! Every step is idempotent and none is retried. Any failure aborts, since a
//! half-copied installation is not safe to start.

use dcsbios_core::{ArtifactSet, Destination, InstallError, InstallLayout};

use crate::host::{Host, Invocation};
use crate::source::StagedArtifacts;

/// What ended up in the install directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployReport {
    pub copied: Vec<String>,
    pub skipped_optional: Vec<String>,
}

pub fn deploy(
    host: &dyn Host,
    layout: &InstallLayout,
    artifacts: &ArtifactSet,
    staged: &StagedArtifacts,
) -> Result<DeployReport, InstallError> {
    let install_dir = Invocation::path_arg(&layout.install_dir);
    host.run_checked(&Invocation::privileged("mkdir", ["-p", install_dir.as_str()]))?;

    let mut report = DeployReport::default();
    for artifact in artifacts
        .iter()
        .filter(|a| a.kind.destination() == Destination::InstallDir)
    {
        let src = staged.path_of(artifact.file_name);
        if !host.exists(&src) {
            // Required files were verified when staging.
            report.skipped_optional.push(artifact.file_name.to_string());
            continue;
        }
        let dest = layout.installed(artifact.file_name);
        host.run_checked(&Invocation::privileged(
            "cp",
            [
                "-f".to_string(),
                Invocation::path_arg(&src),
                Invocation::path_arg(&dest),
            ],
        ))?;
        if artifact.kind.is_executable() {
            host.run_checked(&Invocation::privileged(
                "chmod",
                ["+x".to_string(), Invocation::path_arg(&dest)],
            ))?;
        }
        tracing::info!("deployed {}", dest.display());
        report.copied.push(artifact.file_name.to_string());
    }

    grant_serial_access(host, layout)?;

    host.run_checked(&Invocation::privileged(
        "chown",
        ["-R".to_string(), layout.owner(), install_dir],
    ))?;

    Ok(report)
}

/// Add the run-as user to the serial-device group. `usermod -a` is a no-op
/// for an existing member.
pub fn grant_serial_access(host: &dyn Host, layout: &InstallLayout) -> Result<(), InstallError> {
    host.run_checked(&Invocation::privileged(
        "usermod",
        [
            "-a",
            "-G",
            layout.serial_group.as_str(),
            layout.user.as_str(),
        ],
    ))?;
    tracing::info!("{} is in group {}", layout.user, layout.serial_group);
    Ok(())
}
