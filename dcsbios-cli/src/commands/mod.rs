//! Subcommand implementations.

pub mod control;
pub mod install;
pub mod logs;
pub mod status;

use std::path::PathBuf;

use dcsbios_core::{ArtifactSet, InstallLayout};
use dcsbios_installer::{DryRunHost, Host, ServiceController, SystemHost};

/// Re-roots the install layout; used by tests and image builds.
pub const ROOT_ENV: &str = "DCSBIOS_ROOT";

/// Everything a subcommand needs: the host seam and the fixed layout.
pub struct Session {
    pub host: Box<dyn Host>,
    pub layout: InstallLayout,
    pub artifacts: ArtifactSet,
    pub dry_run: bool,
}

impl Session {
    pub fn from_env(dry_run: bool) -> Self {
        let host: Box<dyn Host> = if dry_run {
            Box::new(DryRunHost::new(SystemHost))
        } else {
            Box::new(SystemHost)
        };
        let layout = match std::env::var_os(ROOT_ENV) {
            Some(root) if !root.is_empty() => InstallLayout::rooted_at(&PathBuf::from(root)),
            _ => InstallLayout::default(),
        };
        tracing::debug!(
            "install dir {}, unit dir {}",
            layout.install_dir.display(),
            layout.unit_dir.display()
        );
        Self {
            host,
            layout,
            artifacts: ArtifactSet::default(),
            dry_run,
        }
    }

    pub fn controller(&self) -> ServiceController<'_> {
        ServiceController::new(self.host.as_ref(), &self.layout, &self.artifacts)
    }
}
