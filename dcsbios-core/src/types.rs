//! Domain types for the DCS-BIOS installation engine.
//!
//! Nothing in here touches the host. State types are produced by probing
//! (see `dcsbios-installer::probe`) and are never persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Installation identity
// ---------------------------------------------------------------------------

/// Fixed identity of the one deployment this engine manages.
pub mod identity {
    pub const SERVICE_NAME: &str = "dcsbios";
    pub const UNIT_FILE: &str = "dcsbios.service";
    pub const INSTALL_DIR: &str = "/opt/dcsbios";
    pub const UNIT_DIR: &str = "/etc/systemd/system";
    pub const RUN_AS_USER: &str = "pi";
    pub const RUN_AS_GROUP: &str = "pi";
    pub const SERIAL_GROUP: &str = "dialout";

    /// Python module the daemon imports.
    pub const DEPENDENCY_MODULE: &str = "serial";
    pub const NATIVE_PACKAGE: &str = "python3-serial";
    pub const INSTALLER_PACKAGE: &str = "python3-pip";
    pub const INSTALLER_PROGRAM: &str = "pip3";
    pub const SYSTEM_WIDE_FLAG: &str = "--break-system-packages";
    pub const FALLBACK_PACKAGE: &str = "pyserial";
    pub const MANIFEST_FILE: &str = "requirements.txt";

    pub const DEFAULT_REMOTE_BASE: &str =
        "https://raw.githubusercontent.com/dcsbios-pi/dcsbios-pi/main";
}

// ---------------------------------------------------------------------------
// Artifact set
// ---------------------------------------------------------------------------

/// Role of a file within the artifact set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    EntryScript,
    DaemonScript,
    Manifest,
    UnitDefinition,
    License,
    Readme,
}

impl ArtifactKind {
    pub fn is_required(self) -> bool {
        matches!(
            self,
            ArtifactKind::EntryScript
                | ArtifactKind::DaemonScript
                | ArtifactKind::Manifest
                | ArtifactKind::UnitDefinition
        )
    }

    pub fn is_executable(self) -> bool {
        matches!(self, ArtifactKind::EntryScript | ArtifactKind::DaemonScript)
    }

    /// Where the deployed copy lives.
    pub fn destination(self) -> Destination {
        match self {
            ArtifactKind::UnitDefinition => Destination::UnitDir,
            _ => Destination::InstallDir,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::EntryScript => write!(f, "entry script"),
            ArtifactKind::DaemonScript => write!(f, "daemon script"),
            ArtifactKind::Manifest => write!(f, "dependency manifest"),
            ArtifactKind::UnitDefinition => write!(f, "unit definition"),
            ArtifactKind::License => write!(f, "license"),
            ArtifactKind::Readme => write!(f, "readme"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    InstallDir,
    UnitDir,
}

/// A named file in the artifact set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub file_name: &'static str,
}

/// Ordered, fixed list of files that make up one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
}

impl Default for ArtifactSet {
    fn default() -> Self {
        Self {
            artifacts: vec![
                Artifact {
                    kind: ArtifactKind::EntryScript,
                    file_name: "dcsbios_tui.py",
                },
                Artifact {
                    kind: ArtifactKind::DaemonScript,
                    file_name: "dcsbios_daemon.py",
                },
                Artifact {
                    kind: ArtifactKind::Manifest,
                    file_name: identity::MANIFEST_FILE,
                },
                Artifact {
                    kind: ArtifactKind::UnitDefinition,
                    file_name: identity::UNIT_FILE,
                },
                Artifact {
                    kind: ArtifactKind::License,
                    file_name: "LICENSE",
                },
                Artifact {
                    kind: ArtifactKind::Readme,
                    file_name: "README.md",
                },
            ],
        }
    }
}

impl ArtifactSet {
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    pub fn required(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(|a| a.kind.is_required())
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }

    /// Required files that land in the install directory, i.e. what a probe
    /// expects to find after deployment.
    pub fn deployed_required(&self) -> impl Iterator<Item = &Artifact> {
        self.required()
            .filter(|a| a.kind.destination() == Destination::InstallDir)
    }
}

// ---------------------------------------------------------------------------
// Target environment state
// ---------------------------------------------------------------------------

/// Snapshot of host facts, always freshly probed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetState {
    pub dependencies_satisfied: bool,
    pub artifacts_deployed: bool,
    pub unit_registered: bool,
    pub unit_enabled: bool,
    pub service_active: bool,
    /// The manager reports the unit as failed.
    #[serde(default)]
    pub service_failed: bool,
}

impl TargetState {
    pub fn service_state(&self) -> ServiceState {
        if !self.unit_registered {
            ServiceState::NotInstalled
        } else if self.service_active {
            ServiceState::Running
        } else if self.service_failed {
            ServiceState::Failed
        } else if self.unit_enabled {
            ServiceState::Enabled
        } else {
            ServiceState::Registered
        }
    }

    pub fn boot_state(&self) -> BootState {
        match (self.unit_registered, self.unit_enabled) {
            (false, _) => BootState::NotInstalled,
            (true, false) => BootState::Disabled,
            (true, true) => BootState::Enabled,
        }
    }

    pub fn fully_installed(&self) -> bool {
        self.dependencies_satisfied
            && self.artifacts_deployed
            && self.unit_registered
            && self.unit_enabled
            && self.service_active
    }
}

/// Lifecycle state of the managed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceState {
    NotInstalled,
    Registered,
    Enabled,
    Running,
    Failed,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::NotInstalled => write!(f, "not installed"),
            ServiceState::Registered => write!(f, "registered"),
            ServiceState::Enabled => write!(f, "enabled"),
            ServiceState::Running => write!(f, "running"),
            ServiceState::Failed => write!(f, "failed"),
        }
    }
}

/// Whether the service comes up on boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BootState {
    NotInstalled,
    /// Registered, but not started on boot.
    Disabled,
    Enabled,
}

impl fmt::Display for BootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootState::NotInstalled => write!(f, "not installed"),
            BootState::Disabled => write!(f, "installed (disabled)"),
            BootState::Enabled => write!(f, "enabled"),
        }
    }
}

// ---------------------------------------------------------------------------
// Execution context
// ---------------------------------------------------------------------------

/// Who invoked the installer and whether they can elevate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub uid: u32,
    pub user: String,
    pub can_elevate: bool,
}

impl ExecutionContext {
    pub fn is_root(&self) -> bool {
        self.uid == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
