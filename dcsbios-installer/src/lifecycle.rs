//! Lifecycle controller for the registered service.
//!
//! ```text
//! NotInstalled --install--> Registered --enable--> Enabled --start--> Running
//!                           Registered <--disable-- Enabled
//!                           Registered ---------------start---------> Running
//! Running --stop--> Enabled | Registered      Running --restart--> Running
//! any --uninstall--> NotInstalled
//! ```
//!
//! Every mutating operation re-probes registration first; an unregistered
//! unit fails with [`InstallError::NotInstalled`] before systemd is touched.

use serde::Serialize;

use dcsbios_core::{
    ArtifactSet, BootState, InstallError, InstallLayout, ServiceState, TargetState,
};

use crate::chain::{Attempt, Chain, ChainMode, ChainReport};
use crate::host::{Host, Invocation, Outcome};
use crate::probe;
use crate::registrar;
use crate::source::StagedArtifacts;

/// Result of a start or restart, including the one-shot activity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartReport {
    /// `systemctl is-active` reported the unit active right after starting.
    pub active: bool,
}

/// Read-only status snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub state: ServiceState,
    pub boot: BootState,
    pub facts: TargetState,
    /// `systemctl status` output, verbatim.
    #[serde(skip)]
    pub manager_output: String,
}

pub struct ServiceController<'a> {
    host: &'a dyn Host,
    layout: &'a InstallLayout,
    artifacts: &'a ArtifactSet,
}

impl<'a> ServiceController<'a> {
    pub fn new(host: &'a dyn Host, layout: &'a InstallLayout, artifacts: &'a ArtifactSet) -> Self {
        Self {
            host,
            layout,
            artifacts,
        }
    }

    pub fn probe(&self) -> Result<TargetState, InstallError> {
        probe::probe(self.host, self.layout, self.artifacts)
    }

    pub fn state(&self) -> Result<ServiceState, InstallError> {
        Ok(self.probe()?.service_state())
    }

    pub fn is_registered(&self) -> bool {
        probe::unit_registered(self.host, self.layout)
    }

    pub fn require_registered(&self) -> Result<(), InstallError> {
        if self.is_registered() {
            return Ok(());
        }
        Err(InstallError::NotInstalled {
            unit: self.layout.unit_name(),
        })
    }

    /// NotInstalled → Registered.
    pub fn install(&self, staged: &StagedArtifacts) -> Result<(), InstallError> {
        registrar::register(self.host, self.layout, self.artifacts, staged)?;
        Ok(())
    }

    /// Registered → Enabled: start on boot.
    pub fn enable(&self) -> Result<(), InstallError> {
        self.require_registered()?;
        self.systemctl("enable")?;
        tracing::info!("{} enabled for boot", self.layout.unit_name());
        Ok(())
    }

    /// Enabled → Registered: stay installed, but do not start on boot. A
    /// running service keeps running.
    pub fn disable(&self) -> Result<(), InstallError> {
        self.require_registered()?;
        self.systemctl("disable")?;
        tracing::info!("{} disabled for boot", self.layout.unit_name());
        Ok(())
    }

    /// Enabled/Registered → Running, followed by a single activity check.
    pub fn start(&self) -> Result<StartReport, InstallError> {
        self.require_registered()?;
        self.systemctl("start")?;
        Ok(self.confirm_active())
    }

    /// Running → Enabled/Registered.
    pub fn stop(&self) -> Result<(), InstallError> {
        self.require_registered()?;
        self.systemctl("stop")?;
        tracing::info!("{} stopped", self.layout.unit_name());
        Ok(())
    }

    pub fn restart(&self) -> Result<StartReport, InstallError> {
        self.require_registered()?;
        self.systemctl("restart")?;
        Ok(self.confirm_active())
    }

    /// Read-only: probe plus the manager's own status text.
    pub fn status(&self) -> Result<StatusReport, InstallError> {
        self.require_registered()?;
        let facts = self.probe()?;
        let unit = self.layout.unit_name();
        // `systemctl status` exits non-zero for inactive units; that is data.
        let outcome = self
            .host
            .run(&Invocation::new(
                "systemctl",
                ["status", unit.as_str(), "--no-pager"],
            ))
            .unwrap_or_else(|err| {
                tracing::warn!("no manager status for {unit}: {err}");
                Outcome::default()
            });
        Ok(StatusReport {
            state: facts.service_state(),
            boot: facts.boot_state(),
            facts,
            manager_output: outcome.stdout,
        })
    }

    /// Trailing journal lines for the unit.
    pub fn logs(&self, lines: usize) -> Result<String, InstallError> {
        self.require_registered()?;
        let unit = self.layout.unit_name();
        let count = lines.to_string();
        let outcome = self.host.run_checked(&Invocation::new(
            "journalctl",
            ["-u", unit.as_str(), "-n", count.as_str(), "--no-pager"],
        ))?;
        Ok(outcome.stdout)
    }

    /// any → NotInstalled. Every sub-step runs; failures come back as
    /// warnings in the report.
    pub fn uninstall(&self, purge: bool) -> Result<ChainReport, InstallError> {
        self.require_registered()?;
        uninstall_chain(self.layout, purge).run(self.host)
    }

    /// Poll `is-active` once. Inactive is a warning, never an error.
    fn confirm_active(&self) -> StartReport {
        let unit = self.layout.unit_name();
        let active = self
            .host
            .run(&Invocation::new("systemctl", ["is-active", unit.as_str()]))
            .map(|outcome| outcome.success())
            .unwrap_or(false);
        if active {
            tracing::info!("{unit} is active");
        } else {
            tracing::warn!(
                "{unit} did not report active after start; inspect `journalctl -u {unit}`"
            );
        }
        StartReport { active }
    }

    fn systemctl(&self, verb: &str) -> Result<(), InstallError> {
        let unit = self.layout.unit_name();
        self.host
            .run_checked(&Invocation::privileged("systemctl", [verb, unit.as_str()]))?;
        Ok(())
    }
}

/// Uninstall sub-steps, in order, all best-effort.
pub fn uninstall_chain(layout: &InstallLayout, purge: bool) -> Chain {
    let unit = layout.unit_name();
    let unit_path = Invocation::path_arg(&layout.unit_path());

    let mut chain = Chain::new("uninstall", ChainMode::BestEffort)
        .then(step("stop", "systemctl", ["stop", unit.as_str()]))
        .then(step("disable", "systemctl", ["disable", unit.as_str()]))
        .then(step("remove unit file", "rm", ["-f", unit_path.as_str()]))
        .then(Attempt::new("daemon-reload", vec![registrar::reload_invocation()]).non_fatal())
        .then(step("reset-failed", "systemctl", ["reset-failed", unit.as_str()]));

    if purge {
        let install_dir = Invocation::path_arg(&layout.install_dir);
        chain = chain.then(step("remove install directory", "rm", ["-rf", install_dir.as_str()]));
    }
    chain
}

fn step<const N: usize>(label: &str, program: &str, args: [&str; N]) -> Attempt {
    Attempt::new(label, vec![Invocation::privileged(program, args)]).non_fatal()
}
