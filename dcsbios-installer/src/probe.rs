//! Read the target environment state from the host.
//!
//! Nothing is cached: every call queries the filesystem and the service
//! manager again, so re-running the engine is always safe.

use dcsbios_core::{identity, ArtifactSet, InstallError, InstallLayout, TargetState};

use crate::host::{Host, Invocation, Outcome};

pub fn probe(
    host: &dyn Host,
    layout: &InstallLayout,
    artifacts: &ArtifactSet,
) -> Result<TargetState, InstallError> {
    let mut state = TargetState {
        dependencies_satisfied: dependency_importable(host),
        artifacts_deployed: artifacts
            .deployed_required()
            .all(|a| host.exists(&layout.installed(a.file_name))),
        unit_registered: unit_registered(host, layout),
        ..TargetState::default()
    };

    if state.unit_registered {
        let unit = layout.unit_name();
        state.unit_enabled = manager_query(host, "is-enabled", &unit)
            .map(|outcome| outcome.success())
            .unwrap_or(false);
        let active = manager_query(host, "is-active", &unit).unwrap_or_default();
        match active.stdout.trim() {
            "active" | "activating" | "reloading" => state.service_active = true,
            "failed" => state.service_failed = true,
            _ => {}
        }
    }

    tracing::debug!("probed state: {state:?}");
    Ok(state)
}

/// A read-only `systemctl` query. A manager that cannot be reached reports
/// nothing enabled and nothing active.
pub fn manager_query(host: &dyn Host, verb: &str, unit: &str) -> Option<Outcome> {
    match host.run(&Invocation::new("systemctl", [verb, unit])) {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            tracing::debug!("systemctl {verb} could not run: {err}");
            None
        }
    }
}

/// The cheap registration check control commands start with.
pub fn unit_registered(host: &dyn Host, layout: &InstallLayout) -> bool {
    host.exists(&layout.unit_path())
}

/// `python3 -c "import serial"`; a missing interpreter counts as unsatisfied.
pub fn dependency_importable(host: &dyn Host) -> bool {
    let import = format!("import {}", identity::DEPENDENCY_MODULE);
    match host.run(&Invocation::new("python3", ["-c", import.as_str()])) {
        Ok(outcome) => outcome.success(),
        Err(err) => {
            tracing::debug!("dependency probe could not run: {err}");
            false
        }
    }
}
