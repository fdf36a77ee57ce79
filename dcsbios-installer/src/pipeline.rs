//! The full install pipeline: a fixed, ordered list of steps.
//!
//! A failing step aborts everything after it and surfaces as
//! [`InstallError::StepFailed`]. There is no rollback; every step is
//! idempotent, so re-running is the recovery path.
//!
//! Staging runs before dependency resolution because it touches nothing on
//! the host and supplies the manifest the resolver reads. Host mutations
//! happen strictly in the order resolver → deployer → registrar → lifecycle,
//! and each mutating step starts from a fresh probe of the host.

use std::fmt;
use std::path::PathBuf;

use dcsbios_core::{ArtifactSet, InstallError, InstallLayout, TargetState};

use crate::deploy::{self, DeployReport};
use crate::host::Host;
use crate::identity;
use crate::lifecycle::{ServiceController, StartReport};
use crate::probe;
use crate::resolver::{self, Resolution};
use crate::source::{ArtifactSource, Fetch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Identity,
    Stage,
    Dependencies,
    Deploy,
    Register,
    Enable,
    Start,
}

pub const INSTALL_STEPS: [Step; 7] = [
    Step::Identity,
    Step::Stage,
    Step::Dependencies,
    Step::Deploy,
    Step::Register,
    Step::Enable,
    Step::Start,
];

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Step::Identity => "check identity",
            Step::Stage => "stage artifacts",
            Step::Dependencies => "resolve dependencies",
            Step::Deploy => "deploy",
            Step::Register => "register unit",
            Step::Enable => "enable service",
            Step::Start => "start service",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub completed: Vec<Step>,
    pub resolution: Option<Resolution>,
    pub deployed: DeployReport,
    pub unit_path: Option<PathBuf>,
    pub start: Option<StartReport>,
    pub initial_state: TargetState,
    pub final_state: TargetState,
}

impl InstallReport {
    /// The service did not confirm active after start.
    pub fn start_warning(&self) -> bool {
        matches!(self.start, Some(StartReport { active: false }))
    }
}

pub struct Installer<'a> {
    host: &'a dyn Host,
    fetcher: &'a dyn Fetch,
    layout: InstallLayout,
    artifacts: ArtifactSet,
    source: ArtifactSource,
    scratch_parent: Option<PathBuf>,
}

impl<'a> Installer<'a> {
    pub fn new(host: &'a dyn Host, fetcher: &'a dyn Fetch, source: ArtifactSource) -> Self {
        Self {
            host,
            fetcher,
            layout: InstallLayout::default(),
            artifacts: ArtifactSet::default(),
            source,
            scratch_parent: None,
        }
    }

    pub fn with_layout(mut self, layout: InstallLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Where remote staging directories are created (system temp by default).
    pub fn with_scratch_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.scratch_parent = Some(parent.into());
        self
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// Run every step in order, stopping at the first failure.
    pub fn run(&self) -> Result<InstallReport, InstallError> {
        let controller = ServiceController::new(self.host, &self.layout, &self.artifacts);
        let mut report = InstallReport::default();

        self.step(&mut report, Step::Identity, |report| {
            identity::ensure_permitted(self.host, &self.layout)?;
            report.initial_state = controller.probe()?;
            tracing::info!("current state: {}", report.initial_state.service_state());
            Ok(())
        })?;

        // Dropping `staged` at the end of `run` removes any remote scratch
        // directory.
        let staged = self.step(&mut report, Step::Stage, |_| {
            self.source
                .stage(&self.artifacts, self.fetcher, self.scratch_parent.as_deref())
        })?;

        // The resolver probes the dependency itself.
        self.step(&mut report, Step::Dependencies, |report| {
            let manifest = resolver::manifest_in(self.host, staged.dir());
            report.resolution = Some(resolver::ensure_dependencies(
                self.host,
                manifest.as_deref(),
            )?);
            Ok(())
        })?;

        self.step(&mut report, Step::Deploy, |report| {
            if self.reprobe(Step::Deploy)?.artifacts_deployed {
                tracing::info!("refreshing deployed files");
            }
            report.deployed =
                deploy::deploy(self.host, &self.layout, &self.artifacts, &staged)?;
            Ok(())
        })?;

        self.step(&mut report, Step::Register, |report| {
            if self.reprobe(Step::Register)?.unit_registered {
                tracing::info!("replacing registered unit definition");
            }
            controller.install(&staged)?;
            report.unit_path = Some(self.layout.unit_path());
            Ok(())
        })?;

        self.step(&mut report, Step::Enable, |_| {
            if self.reprobe(Step::Enable)?.unit_enabled {
                tracing::info!("{} already enabled for boot", self.layout.unit_name());
                return Ok(());
            }
            controller.enable()
        })?;

        self.step(&mut report, Step::Start, |report| {
            self.reprobe(Step::Start)?;
            report.start = Some(controller.start()?);
            Ok(())
        })?;

        report.final_state = probe::probe(self.host, &self.layout, &self.artifacts)?;
        Ok(report)
    }

    /// Run one step, recording it as completed or wrapping its failure.
    fn step<T>(
        &self,
        report: &mut InstallReport,
        step: Step,
        action: impl FnOnce(&mut InstallReport) -> Result<T, InstallError>,
    ) -> Result<T, InstallError> {
        tracing::info!("==> {step}");
        let value = action(report).map_err(|source| InstallError::StepFailed {
            step: step.name(),
            source: Box::new(source),
        })?;
        report.completed.push(step);
        Ok(value)
    }

    /// Fresh host state ahead of a mutating step.
    fn reprobe(&self, step: Step) -> Result<TargetState, InstallError> {
        let current = probe::probe(self.host, &self.layout, &self.artifacts)?;
        tracing::debug!("before {step}: {}", current.service_state());
        Ok(current)
    }
}
