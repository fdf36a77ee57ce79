//! Installation and reconciliation engine for the DCS-BIOS service.
//!
//! Brings a host from an unknown state to "installed, enabled, running" and
//! offers reversible control afterwards. All host access goes through
//! [`host::Host`]; all downloads through [`source::Fetch`].

pub mod chain;
pub mod deploy;
pub mod host;
pub mod identity;
pub mod lifecycle;
pub mod pipeline;
pub mod probe;
pub mod registrar;
pub mod resolver;
pub mod source;

pub use chain::{Attempt, Chain, ChainMode, ChainReport, Guard};
pub use host::{DryRunHost, Host, Invocation, Outcome, SystemHost};
pub use lifecycle::{ServiceController, StartReport, StatusReport};
pub use pipeline::{InstallReport, Installer, Step, INSTALL_STEPS};
pub use probe::probe;
pub use resolver::Resolution;
pub use source::{ArtifactSource, Fetch, HttpFetcher, StagedArtifacts};
