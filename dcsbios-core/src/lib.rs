//! DCS-BIOS core library: domain types, install layout, errors.
//!
//! - [`types`]: artifact set, installation identity, probed state
//! - [`layout`]: [`InstallLayout`]
//! - [`error`]: [`InstallError`]

pub mod error;
pub mod layout;
pub mod types;

pub use error::{io_err, AttemptFailure, InstallError};
pub use layout::InstallLayout;
pub use types::{
    identity, Artifact, ArtifactKind, ArtifactSet, BootState, Destination, ExecutionContext,
    ServiceState, TargetState,
};
