//! Error types for dcsbios-core and the installer engine.

use std::path::PathBuf;

use thiserror::Error;

/// One failed attempt inside a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub label: String,
    pub detail: String,
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.detail)
    }
}

/// Every error the installation engine can surface.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Local filesystem failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A host program could not be spawned at all (missing binary, EACCES).
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A host program ran and exited unsuccessfully outside any fallback chain.
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("fetch of {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("refusing to run as root; run as '{expected}' or a user with passwordless sudo")]
    RunningAsRoot { expected: String },

    #[error("user '{user}' is not '{expected}' and cannot elevate without a password")]
    IdentityRefused { user: String, expected: String },

    /// Required artifacts absent from an artifact source.
    #[error("missing required artifact(s) in {dir}: {}", .files.join(", "))]
    MissingArtifacts { dir: PathBuf, files: Vec<String> },

    #[error("service {unit} is not installed (unit file not found)")]
    NotInstalled { unit: String },

    #[error("all strategies for {chain} failed: {}", render_failures(.failures))]
    StrategiesExhausted {
        chain: String,
        failures: Vec<AttemptFailure>,
    },

    /// A pipeline step failed; later steps were not attempted.
    #[error("step '{step}' failed: {source}")]
    StepFailed {
        step: &'static str,
        #[source]
        source: Box<InstallError>,
    },
}

fn render_failures(failures: &[AttemptFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience constructor for [`InstallError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> InstallError {
    InstallError::Io {
        path: path.into(),
        source,
    }
}
