//! Operator-facing error messages.

use std::path::PathBuf;

use dcsbios_core::{io_err, AttemptFailure, InstallError};
use rstest::rstest;

#[rstest]
#[case::not_installed(
    InstallError::NotInstalled { unit: "dcsbios.service".into() },
    "service dcsbios.service is not installed"
)]
#[case::root(
    InstallError::RunningAsRoot { expected: "pi".into() },
    "refusing to run as root"
)]
#[case::identity(
    InstallError::IdentityRefused { user: "alice".into(), expected: "pi".into() },
    "user 'alice' is not 'pi'"
)]
fn precondition_errors_read_plainly(#[case] err: InstallError, #[case] expected: &str) {
    let msg = err.to_string();
    assert!(msg.contains(expected), "got: {msg}");
}

#[test]
fn missing_artifacts_lists_every_file() {
    let err = InstallError::MissingArtifacts {
        dir: PathBuf::from("/tmp/dcsbios-install.abc"),
        files: vec!["dcsbios_tui.py".into(), "requirements.txt".into()],
    };
    let msg = err.to_string();
    assert!(msg.contains("/tmp/dcsbios-install.abc"), "{msg}");
    assert!(msg.contains("dcsbios_tui.py, requirements.txt"), "{msg}");
}

#[test]
fn exhausted_strategies_show_each_attempt() {
    let err = InstallError::StrategiesExhausted {
        chain: "dependency resolution".into(),
        failures: vec![
            AttemptFailure {
                label: "apt python3-serial".into(),
                detail: "exit 100".into(),
            },
            AttemptFailure {
                label: "pip3".into(),
                detail: "exit 1".into(),
            },
        ],
    };
    assert_eq!(
        err.to_string(),
        "all strategies for dependency resolution failed: \
         apt python3-serial: exit 100; pip3: exit 1"
    );
}

#[test]
fn step_failure_wraps_its_cause() {
    let cause = io_err("/opt/dcsbios", std::io::Error::from(std::io::ErrorKind::PermissionDenied));
    let err = InstallError::StepFailed {
        step: "deploy",
        source: Box::new(cause),
    };
    let msg = err.to_string();
    assert!(msg.starts_with("step 'deploy' failed: I/O error at /opt/dcsbios"), "{msg}");
    assert!(std::error::Error::source(&err).is_some());
}
