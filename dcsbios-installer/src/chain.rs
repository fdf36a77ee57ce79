//! Ordered fallback chains.
//!
//! A chain is data: a list of [`Attempt`]s, each a sequence of invocations
//! that must all succeed. Two evaluation modes exist:
//!
//! - [`ChainMode::FirstSuccess`] stops at the first attempt that succeeds.
//!   If none does and the last evaluated attempt is `fatal_if_last`, the
//!   chain fails with [`InstallError::StrategiesExhausted`].
//! - [`ChainMode::BestEffort`] runs every attempt and reports failures as
//!   warnings.

use dcsbios_core::{AttemptFailure, InstallError};

use crate::host::{Host, Invocation};

/// When an attempt is eligible to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Always,
    /// Only if the immediately preceding attempt failed with output
    /// containing this text.
    PreviousFailedWith(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub label: String,
    pub invocations: Vec<Invocation>,
    pub guard: Guard,
    pub fatal_if_last: bool,
}

impl Attempt {
    pub fn new(label: impl Into<String>, invocations: Vec<Invocation>) -> Self {
        Self {
            label: label.into(),
            invocations,
            guard: Guard::Always,
            fatal_if_last: true,
        }
    }

    pub fn only_if_previous_failed_with(mut self, needle: &'static str) -> Self {
        self.guard = Guard::PreviousFailedWith(needle);
        self
    }

    pub fn non_fatal(mut self) -> Self {
        self.fatal_if_last = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainMode {
    FirstSuccess,
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub name: String,
    pub mode: ChainMode,
    pub attempts: Vec<Attempt>,
}

/// What happened when a chain ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainReport {
    /// Label of the winning attempt (`FirstSuccess` only).
    pub succeeded: Option<String>,
    /// Labels of every attempt that ran to completion successfully.
    pub completed: Vec<String>,
    pub failures: Vec<AttemptFailure>,
    /// Attempts whose guard did not match.
    pub skipped: Vec<String>,
}

impl Chain {
    pub fn new(name: impl Into<String>, mode: ChainMode) -> Self {
        Self {
            name: name.into(),
            mode,
            attempts: Vec::new(),
        }
    }

    pub fn then(mut self, attempt: Attempt) -> Self {
        self.attempts.push(attempt);
        self
    }

    pub fn run(&self, host: &dyn Host) -> Result<ChainReport, InstallError> {
        let mut report = ChainReport::default();
        let mut last_failure: Option<String> = None;
        let mut last_evaluated_fatal = false;

        for attempt in &self.attempts {
            if let Guard::PreviousFailedWith(needle) = &attempt.guard {
                let matched = last_failure
                    .as_deref()
                    .is_some_and(|output| output.contains(needle));
                if !matched {
                    tracing::debug!("{}: skipping '{}'", self.name, attempt.label);
                    report.skipped.push(attempt.label.clone());
                    continue;
                }
            }

            last_evaluated_fatal = attempt.fatal_if_last;
            match run_attempt(host, attempt) {
                Ok(()) => {
                    tracing::info!("{}: {} succeeded", self.name, attempt.label);
                    report.completed.push(attempt.label.clone());
                    last_failure = None;
                    if self.mode == ChainMode::FirstSuccess {
                        report.succeeded = Some(attempt.label.clone());
                        return Ok(report);
                    }
                }
                Err(detail) => {
                    tracing::warn!("{}: {} failed: {detail}", self.name, attempt.label);
                    report.failures.push(AttemptFailure {
                        label: attempt.label.clone(),
                        detail: detail.clone(),
                    });
                    last_failure = Some(detail);
                }
            }
        }

        if self.mode == ChainMode::FirstSuccess && last_evaluated_fatal {
            return Err(InstallError::StrategiesExhausted {
                chain: self.name.clone(),
                failures: report.failures,
            });
        }
        Ok(report)
    }
}

/// Run every invocation of an attempt; the first failure ends it.
fn run_attempt(host: &dyn Host, attempt: &Attempt) -> Result<(), String> {
    for invocation in &attempt.invocations {
        match host.run(invocation) {
            Ok(outcome) if outcome.success() => {}
            Ok(outcome) => {
                return Err(format!(
                    "`{invocation}` {}: {}",
                    outcome.status_label(),
                    outcome.diagnostic()
                ))
            }
            Err(err) => return Err(err.to_string()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::Path;

    use super::*;
    use crate::host::Outcome;

    /// Replies by program name; anything unknown succeeds.
    #[derive(Default)]
    struct Scripted {
        replies: HashMap<&'static str, Outcome>,
        ran: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn reply(mut self, program: &'static str, outcome: Outcome) -> Self {
            self.replies.insert(program, outcome);
            self
        }
    }

    impl Host for Scripted {
        fn run(&self, invocation: &Invocation) -> Result<Outcome, InstallError> {
            self.ran.borrow_mut().push(invocation.program.clone());
            Ok(self
                .replies
                .get(invocation.program.as_str())
                .cloned()
                .unwrap_or_else(|| Outcome::ok("")))
        }

        fn exists(&self, _path: &Path) -> bool {
            false
        }
    }

    fn attempt(label: &str, program: &str) -> Attempt {
        Attempt::new(label, vec![Invocation::new(program, Vec::<String>::new())])
    }

    #[test]
    fn first_success_stops_early() {
        let host = Scripted::default().reply("a", Outcome::failed(1, "nope"));
        let chain = Chain::new("deps", ChainMode::FirstSuccess)
            .then(attempt("A", "a"))
            .then(attempt("B", "b"))
            .then(attempt("C", "c"));

        let report = chain.run(&host).expect("chain");
        assert_eq!(report.succeeded.as_deref(), Some("B"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(host.ran.borrow().as_slice(), ["a", "b"]);
    }

    #[test]
    fn exhausted_chain_lists_every_failure() {
        let host = Scripted::default()
            .reply("a", Outcome::failed(1, "first"))
            .reply("b", Outcome::failed(2, "second"));
        let chain = Chain::new("deps", ChainMode::FirstSuccess)
            .then(attempt("A", "a"))
            .then(attempt("B", "b"));

        let err = chain.run(&host).unwrap_err();
        assert!(matches!(err, InstallError::StrategiesExhausted { .. }), "{err}");
        let msg = err.to_string();
        assert!(msg.contains("first") && msg.contains("second"), "{msg}");
    }

    #[test]
    fn guarded_attempt_runs_only_on_matching_failure() {
        let rejected = Scripted::default().reply("a", Outcome::failed(2, "no such option: --x"));
        let other = Scripted::default().reply("a", Outcome::failed(1, "network down"));
        let chain = Chain::new("deps", ChainMode::FirstSuccess)
            .then(attempt("A", "a"))
            .then(attempt("B", "b").only_if_previous_failed_with("no such option"));

        let report = chain.run(&rejected).expect("retry succeeds");
        assert_eq!(report.succeeded.as_deref(), Some("B"));

        let err = chain.run(&other).unwrap_err();
        assert!(matches!(err, InstallError::StrategiesExhausted { .. }));
        assert_eq!(other.ran.borrow().as_slice(), ["a"]);
    }

    #[test]
    fn best_effort_runs_everything_and_never_fails() {
        let host = Scripted::default()
            .reply("stop", Outcome::failed(5, "not loaded"))
            .reply("disable", Outcome::failed(1, "not enabled"));
        let chain = Chain::new("uninstall", ChainMode::BestEffort)
            .then(attempt("stop", "stop").non_fatal())
            .then(attempt("disable", "disable").non_fatal())
            .then(attempt("remove", "rm").non_fatal());

        let report = chain.run(&host).expect("best effort");
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.completed, vec!["remove".to_string()]);
        assert!(report.succeeded.is_none());
        assert_eq!(host.ran.borrow().as_slice(), ["stop", "disable", "rm"]);
    }

    #[test]
    fn spawn_error_counts_as_attempt_failure() {
        struct Missing;
        impl Host for Missing {
            fn run(&self, invocation: &Invocation) -> Result<Outcome, InstallError> {
                Err(InstallError::Spawn {
                    program: invocation.program.clone(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            }
            fn exists(&self, _path: &Path) -> bool {
                false
            }
        }

        let chain = Chain::new("deps", ChainMode::FirstSuccess).then(attempt("A", "pip3"));
        let err = chain.run(&Missing).unwrap_err();
        assert!(err.to_string().contains("pip3"), "{err}");
    }
}
