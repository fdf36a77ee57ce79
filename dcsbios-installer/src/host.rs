//! Host seam: every process the engine runs goes through [`Host`].

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use dcsbios_core::InstallError;

/// One command line to run on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Run through `sudo`.
    pub privileged: bool,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            privileged: false,
        }
    }

    pub fn privileged<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            privileged: true,
            ..Self::new(program, args)
        }
    }

    pub fn path_arg(path: &Path) -> String {
        path.display().to_string()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.privileged {
            write!(f, "sudo ")?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Result of a command that was spawned and exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Outcome {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn status_label(&self) -> String {
        match self.code {
            Some(code) => format!("exit {code}"),
            None => "killed by signal".to_string(),
        }
    }

    /// Trimmed stderr, falling back to stdout when stderr is empty.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }

    /// Turn a non-zero exit into [`InstallError::CommandFailed`].
    pub fn require(self, invocation: &Invocation) -> Result<Outcome, InstallError> {
        if self.success() {
            return Ok(self);
        }
        Err(InstallError::CommandFailed {
            command: invocation.to_string(),
            status: self.status_label(),
            stderr: self.diagnostic(),
        })
    }
}

/// Everything the engine needs from the machine it reconciles.
///
/// A non-zero exit is an `Ok(Outcome)`; `Err` means the program could not be
/// spawned at all.
pub trait Host {
    fn run(&self, invocation: &Invocation) -> Result<Outcome, InstallError>;

    fn exists(&self, path: &Path) -> bool;

    /// Run and require a zero exit.
    fn run_checked(&self, invocation: &Invocation) -> Result<Outcome, InstallError> {
        self.run(invocation)?.require(invocation)
    }
}

impl<H: Host + ?Sized> Host for &H {
    fn run(&self, invocation: &Invocation) -> Result<Outcome, InstallError> {
        (**self).run(invocation)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}

// ---------------------------------------------------------------------------
// Real host
// ---------------------------------------------------------------------------

/// The machine this process runs on.
#[derive(Debug, Clone, Default)]
pub struct SystemHost;

impl Host for SystemHost {
    fn run(&self, invocation: &Invocation) -> Result<Outcome, InstallError> {
        let mut command = if invocation.privileged {
            let mut sudo = Command::new("sudo");
            sudo.arg(&invocation.program);
            sudo
        } else {
            Command::new(&invocation.program)
        };
        command.args(&invocation.args);

        tracing::debug!("run: {invocation}");
        let output = command.output().map_err(|source| InstallError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        Ok(Outcome {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

/// Wraps a host so privileged (mutating) commands are only logged.
///
/// Unprivileged commands are read-only probes and still execute. Files a
/// skipped `cp`/`install` would have created are reported as existing, so
/// later steps see the planned state.
#[derive(Debug)]
pub struct DryRunHost<H> {
    inner: H,
    planned: RefCell<Vec<PathBuf>>,
}

impl<H: Host> DryRunHost<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            planned: RefCell::new(Vec::new()),
        }
    }
}

impl<H: Host> Host for DryRunHost<H> {
    fn run(&self, invocation: &Invocation) -> Result<Outcome, InstallError> {
        if invocation.privileged {
            tracing::info!("[dry-run] would run: {invocation}");
            if matches!(invocation.program.as_str(), "cp" | "install") {
                if let Some(dest) = invocation.args.last() {
                    self.planned.borrow_mut().push(PathBuf::from(dest));
                }
            }
            return Ok(Outcome::ok(""));
        }
        self.inner.run(invocation)
    }

    fn exists(&self, path: &Path) -> bool {
        self.planned.borrow().iter().any(|p| p == path) || self.inner.exists(path)
    }
}
