//! Shared fixtures: a simulated host and an in-memory fetcher.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use dcsbios_core::{ArtifactSet, InstallError, InstallLayout};
use dcsbios_installer::{Fetch, Host, Invocation, Outcome};
use tempfile::TempDir;

/// How `pip3 install --break-system-packages …` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagBehavior {
    Accepted,
    Rejected,
    Fails,
}

/// A host whose package database, filesystem and systemd are simulated.
///
/// Paths that were never written through the simulation fall back to the real
/// filesystem, so artifact sources in a `TempDir` are visible.
pub struct FakeHost {
    pub uid: u32,
    pub user: String,
    pub sudo_ok: bool,
    pub dependency_installed: Cell<bool>,
    pub pip_present: Cell<bool>,
    pub apt_serial_ok: bool,
    pub pip_flag: FlagBehavior,
    pub pip_plain_ok: bool,
    pub start_leaves_inactive: bool,
    /// Any invocation whose program matches fails with exit 1.
    pub failing_program: Option<&'static str>,
    /// Any invocation whose program matches cannot be spawned.
    pub missing_program: Option<&'static str>,
    pub files: RefCell<BTreeSet<PathBuf>>,
    pub enabled: Cell<bool>,
    pub active: Cell<bool>,
    pub log: RefCell<Vec<Invocation>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            uid: 1000,
            user: "pi".to_string(),
            sudo_ok: true,
            dependency_installed: Cell::new(false),
            pip_present: Cell::new(true),
            apt_serial_ok: true,
            pip_flag: FlagBehavior::Accepted,
            pip_plain_ok: true,
            start_leaves_inactive: false,
            failing_program: None,
            missing_program: None,
            files: RefCell::new(BTreeSet::new()),
            enabled: Cell::new(false),
            active: Cell::new(false),
            log: RefCell::new(Vec::new()),
        }
    }
}

impl FakeHost {
    pub fn rendered(&self) -> Vec<String> {
        self.log.borrow().iter().map(ToString::to_string).collect()
    }

    pub fn privileged(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter(|i| i.privileged)
            .map(ToString::to_string)
            .collect()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.rendered().iter().any(|line| line.contains(needle))
    }

    pub fn count(&self, needle: &str) -> usize {
        self.rendered().iter().filter(|line| line.contains(needle)).count()
    }

    pub fn has_file(&self, path: &Path) -> bool {
        self.files.borrow().contains(path)
    }

    /// Mark the unit as already registered.
    pub fn with_unit(self, layout: &InstallLayout) -> Self {
        self.files.borrow_mut().insert(layout.unit_path());
        self
    }

    fn handle(&self, inv: &Invocation) -> Outcome {
        let args: Vec<&str> = inv.args.iter().map(String::as_str).collect();
        match (inv.program.as_str(), args.as_slice()) {
            ("id", ["-u"]) => Outcome::ok(format!("{}\n", self.uid)),
            ("id", ["-un"]) => Outcome::ok(format!("{}\n", self.user)),
            ("sudo", ["-n", "true"]) => bool_outcome(self.sudo_ok, "a password is required"),
            ("python3", _) => bool_outcome(
                self.dependency_installed.get(),
                "ModuleNotFoundError: No module named 'serial'",
            ),
            ("pip3", ["--version"]) => bool_outcome(self.pip_present.get(), "pip3: not found"),
            ("pip3", ["install", rest @ ..]) => self.pip_install(rest),
            ("apt-get", ["update"]) => Outcome::ok(""),
            ("apt-get", ["install", "-y", "python3-pip"]) => {
                self.pip_present.set(true);
                Outcome::ok("")
            }
            ("apt-get", ["install", "-y", "python3-serial"]) => {
                if self.apt_serial_ok {
                    self.dependency_installed.set(true);
                }
                bool_outcome(self.apt_serial_ok, "E: Unable to locate package")
            }
            ("cp", ["-f", _src, dest]) | ("install", ["-m", _, _src, dest]) => {
                self.files.borrow_mut().insert(PathBuf::from(dest));
                Outcome::ok("")
            }
            ("rm", ["-f", path]) => {
                self.files.borrow_mut().remove(Path::new(path));
                Outcome::ok("")
            }
            ("rm", ["-rf", dir]) => {
                self.files
                    .borrow_mut()
                    .retain(|p| !p.starts_with(Path::new(dir)));
                Outcome::ok("")
            }
            ("mkdir" | "chmod" | "usermod" | "chown", _) => Outcome::ok(""),
            ("systemctl", [verb, ..]) => self.systemctl(verb),
            ("journalctl", _) => Outcome::ok("-- Logs begin --\nstarted\n"),
            (other, _) => Outcome::failed(127, format!("{other}: command not found")),
        }
    }

    fn pip_install(&self, rest: &[&str]) -> Outcome {
        let flagged = rest.first() == Some(&"--break-system-packages");
        let ok = if flagged {
            match self.pip_flag {
                FlagBehavior::Accepted => true,
                FlagBehavior::Rejected => {
                    return Outcome::failed(2, "no such option: --break-system-packages")
                }
                FlagBehavior::Fails => false,
            }
        } else {
            self.pip_plain_ok
        };
        if ok {
            self.dependency_installed.set(true);
        }
        bool_outcome(ok, "ERROR: Could not install packages")
    }

    fn systemctl(&self, verb: &str) -> Outcome {
        match verb {
            "daemon-reload" | "reset-failed" => Outcome::ok(""),
            "enable" => {
                self.enabled.set(true);
                Outcome::ok("")
            }
            "disable" => {
                let was = self.enabled.replace(false);
                bool_outcome(was, "unit not enabled")
            }
            "start" | "restart" => {
                self.active.set(!self.start_leaves_inactive);
                Outcome::ok("")
            }
            "stop" => {
                let was = self.active.replace(false);
                bool_outcome(was, "unit not loaded")
            }
            "is-enabled" => bool_outcome(self.enabled.get(), "disabled"),
            "is-active" => {
                if self.active.get() {
                    Outcome::ok("active\n")
                } else {
                    Outcome {
                        code: Some(3),
                        stdout: "inactive\n".to_string(),
                        stderr: String::new(),
                    }
                }
            }
            "status" => Outcome {
                code: Some(if self.active.get() { 0 } else { 3 }),
                stdout: "● dcsbios.service - DCS-BIOS Controller Manager\n".to_string(),
                stderr: String::new(),
            },
            _ => Outcome::failed(1, "unknown verb"),
        }
    }
}

impl Host for FakeHost {
    fn run(&self, invocation: &Invocation) -> Result<Outcome, InstallError> {
        self.log.borrow_mut().push(invocation.clone());
        if self.missing_program == Some(invocation.program.as_str()) {
            return Err(InstallError::Spawn {
                program: invocation.program.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        if self.failing_program == Some(invocation.program.as_str()) {
            return Ok(Outcome::failed(1, "simulated failure"));
        }
        Ok(self.handle(invocation))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains(path) || path.exists()
    }
}

fn bool_outcome(ok: bool, err: &str) -> Outcome {
    if ok {
        Outcome::ok("")
    } else {
        Outcome::failed(1, err)
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Serves artifacts by file name from memory.
#[derive(Default)]
pub struct FakeFetcher {
    pub files: HashMap<String, Vec<u8>>,
    pub requested: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn serving_all() -> Self {
        let mut fetcher = Self::default();
        for artifact in ArtifactSet::default().iter() {
            fetcher
                .files
                .insert(artifact.file_name.to_string(), b"content".to_vec());
        }
        fetcher
    }

    pub fn without(mut self, file_name: &str) -> Self {
        self.files.remove(file_name);
        self
    }
}

impl Fetch for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, InstallError> {
        self.requested.borrow_mut().push(url.to_string());
        let name = url.rsplit('/').next().unwrap_or_default();
        self.files.get(name).cloned().ok_or_else(|| InstallError::Http {
            url: url.to_string(),
            message: "status code 404".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Artifact fixtures
// ---------------------------------------------------------------------------

/// A local checkout containing the artifact set; `skip` names files to leave
/// out.
pub fn local_checkout(skip: &[&str]) -> TempDir {
    let dir = TempDir::new().expect("checkout");
    for artifact in ArtifactSet::default().iter() {
        if skip.contains(&artifact.file_name) {
            continue;
        }
        fs::write(dir.path().join(artifact.file_name), "# artifact\n").expect("write artifact");
    }
    dir
}

/// Rooted layout inside a fresh temp directory.
pub fn rooted_layout() -> (TempDir, InstallLayout) {
    let root = TempDir::new().expect("root");
    let layout = InstallLayout::rooted_at(root.path());
    (root, layout)
}

pub fn entries(dir: &Path) -> usize {
    fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
}
