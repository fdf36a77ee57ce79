//! Install layout: where the deployment lands on the host.
//!
//! `InstallLayout::default()` is the real layout. `rooted_at` re-bases the
//! filesystem paths under another directory so tests never touch `/opt` or
//! `/etc`.

use std::path::{Path, PathBuf};

use crate::types::identity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub install_dir: PathBuf,
    pub unit_dir: PathBuf,
    pub service_name: String,
    pub user: String,
    pub group: String,
    pub serial_group: String,
}

impl Default for InstallLayout {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from(identity::INSTALL_DIR),
            unit_dir: PathBuf::from(identity::UNIT_DIR),
            service_name: identity::SERVICE_NAME.to_string(),
            user: identity::RUN_AS_USER.to_string(),
            group: identity::RUN_AS_GROUP.to_string(),
            serial_group: identity::SERIAL_GROUP.to_string(),
        }
    }
}

impl InstallLayout {
    /// Same identity, filesystem paths re-based under `root`.
    pub fn rooted_at(root: &Path) -> Self {
        let base = Self::default();
        Self {
            install_dir: rebase(root, &base.install_dir),
            unit_dir: rebase(root, &base.unit_dir),
            ..base
        }
    }

    /// `dcsbios.service`
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.service_name)
    }

    /// `<unit_dir>/dcsbios.service`. Pure, no I/O.
    pub fn unit_path(&self) -> PathBuf {
        self.unit_dir.join(self.unit_name())
    }

    pub fn installed(&self, file_name: &str) -> PathBuf {
        self.install_dir.join(file_name)
    }

    /// `user:group` as accepted by `chown`.
    pub fn owner(&self) -> String {
        format!("{}:{}", self.user, self.group)
    }
}

fn rebase(root: &Path, absolute: &Path) -> PathBuf {
    root.join(absolute.strip_prefix("/").unwrap_or(absolute))
}
