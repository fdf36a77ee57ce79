//! Artifact sources: where the files to deploy come from.
//!
//! Both variants produce a [`StagedArtifacts`], a directory holding the
//! artifact set with every required file present. The remote variant stages
//! into a [`TempDir`] owned by the returned value, so the scratch directory is
//! removed on every exit path: validation failure, fetch failure, or after a
//! successful deployment once the value is dropped.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use dcsbios_core::{identity, io_err, ArtifactSet, InstallError};

// ---------------------------------------------------------------------------
// Network seam
// ---------------------------------------------------------------------------

/// Download one URL into memory.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, InstallError>;
}

/// Blocking HTTPS fetcher; no checksum or signature verification.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, InstallError> {
        let response = self.agent.get(url).call().map_err(|e| InstallError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| InstallError::Http {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// Source selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// A checkout on this machine.
    Local(PathBuf),
    /// Files fetched from `<base_url>/<file name>`.
    Remote { base_url: String },
}

impl ArtifactSource {
    /// The directory holding the running installer binary.
    pub fn beside_executable() -> Result<Self, InstallError> {
        let exe = std::env::current_exe().map_err(|e| io_err("current executable", e))?;
        let dir = exe
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(ArtifactSource::Local(dir))
    }

    pub fn remote(base_url: Option<&str>) -> Self {
        ArtifactSource::Remote {
            base_url: base_url
                .unwrap_or(identity::DEFAULT_REMOTE_BASE)
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Produce a directory with the full artifact set.
    ///
    /// `scratch_parent` places the remote staging directory; `None` uses the
    /// system temp directory.
    pub fn stage(
        &self,
        artifacts: &ArtifactSet,
        fetcher: &dyn Fetch,
        scratch_parent: Option<&Path>,
    ) -> Result<StagedArtifacts, InstallError> {
        match self {
            ArtifactSource::Local(dir) => {
                verify_required(dir, artifacts)?;
                tracing::info!("using local artifacts in {}", dir.display());
                Ok(StagedArtifacts {
                    dir: dir.clone(),
                    scratch: None,
                })
            }
            ArtifactSource::Remote { base_url } => {
                stage_remote(base_url, artifacts, fetcher, scratch_parent)
            }
        }
    }
}

/// A directory holding a verified artifact set.
#[derive(Debug)]
pub struct StagedArtifacts {
    dir: PathBuf,
    scratch: Option<TempDir>,
}

impl StagedArtifacts {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn is_scratch(&self) -> bool {
        self.scratch.is_some()
    }
}

fn stage_remote(
    base_url: &str,
    artifacts: &ArtifactSet,
    fetcher: &dyn Fetch,
    scratch_parent: Option<&Path>,
) -> Result<StagedArtifacts, InstallError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("dcsbios-install.");
    let scratch = match scratch_parent {
        Some(parent) => builder.tempdir_in(parent),
        None => builder.tempdir(),
    }
    .map_err(|e| io_err("staging directory", e))?;

    tracing::info!("fetching artifacts from {base_url}");
    for artifact in artifacts.iter() {
        let url = format!("{base_url}/{}", artifact.file_name);
        match fetcher.fetch(&url) {
            Ok(body) => {
                let dest = scratch.path().join(artifact.file_name);
                fs::write(&dest, body).map_err(|e| io_err(&dest, e))?;
                tracing::debug!("fetched {url}");
            }
            Err(err) if artifact.kind.is_required() => {
                tracing::warn!("could not fetch {}: {err}", artifact.file_name);
            }
            Err(err) => {
                tracing::debug!("skipping optional {}: {err}", artifact.file_name);
            }
        }
    }

    // On error `scratch` drops here and the directory is removed.
    verify_required(scratch.path(), artifacts)?;

    Ok(StagedArtifacts {
        dir: scratch.path().to_path_buf(),
        scratch: Some(scratch),
    })
}

/// Every required artifact must exist in `dir`.
pub fn verify_required(dir: &Path, artifacts: &ArtifactSet) -> Result<(), InstallError> {
    let missing: Vec<String> = artifacts
        .required()
        .filter(|a| !dir.join(a.file_name).is_file())
        .map(|a| a.file_name.to_string())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(InstallError::MissingArtifacts {
        dir: dir.to_path_buf(),
        files: missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_base_url_is_normalised() {
        assert_eq!(
            ArtifactSource::remote(Some("https://example.test/raw/")),
            ArtifactSource::Remote {
                base_url: "https://example.test/raw".to_string()
            }
        );
        assert!(matches!(
            ArtifactSource::remote(None),
            ArtifactSource::Remote { base_url } if base_url == identity::DEFAULT_REMOTE_BASE
        ));
    }

    #[test]
    fn local_source_missing_required_file_is_named() {
        let dir = TempDir::new().expect("dir");
        for name in ["dcsbios_tui.py", "dcsbios_daemon.py", "dcsbios.service"] {
            fs::write(dir.path().join(name), "x").expect("write");
        }

        let err = verify_required(dir.path(), &ArtifactSet::default()).unwrap_err();
        match err {
            InstallError::MissingArtifacts { files, .. } => {
                assert_eq!(files, vec!["requirements.txt".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn optional_files_may_be_absent() {
        let dir = TempDir::new().expect("dir");
        for a in ArtifactSet::default().required() {
            fs::write(dir.path().join(a.file_name), "x").expect("write");
        }
        verify_required(dir.path(), &ArtifactSet::default()).expect("optional files are optional");
    }
}
