//! Ephemeral upstream checkouts for maintainer lookups.
//!
//! Maintainer metadata lives in the upstream repository's package files, and
//! the canonical way to read it is the repository's own `spack maintainers`
//! command. That command is only ever run against a fresh clone of the
//! *upstream* default branch, never the PR's code: the bot holds privileged
//! credentials and PR code is untrusted.
//!
//! A [`PackageWorkspace`] owns a temporary directory holding a shallow clone
//! and is dropped (deleting the clone) when the triage job finishes. Clones
//! are bounded by a timeout so a wedged network operation cannot pin a
//! worker.

use std::path::PathBuf;
use std::time::Duration;

use std::collections::BTreeSet;

use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::triage::maintainers::MaintainerLookup;

/// Errors from workspace checkout and maintainer lookup.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The shallow clone failed.
    #[error("checkout of {url} failed: {details}")]
    CheckoutFailed { url: String, details: String },

    /// The checkout did not finish within the configured deadline.
    #[error("checkout of {url} timed out after {timeout:?}")]
    CheckoutTimeout { url: String, timeout: Duration },

    /// `spack maintainers` failed for one package.
    #[error("maintainer lookup for {package} failed: {details}")]
    LookupFailed { package: String, details: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A shallow clone of the upstream repository in a temporary directory.
///
/// The directory and everything in it are removed on drop.
#[derive(Debug)]
pub struct PackageWorkspace {
    /// Owned for its Drop impl.
    _dir: TempDir,

    /// Path to the clone inside the temporary directory.
    clone_path: PathBuf,
}

/// Create a git Command with clean environment (no system/user config).
///
/// Ignoring system and user git configuration keeps clone behavior
/// consistent across machines, and disabling terminal prompts means a
/// missing credential fails instead of hanging the worker.
fn git_command() -> Command {
    let mut cmd = Command::new("git");
    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd.kill_on_drop(true);
    cmd
}

impl PackageWorkspace {
    /// Shallow-clones `url` into a fresh temporary directory.
    ///
    /// Only the default branch tip is fetched; maintainer lookups never need
    /// history.
    pub async fn checkout(url: &str, timeout: Duration) -> Result<Self, WorkspaceError> {
        let dir = TempDir::new()?;
        let clone_path = dir.path().join("upstream");

        info!(url = %url, path = %clone_path.display(), "checking out upstream");

        let clone = async {
            git_command()
                .args(["clone", "--depth", "1", url])
                .arg(&clone_path)
                .output()
                .await
        };

        let output = tokio::time::timeout(timeout, clone)
            .await
            .map_err(|_| WorkspaceError::CheckoutTimeout {
                url: url.to_string(),
                timeout,
            })??;

        if !output.status.success() {
            return Err(WorkspaceError::CheckoutFailed {
                url: url.to_string(),
                details: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(PackageWorkspace {
            _dir: dir,
            clone_path,
        })
    }

    /// Path to the `spack` entry point inside the clone.
    fn spack_bin(&self) -> PathBuf {
        self.clone_path.join("bin").join("spack")
    }
}

impl MaintainerLookup for PackageWorkspace {
    /// Runs `spack maintainers <package>` in the checkout.
    ///
    /// Exit code 0 means maintainers were printed; exit code 1 means the
    /// package exists but has none (or is unknown to this checkout, as a
    /// brand-new package in the PR would be). Both are answers. Anything
    /// else is a lookup failure.
    async fn resolve_maintainers(&self, package: &str) -> Result<BTreeSet<String>, WorkspaceError> {
        let output = Command::new(self.spack_bin())
            .arg("maintainers")
            .arg(package)
            .current_dir(&self.clone_path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| WorkspaceError::LookupFailed {
                package: package.to_string(),
                details: e.to_string(),
            })?;

        match output.status.code() {
            Some(0) | Some(1) => {
                let maintainers: BTreeSet<String> = String::from_utf8_lossy(&output.stdout)
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                debug!(package = %package, count = maintainers.len(), "resolved maintainers");
                Ok(maintainers)
            }
            code => Err(WorkspaceError::LookupFailed {
                package: package.to_string(),
                details: format!(
                    "exit status {:?}, stderr: {}",
                    code,
                    String::from_utf8_lossy(&output.stderr)
                ),
            }),
        }
    }
}
