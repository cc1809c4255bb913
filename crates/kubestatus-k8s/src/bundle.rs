use std::fs;
use std::path::{Path, PathBuf};

use kube::config::Kubeconfig;

use crate::ClusterError;

/// A kubeconfig file accepted for one cluster configuration.
///
/// The bundle is read once and shared read-only between every tracker of
/// that configuration.
#[derive(Clone, Debug)]
pub struct CredentialBundle {
    path: PathBuf,
    kubeconfig: Kubeconfig,
}

impl CredentialBundle {
    /// Load and validate the kubeconfig at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClusterError> {
        let path = path.into();
        let kubeconfig = Kubeconfig::read_from(&path).map_err(|source| ClusterError::Config {
            path: path.clone(),
            source,
        })?;

        validate(&path, &kubeconfig)?;
        warn_if_permissive(&path);

        Ok(Self { path, kubeconfig })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kubeconfig(&self) -> &Kubeconfig {
        &self.kubeconfig
    }

    /// Delete the bundle file. Called when its configuration is torn down.
    pub fn remove(&self) -> Result<(), ClusterError> {
        fs::remove_file(&self.path).map_err(|source| ClusterError::Remove {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), "removed credential bundle");
        Ok(())
    }
}

/// A usable kubeconfig names at least one cluster, context and user
fn validate(path: &Path, kubeconfig: &Kubeconfig) -> Result<(), ClusterError> {
    let missing = [
        ("clusters", kubeconfig.clusters.is_empty()),
        ("contexts", kubeconfig.contexts.is_empty()),
        ("users", kubeconfig.auth_infos.is_empty()),
    ]
    .into_iter()
    .find_map(|(field, empty)| empty.then_some(field));

    match missing {
        Some(field) => Err(ClusterError::InvalidBundle {
            path: path.to_path_buf(),
            reason: format!("missing required field '{}'", field),
        }),
        None => Ok(()),
    }
}

#[cfg(unix)]
fn warn_if_permissive(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            tracing::warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode),
                "credential bundle is readable by other users, expected 600"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_permissive(_path: &Path) {}
