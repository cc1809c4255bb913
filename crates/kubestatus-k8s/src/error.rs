use std::path::PathBuf;
use std::time::Duration;

use kubestatus_types::ResourceKind;

/// Failures talking to a cluster or loading its credentials
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// Credential bundle missing, unreadable or not a kubeconfig
    #[error("failed to load credential bundle {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: kube::config::KubeconfigError,
    },

    /// Credential bundle parsed but lacks what a kubeconfig needs
    #[error("invalid credential bundle {}: {reason}", path.display())]
    InvalidBundle { path: PathBuf, reason: String },

    #[error("failed to build cluster client")]
    Client(#[source] kube::Error),

    /// The connectivity probe was rejected or the cluster is unreachable
    #[error("cluster connectivity probe failed")]
    Connectivity(#[source] kube::Error),

    #[error("failed to list {kind} objects")]
    Fetch {
        kind: ResourceKind,
        #[source]
        source: kube::Error,
    },

    #[error("failed to read {identity}")]
    Read {
        identity: String,
        #[source]
        source: kube::Error,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("failed to remove credential bundle {}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClusterError {
    /// The credential bundle itself is at fault; retrying will not help
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::InvalidBundle { .. })
    }

    /// The targeted object no longer exists on the cluster
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Read {
                source: kube::Error::Api(response),
                ..
            } => response.code == 404,
            _ => false,
        }
    }
}
