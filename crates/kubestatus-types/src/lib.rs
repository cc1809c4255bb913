//! Shared types for kubestatus
//!
//! This crate contains the vocabulary used across the kubestatus crates:
//! resource kinds and identities, derived health states, and the status
//! records handed to the dashboard layer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Resource Types
// ============================================================================

/// The cluster object kinds that are tracked
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ResourceKind {
    Deployment,
    StatefulSet,
    DaemonSet,
    Namespace,
    Node,
    CronJob,
}

impl ResourceKind {
    /// Kind name as the API server spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "Deployment",
            Self::StatefulSet => "StatefulSet",
            Self::DaemonSet => "DaemonSet",
            Self::Namespace => "Namespace",
            Self::Node => "Node",
            Self::CronJob => "CronJob",
        }
    }

    /// Whether objects of this kind live inside a namespace
    pub fn is_namespaced(&self) -> bool {
        !matches!(self, Self::Namespace | Self::Node)
    }

    /// Dashboard icon for this kind
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Deployment | Self::StatefulSet | Self::DaemonSet => "mdi:application-brackets",
            Self::Namespace => "mdi:folder-outline",
            Self::Node => "mdi:server",
            Self::CronJob => "mdi:clock-outline",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one cluster object.
///
/// `uid` is what entity ids are built from; `(kind, namespace, name)` is what
/// targeted reads look the object up by.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceIdentity {
    pub kind: ResourceKind,
    pub namespace: Option<String>,
    pub name: String,
    pub uid: String,
}

impl ResourceIdentity {
    pub fn new(
        kind: ResourceKind,
        namespace: Option<String>,
        name: String,
        uid: String,
    ) -> Self {
        Self {
            kind,
            namespace,
            name,
            uid,
        }
    }

    /// Stable entity id, e.g. `k8s_deployment_<uid>`
    pub fn unique_id(&self) -> String {
        format!(
            "k8s_{}_{}",
            self.kind.as_str().to_lowercase(),
            self.uid
        )
    }

    /// Human readable name: `"<Kind> <namespace>/<name>"` or `"<Kind> <name>"`
    pub fn display_name(&self) -> String {
        match (&self.namespace, self.kind.is_namespaced()) {
            (Some(namespace), true) => format!("{} {}/{}", self.kind, namespace, self.name),
            _ => format!("{} {}", self.kind, self.name),
        }
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

// ============================================================================
// Status Types
// ============================================================================

/// Derived health of one object. Which variants are reachable depends on kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HealthState {
    // Workloads (Deployment, StatefulSet, DaemonSet)
    Running,
    Progressing,
    Stopped,
    Failed,

    // Node
    Ready,
    NotReady,

    /// Namespace phase as reported by the cluster (Active, Terminating, ...)
    Phase(String),

    /// CronJob last schedule time, rendered as text
    LastScheduled(String),
    /// CronJob that has never been scheduled
    Never,

    /// The cluster reported nothing to derive from
    Unknown,
}

impl HealthState {
    /// Display text for the dashboard
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "Running",
            Self::Progressing => "Progressing",
            Self::Stopped => "Stopped",
            Self::Failed => "Failed",
            Self::Ready => "Ready",
            Self::NotReady => "NotReady",
            Self::Phase(phase) => phase,
            Self::LastScheduled(at) => at,
            Self::Never => "Never",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HealthState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Whether the most recent refresh of a tracker succeeded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
pub enum Availability {
    #[default]
    Available,
    Unavailable,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Descriptive attributes attached to a status record.
///
/// Every mapping carries a `resource_type` entry; downstream consumers branch on it.
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Key of the attribute identifying the resource kind
pub const RESOURCE_TYPE_ATTRIBUTE: &str = "resource_type";

/// Everything the dashboard needs to render one tracked resource
#[derive(Clone, Debug, Serialize)]
pub struct StatusRecord {
    pub unique_id: String,
    pub name: String,
    pub kind: ResourceKind,
    pub state: HealthState,
    pub available: bool,
    pub icon: &'static str,
    pub attributes: Attributes,
    /// Time of the last successful refresh (None until the first one)
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl StatusRecord {
    pub fn new(
        identity: &ResourceIdentity,
        state: HealthState,
        availability: Availability,
        attributes: Attributes,
    ) -> Self {
        Self {
            unique_id: identity.unique_id(),
            name: identity.display_name(),
            kind: identity.kind,
            state,
            available: availability.is_available(),
            icon: identity.kind.icon(),
            attributes,
            refreshed_at: None,
        }
    }

    /// Attach the time of the last successful refresh
    pub fn refreshed_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.refreshed_at = at;
        self
    }
}
