use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;

use kubestatus_k8s::{ClusterError, ClusterReader, Connect};
use kubestatus_types::StatusRecord;

use crate::{RefreshOutcome, ResourceTracker};

/// Why a cluster configuration could not be activated
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error("cluster name must not be empty")]
    EmptyName,

    #[error("a cluster named '{0}' is already active")]
    DuplicateName(String),

    #[error("failed to connect to cluster '{name}'")]
    Connect {
        name: String,
        #[source]
        source: ClusterError,
    },

    #[error("failed to discover resources on cluster '{name}'")]
    Discover {
        name: String,
        #[source]
        source: ClusterError,
    },
}

/// Trackers belonging to one activated cluster configuration
pub struct ClusterEntry<C: Connect> {
    connector: Arc<C>,
    trackers: Vec<Arc<ResourceTracker<C>>>,
}

impl<C: Connect> ClusterEntry<C> {
    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn trackers(&self) -> &[Arc<ResourceTracker<C>>] {
        &self.trackers
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}

/// Outcome counts of one refresh pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub updated: usize,
    pub unavailable: usize,
    pub skipped: usize,
}

impl RefreshSummary {
    fn record(&mut self, outcome: RefreshOutcome) {
        match outcome {
            RefreshOutcome::Updated => self.updated += 1,
            RefreshOutcome::Unavailable => self.unavailable += 1,
            RefreshOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Activated cluster configurations, keyed by name.
///
/// Owned by whoever drives polling; entries are created on activation and
/// dropped on teardown.
pub struct ClusterRegistry<C: Connect> {
    clusters: BTreeMap<String, ClusterEntry<C>>,
}

impl<C: Connect> ClusterRegistry<C> {
    pub fn new() -> Self {
        Self {
            clusters: BTreeMap::new(),
        }
    }

    /// Connect, list every tracked object and create one tracker per object.
    ///
    /// Either every tracker is registered or none is. Returns the tracker count.
    pub async fn activate(&mut self, name: &str, connector: C) -> Result<usize, ActivationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ActivationError::EmptyName);
        }
        if self.clusters.contains_key(name) {
            return Err(ActivationError::DuplicateName(name.to_string()));
        }

        let connector = Arc::new(connector);
        let clients = connector
            .connect()
            .await
            .map_err(|source| ActivationError::Connect {
                name: name.to_string(),
                source,
            })?;
        let inventory = clients
            .fetch_all()
            .await
            .map_err(|source| ActivationError::Discover {
                name: name.to_string(),
                source,
            })?;

        let trackers: Vec<_> = inventory
            .into_snapshots()
            .into_iter()
            .map(|snapshot| Arc::new(ResourceTracker::new(snapshot, Arc::clone(&connector))))
            .collect();
        let count = trackers.len();

        tracing::info!(cluster = name, trackers = count, "activated cluster");
        self.clusters.insert(
            name.to_string(),
            ClusterEntry {
                connector,
                trackers,
            },
        );
        Ok(count)
    }

    /// Drop a configuration and its trackers
    pub fn deactivate(&mut self, name: &str) -> Option<ClusterEntry<C>> {
        let entry = self.clusters.remove(name)?;
        tracing::info!(cluster = name, trackers = entry.len(), "deactivated cluster");
        Some(entry)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clusters.keys().map(String::as_str)
    }

    /// Every tracker across all configurations
    pub fn trackers(&self) -> impl Iterator<Item = &Arc<ResourceTracker<C>>> {
        self.clusters.values().flat_map(|entry| entry.trackers())
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Refresh every tracker concurrently; one failing tracker never affects another
    pub async fn refresh_all(&self) -> RefreshSummary {
        let outcomes = join_all(self.trackers().map(|tracker| tracker.refresh())).await;

        let mut summary = RefreshSummary::default();
        for outcome in outcomes {
            summary.record(outcome);
        }
        tracing::debug!(
            updated = summary.updated,
            unavailable = summary.unavailable,
            skipped = summary.skipped,
            "refresh pass complete"
        );
        summary
    }

    /// Current status of every tracked resource
    pub fn records(&self) -> Vec<StatusRecord> {
        self.trackers().map(|tracker| tracker.record()).collect()
    }
}

impl<C: Connect> Default for ClusterRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
