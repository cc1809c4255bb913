use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::Mutex;

use kubestatus_k8s::{ClusterError, ClusterReader, Connect, Snapshot};
use kubestatus_types::{Attributes, Availability, HealthState, ResourceIdentity, StatusRecord};

use crate::DeriveStatus;

/// Client set held by a tracker between refreshes
enum Connection<T> {
    /// Nothing created yet
    Idle,
    Ready(T),
    /// The last call failed; the next refresh reconnects
    Discarded,
}

/// What the dashboard sees: last-known-good snapshot plus availability
struct View {
    snapshot: Arc<Snapshot>,
    availability: Availability,
    refreshed_at: Option<DateTime<Utc>>,
}

/// Result of one refresh attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The snapshot was replaced and the tracker is available
    Updated,
    /// The read failed; the previous snapshot is kept and the tracker is unavailable
    Unavailable,
    /// Another refresh of this tracker was still running
    Skipped,
}

/// Tracks one cluster object discovered at activation time.
///
/// Health state and attributes are always derived from the currently held
/// snapshot. Refreshes of the same tracker never overlap: a refresh requested
/// while one is in flight is skipped.
pub struct ResourceTracker<C: Connect> {
    identity: ResourceIdentity,
    connector: Arc<C>,
    view: RwLock<View>,
    connection: Mutex<Connection<C::Client>>,
}

impl<C: Connect> ResourceTracker<C> {
    /// Start tracking `snapshot`, as obtained from the discovery listing
    pub fn new(snapshot: Snapshot, connector: Arc<C>) -> Self {
        Self {
            identity: snapshot.identity(),
            connector,
            view: RwLock::new(View {
                snapshot: Arc::new(snapshot),
                availability: Availability::Available,
                refreshed_at: None,
            }),
            connection: Mutex::new(Connection::Idle),
        }
    }

    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    pub fn unique_id(&self) -> String {
        self.identity.unique_id()
    }

    pub fn display_name(&self) -> String {
        self.identity.display_name()
    }

    /// The currently held snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.view.read().snapshot)
    }

    pub fn availability(&self) -> Availability {
        self.view.read().availability
    }

    pub fn is_available(&self) -> bool {
        self.availability().is_available()
    }

    /// Time of the last successful refresh
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.view.read().refreshed_at
    }

    pub fn state(&self) -> HealthState {
        self.snapshot().health()
    }

    pub fn attributes(&self) -> Attributes {
        self.snapshot().attributes()
    }

    /// Build the dashboard record from one consistent view
    pub fn record(&self) -> StatusRecord {
        let (snapshot, availability, refreshed_at) = {
            let view = self.view.read();
            (Arc::clone(&view.snapshot), view.availability, view.refreshed_at)
        };
        StatusRecord::new(
            &self.identity,
            snapshot.health(),
            availability,
            snapshot.attributes(),
        )
        .refreshed_at(refreshed_at)
    }

    /// Whether the next refresh has to build a new client set
    pub async fn needs_connect(&self) -> bool {
        !matches!(*self.connection.lock().await, Connection::Ready(_))
    }

    /// Re-read this object from the cluster.
    ///
    /// Failures never escape: they mark the tracker unavailable, keep the
    /// previous snapshot and discard the client set.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Ok(mut connection) = self.connection.try_lock() else {
            tracing::debug!(resource = %self.identity, "refresh already in flight, skipping");
            return RefreshOutcome::Skipped;
        };

        match self.read(&mut connection).await {
            Ok(snapshot) => {
                let mut view = self.view.write();
                view.snapshot = Arc::new(snapshot);
                view.availability = Availability::Available;
                view.refreshed_at = Some(Utc::now());
                RefreshOutcome::Updated
            }
            Err(error) => {
                *connection = Connection::Discarded;
                self.view.write().availability = Availability::Unavailable;
                tracing::warn!(
                    resource = %self.identity,
                    error = %error,
                    cause = ?std::error::Error::source(&error).map(ToString::to_string),
                    not_found = error.is_not_found(),
                    "failed to refresh resource"
                );
                RefreshOutcome::Unavailable
            }
        }
    }

    async fn read(
        &self,
        connection: &mut Connection<C::Client>,
    ) -> Result<Snapshot, ClusterError> {
        if let Connection::Ready(client) = &*connection {
            return client.read(&self.identity).await;
        }

        if matches!(connection, Connection::Discarded) {
            tracing::debug!(resource = %self.identity, "recreating discarded cluster client");
        }
        let client = self.connector.connect().await?;
        let result = client.read(&self.identity).await;
        *connection = Connection::Ready(client);
        result
    }
}
