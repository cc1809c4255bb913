use std::fmt::Debug;

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{Namespace, Node};
use kube::Api;
use kube::api::ListParams;
use serde::de::DeserializeOwned;

use kubestatus_types::ResourceKind;

use crate::client::bounded;
use crate::{ClientSet, ClusterError, Snapshot};

/// Every tracked object in the cluster at discovery time
#[derive(Clone, Debug, Default)]
pub struct Inventory {
    pub deployments: Vec<Deployment>,
    pub stateful_sets: Vec<StatefulSet>,
    pub daemon_sets: Vec<DaemonSet>,
    pub namespaces: Vec<Namespace>,
    pub nodes: Vec<Node>,
    pub cron_jobs: Vec<CronJob>,
}

impl Inventory {
    /// Total number of objects across all kinds
    pub fn len(&self) -> usize {
        self.deployments.len()
            + self.stateful_sets.len()
            + self.daemon_sets.len()
            + self.namespaces.len()
            + self.nodes.len()
            + self.cron_jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into snapshots, grouped by kind in discovery order
    pub fn into_snapshots(self) -> Vec<Snapshot> {
        let mut snapshots = Vec::with_capacity(self.len());
        snapshots.extend(self.deployments.into_iter().map(Snapshot::from));
        snapshots.extend(self.stateful_sets.into_iter().map(Snapshot::from));
        snapshots.extend(self.daemon_sets.into_iter().map(Snapshot::from));
        snapshots.extend(self.namespaces.into_iter().map(Snapshot::from));
        snapshots.extend(self.nodes.into_iter().map(Snapshot::from));
        snapshots.extend(self.cron_jobs.into_iter().map(Snapshot::from));
        snapshots
    }
}

impl ClientSet {
    /// List all six tracked kinds cluster-wide.
    ///
    /// The listings run concurrently; the first failure aborts the pass and no
    /// partial inventory is returned.
    pub async fn list_all(&self) -> Result<Inventory, ClusterError> {
        let (deployments, stateful_sets, daemon_sets, namespaces, nodes, cron_jobs) = futures::try_join!(
            self.list(self.apps().deployments(None), ResourceKind::Deployment),
            self.list(self.apps().stateful_sets(None), ResourceKind::StatefulSet),
            self.list(self.apps().daemon_sets(None), ResourceKind::DaemonSet),
            self.list(self.core().namespaces(), ResourceKind::Namespace),
            self.list(self.core().nodes(), ResourceKind::Node),
            self.list(self.batch().cron_jobs(None), ResourceKind::CronJob),
        )?;

        let inventory = Inventory {
            deployments,
            stateful_sets,
            daemon_sets,
            namespaces,
            nodes,
            cron_jobs,
        };
        tracing::debug!(objects = inventory.len(), "fetched cluster inventory");
        Ok(inventory)
    }

    async fn list<K>(&self, api: Api<K>, kind: ResourceKind) -> Result<Vec<K>, ClusterError>
    where
        K: Clone + DeserializeOwned + Debug,
    {
        bounded(self.timeout(), format!("listing {} objects", kind), async {
            api.list(&ListParams::default())
                .await
                .map(|list| list.items)
                .map_err(|source| ClusterError::Fetch { kind, source })
        })
        .await
    }
}
