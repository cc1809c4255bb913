//! In-memory cluster for exercising trackers and the registry

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentStatus};
use k8s_openapi::api::core::v1::{Node, NodeCondition, NodeStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use parking_lot::Mutex;

use kubestatus_k8s::{ClusterError, ClusterReader, Connect, Inventory, Snapshot};
use kubestatus_types::{ResourceIdentity, ResourceKind};

type Key = (ResourceKind, Option<String>, String);

fn key(identity: &ResourceIdentity) -> Key {
    (identity.kind, identity.namespace.clone(), identity.name.clone())
}

fn timeout(operation: &str) -> ClusterError {
    ClusterError::Timeout {
        operation: operation.to_string(),
        after: Duration::from_secs(10),
    }
}

#[derive(Default)]
pub(crate) struct FakeCluster {
    objects: Mutex<HashMap<Key, Snapshot>>,
    failing: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    unreachable: AtomicBool,
    listing_fails: AtomicBool,
    connects: AtomicUsize,
    reads: AtomicUsize,
}

impl FakeCluster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add or replace an object
    pub fn insert(&self, snapshot: Snapshot) {
        self.objects.lock().insert(key(&snapshot.identity()), snapshot);
    }

    pub fn remove(&self, identity: &ResourceIdentity) {
        self.objects.lock().remove(&key(identity));
    }

    /// Make reads of objects with this name time out
    pub fn fail(&self, name: &str) {
        self.failing.lock().insert(name.to_string());
    }

    pub fn heal(&self, name: &str) {
        self.failing.lock().remove(name);
    }

    /// Reject every connection attempt
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn set_listing_fails(&self, fails: bool) {
        self.listing_fails.store(fails, Ordering::SeqCst);
    }

    /// Slow down every read
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

pub(crate) struct FakeConnector(Arc<FakeCluster>);

impl FakeConnector {
    pub fn new(cluster: &Arc<FakeCluster>) -> Self {
        Self(Arc::clone(cluster))
    }
}

impl Connect for FakeConnector {
    type Client = FakeClient;

    async fn connect(&self) -> Result<FakeClient, ClusterError> {
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        if self.0.unreachable.load(Ordering::SeqCst) {
            return Err(timeout("connectivity probe"));
        }
        Ok(FakeClient(Arc::clone(&self.0)))
    }
}

pub(crate) struct FakeClient(Arc<FakeCluster>);

impl ClusterReader for FakeClient {
    async fn fetch_all(&self) -> Result<Inventory, ClusterError> {
        if self.0.listing_fails.load(Ordering::SeqCst) {
            return Err(timeout("listing CronJob objects"));
        }

        let mut inventory = Inventory::default();
        let mut objects: Vec<_> = self.0.objects.lock().values().cloned().collect();
        objects.sort_by_key(|s| key(&s.identity()));
        for snapshot in objects {
            match snapshot {
                Snapshot::Deployment(d) => inventory.deployments.push(d),
                Snapshot::StatefulSet(s) => inventory.stateful_sets.push(s),
                Snapshot::DaemonSet(d) => inventory.daemon_sets.push(d),
                Snapshot::Namespace(n) => inventory.namespaces.push(n),
                Snapshot::Node(n) => inventory.nodes.push(n),
                Snapshot::CronJob(c) => inventory.cron_jobs.push(c),
            }
        }
        Ok(inventory)
    }

    async fn read(&self, identity: &ResourceIdentity) -> Result<Snapshot, ClusterError> {
        self.0.reads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.0.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.0.failing.lock().contains(&identity.name) {
            return Err(timeout(&format!("reading {}", identity)));
        }

        let found = self.0.objects.lock().get(&key(identity)).cloned();
        found.ok_or_else(|| ClusterError::Read {
            identity: identity.display_name(),
            source: kube::Error::Api(kube::core::ErrorResponse {
                status: "Failure".to_string(),
                message: format!("{} not found", identity.name),
                reason: "NotFound".to_string(),
                code: 404,
            }),
        })
    }
}

fn meta(name: &str, namespace: Option<&str>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        uid: Some(format!("uid-{}", name)),
        ..Default::default()
    }
}

pub(crate) fn deployment(name: &str, namespace: &str, replicas: i32, available: i32) -> Snapshot {
    Deployment {
        metadata: meta(name, Some(namespace)),
        status: Some(DeploymentStatus {
            replicas: Some(replicas),
            available_replicas: Some(available),
            ..Default::default()
        }),
        ..Default::default()
    }
    .into()
}

pub(crate) fn node(name: &str, ready: bool) -> Snapshot {
    Node {
        metadata: meta(name, None),
        status: Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: if ready { "True" } else { "False" }.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
    .into()
}
