use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{Namespace, Node};
use kube::api::ListParams;
use kube::config::KubeConfigOptions;
use kube::{Api, Client, Config};
use serde::de::DeserializeOwned;

use kubestatus_types::{ResourceIdentity, ResourceKind};

use crate::{ClusterError, CredentialBundle, Inventory, Snapshot};

/// Produces connected client sets for one cluster configuration
pub trait Connect: Send + Sync {
    type Client: ClusterReader;

    /// Build a client set and verify the cluster answers
    fn connect(&self) -> impl Future<Output = Result<Self::Client, ClusterError>> + Send;
}

/// The read-only calls the refresh engine makes against a cluster
pub trait ClusterReader: Send + Sync {
    /// List every tracked kind across all namespaces, all or nothing
    fn fetch_all(&self) -> impl Future<Output = Result<Inventory, ClusterError>> + Send;

    /// Read one object by kind, namespace and name
    fn read(
        &self,
        identity: &ResourceIdentity,
    ) -> impl Future<Output = Result<Snapshot, ClusterError>> + Send;
}

/// Client factory backed by a kubeconfig credential bundle
#[derive(Clone, Debug)]
pub struct KubeconfigConnector {
    bundle: Arc<CredentialBundle>,
    timeout: Duration,
}

impl KubeconfigConnector {
    /// `timeout` bounds every call made through the produced client sets
    pub fn new(bundle: Arc<CredentialBundle>, timeout: Duration) -> Self {
        Self { bundle, timeout }
    }

    pub fn bundle(&self) -> &CredentialBundle {
        &self.bundle
    }
}

impl Connect for KubeconfigConnector {
    type Client = ClientSet;

    async fn connect(&self) -> Result<ClientSet, ClusterError> {
        let mut config = Config::from_custom_kubeconfig(
            self.bundle.kubeconfig().clone(),
            &KubeConfigOptions::default(),
        )
        .await
        .map_err(|source| ClusterError::Config {
            path: self.bundle.path().to_path_buf(),
            source,
        })?;
        config.connect_timeout = Some(self.timeout);
        config.read_timeout = Some(self.timeout);

        let client = Client::try_from(config).map_err(ClusterError::Client)?;
        let clients = ClientSet::new(client, self.timeout);
        clients.probe().await?;

        tracing::debug!(path = %self.bundle.path().display(), "connected to cluster");
        Ok(clients)
    }
}

// ============================================================================
// Client Set
// ============================================================================

/// Core API group handle (namespaces, nodes)
#[derive(Clone)]
pub struct CoreApi(Client);

impl CoreApi {
    pub fn namespaces(&self) -> Api<Namespace> {
        Api::all(self.0.clone())
    }

    pub fn nodes(&self) -> Api<Node> {
        Api::all(self.0.clone())
    }
}

/// Apps API group handle (deployments, statefulsets, daemonsets)
#[derive(Clone)]
pub struct AppsApi(Client);

impl AppsApi {
    pub fn deployments(&self, namespace: Option<&str>) -> Api<Deployment> {
        scoped(&self.0, namespace)
    }

    pub fn stateful_sets(&self, namespace: Option<&str>) -> Api<StatefulSet> {
        scoped(&self.0, namespace)
    }

    pub fn daemon_sets(&self, namespace: Option<&str>) -> Api<DaemonSet> {
        scoped(&self.0, namespace)
    }
}

/// Batch API group handle (cronjobs)
#[derive(Clone)]
pub struct BatchApi(Client);

impl BatchApi {
    pub fn cron_jobs(&self, namespace: Option<&str>) -> Api<CronJob> {
        scoped(&self.0, namespace)
    }
}

/// Networking API group handle
#[derive(Clone)]
pub struct NetworkingApi(#[allow(dead_code)] Client);

/// `None` addresses every namespace
fn scoped<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    <K as kube::Resource>::DynamicType: Default,
{
    match namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    }
}

/// Typed API handles bound to one credential bundle
#[derive(Clone)]
pub struct ClientSet {
    core: CoreApi,
    apps: AppsApi,
    batch: BatchApi,
    // No tracked kind lives in the networking group yet
    #[allow(dead_code)]
    networking: NetworkingApi,
    timeout: Duration,
}

impl ClientSet {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            core: CoreApi(client.clone()),
            apps: AppsApi(client.clone()),
            batch: BatchApi(client.clone()),
            networking: NetworkingApi(client),
            timeout,
        }
    }

    pub fn core(&self) -> &CoreApi {
        &self.core
    }

    pub fn apps(&self) -> &AppsApi {
        &self.apps
    }

    pub fn batch(&self) -> &BatchApi {
        &self.batch
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cheap call that fails fast on unreachable or unauthorized clusters
    pub async fn probe(&self) -> Result<(), ClusterError> {
        let namespaces = self.core.namespaces();
        bounded(self.timeout, "connectivity probe", async {
            namespaces
                .list(&ListParams::default().limit(1))
                .await
                .map_err(ClusterError::Connectivity)
        })
        .await?;
        Ok(())
    }

    async fn get<K>(&self, api: Api<K>, identity: &ResourceIdentity) -> Result<K, ClusterError>
    where
        K: Clone + DeserializeOwned + Debug,
    {
        bounded(self.timeout, format!("reading {}", identity), async {
            api.get(&identity.name)
                .await
                .map_err(|source| ClusterError::Read {
                    identity: identity.display_name(),
                    source,
                })
        })
        .await
    }
}

impl ClusterReader for ClientSet {
    async fn fetch_all(&self) -> Result<Inventory, ClusterError> {
        self.list_all().await
    }

    async fn read(&self, identity: &ResourceIdentity) -> Result<Snapshot, ClusterError> {
        let namespace = identity.namespace.as_deref();
        let snapshot: Snapshot = match identity.kind {
            ResourceKind::Deployment => self
                .get(self.apps.deployments(namespace), identity)
                .await?
                .into(),
            ResourceKind::StatefulSet => self
                .get(self.apps.stateful_sets(namespace), identity)
                .await?
                .into(),
            ResourceKind::DaemonSet => self
                .get(self.apps.daemon_sets(namespace), identity)
                .await?
                .into(),
            ResourceKind::Namespace => self.get(self.core.namespaces(), identity).await?.into(),
            ResourceKind::Node => self.get(self.core.nodes(), identity).await?.into(),
            ResourceKind::CronJob => self
                .get(self.batch.cron_jobs(namespace), identity)
                .await?
                .into(),
        };
        Ok(snapshot)
    }
}

/// Run a cluster call under `timeout`; elapsing counts as a failure
pub(crate) async fn bounded<T>(
    timeout: Duration,
    operation: impl Into<String>,
    call: impl Future<Output = Result<T, ClusterError>>,
) -> Result<T, ClusterError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ClusterError::Timeout {
            operation: operation.into(),
            after: timeout,
        }),
    }
}
