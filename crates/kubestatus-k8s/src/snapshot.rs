use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{Namespace, Node};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use kubestatus_types::{ResourceIdentity, ResourceKind};

/// One cluster object as returned by a list or read call.
///
/// Snapshots are never mutated; a refresh replaces the whole value.
#[derive(Clone, Debug)]
pub enum Snapshot {
    Deployment(Deployment),
    StatefulSet(StatefulSet),
    DaemonSet(DaemonSet),
    Namespace(Namespace),
    Node(Node),
    CronJob(CronJob),
}

impl Snapshot {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Deployment(_) => ResourceKind::Deployment,
            Self::StatefulSet(_) => ResourceKind::StatefulSet,
            Self::DaemonSet(_) => ResourceKind::DaemonSet,
            Self::Namespace(_) => ResourceKind::Namespace,
            Self::Node(_) => ResourceKind::Node,
            Self::CronJob(_) => ResourceKind::CronJob,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Deployment(d) => &d.metadata,
            Self::StatefulSet(s) => &s.metadata,
            Self::DaemonSet(d) => &d.metadata,
            Self::Namespace(n) => &n.metadata,
            Self::Node(n) => &n.metadata,
            Self::CronJob(c) => &c.metadata,
        }
    }

    /// Identity of the object this snapshot describes
    pub fn identity(&self) -> ResourceIdentity {
        let kind = self.kind();
        let meta = self.metadata();
        ResourceIdentity::new(
            kind,
            if kind.is_namespaced() {
                meta.namespace.clone()
            } else {
                None
            },
            meta.name.clone().unwrap_or_default(),
            meta.uid.clone().unwrap_or_default(),
        )
    }
}

macro_rules! impl_from_object {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Snapshot {
                fn from(object: $variant) -> Self {
                    Self::$variant(object)
                }
            }
        )*
    };
}

impl_from_object!(Deployment, StatefulSet, DaemonSet, Namespace, Node, CronJob);
