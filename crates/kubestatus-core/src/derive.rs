use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{Namespace, Node};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use serde_json::{Value, json};
use std::collections::BTreeMap;

use kubestatus_k8s::Snapshot;
use kubestatus_types::{Attributes, HealthState, RESOURCE_TYPE_ATTRIBUTE, ResourceKind};

use crate::memory::quantity_to_gib;

/// Health and attribute derivation for one kind of cluster object.
///
/// Implementations are pure: the same object always yields the same state and
/// attributes. Missing counters count as zero.
pub trait DeriveStatus {
    fn health(&self) -> HealthState;

    fn attributes(&self) -> Attributes;
}

impl DeriveStatus for Snapshot {
    fn health(&self) -> HealthState {
        match self {
            Self::Deployment(d) => d.health(),
            Self::StatefulSet(s) => s.health(),
            Self::DaemonSet(d) => d.health(),
            Self::Namespace(n) => n.health(),
            Self::Node(n) => n.health(),
            Self::CronJob(c) => c.health(),
        }
    }

    fn attributes(&self) -> Attributes {
        match self {
            Self::Deployment(d) => d.attributes(),
            Self::StatefulSet(s) => s.attributes(),
            Self::DaemonSet(d) => d.attributes(),
            Self::Namespace(n) => n.attributes(),
            Self::Node(n) => n.attributes(),
            Self::CronJob(c) => c.attributes(),
        }
    }
}

/// Collect entries and tag them with the resource kind
fn tagged<const N: usize>(kind: ResourceKind, entries: [(&str, Value); N]) -> Attributes {
    let mut attributes: Attributes = entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    attributes.insert(RESOURCE_TYPE_ATTRIBUTE.to_string(), json!(kind.as_str()));
    attributes
}

// ============================================================================
// Workloads
// ============================================================================

impl DeriveStatus for Deployment {
    fn health(&self) -> HealthState {
        let status = self.status.as_ref();
        let conditions = status
            .and_then(|s| s.conditions.as_deref())
            .unwrap_or_default();
        let is_false = |type_: &str| {
            conditions
                .iter()
                .any(|c| c.type_ == type_ && c.status == "False")
        };

        // A stalled rollout outranks an unavailable one
        if is_false("Progressing") {
            return HealthState::Failed;
        }
        if is_false("Available") {
            return HealthState::Progressing;
        }

        let desired = status.and_then(|s| s.replicas).unwrap_or(0);
        let available = status.and_then(|s| s.available_replicas).unwrap_or(0);

        if desired == 0 {
            HealthState::Stopped
        } else if available == desired {
            HealthState::Running
        } else {
            HealthState::Progressing
        }
    }

    fn attributes(&self) -> Attributes {
        let status = self.status.as_ref();
        tagged(
            ResourceKind::Deployment,
            [
                ("namespace", json!(self.metadata.namespace)),
                ("replicas", json!(status.and_then(|s| s.replicas).unwrap_or(0))),
                (
                    "available_replicas",
                    json!(status.and_then(|s| s.available_replicas).unwrap_or(0)),
                ),
                (
                    "updated_replicas",
                    json!(status.and_then(|s| s.updated_replicas).unwrap_or(0)),
                ),
                (
                    "unavailable_replicas",
                    json!(status.and_then(|s| s.unavailable_replicas).unwrap_or(0)),
                ),
            ],
        )
    }
}

impl DeriveStatus for StatefulSet {
    fn health(&self) -> HealthState {
        let status = self.status.as_ref();
        let desired = status.map(|s| s.replicas).unwrap_or(0);
        let ready = status.and_then(|s| s.ready_replicas).unwrap_or(0);
        let current = status.and_then(|s| s.current_replicas).unwrap_or(0);
        let updated = status.and_then(|s| s.updated_replicas).unwrap_or(0);

        if desired == 0 {
            HealthState::Stopped
        } else if ready == desired && updated == desired {
            HealthState::Running
        } else if current > 0 {
            HealthState::Progressing
        } else {
            HealthState::Failed
        }
    }

    fn attributes(&self) -> Attributes {
        let status = self.status.as_ref();
        tagged(
            ResourceKind::StatefulSet,
            [
                ("namespace", json!(self.metadata.namespace)),
                ("replicas", json!(status.map(|s| s.replicas).unwrap_or(0))),
                (
                    "ready_replicas",
                    json!(status.and_then(|s| s.ready_replicas).unwrap_or(0)),
                ),
                (
                    "current_replicas",
                    json!(status.and_then(|s| s.current_replicas).unwrap_or(0)),
                ),
                (
                    "updated_replicas",
                    json!(status.and_then(|s| s.updated_replicas).unwrap_or(0)),
                ),
            ],
        )
    }
}

impl DeriveStatus for DaemonSet {
    fn health(&self) -> HealthState {
        let status = self.status.as_ref();
        let desired = status.map(|s| s.desired_number_scheduled).unwrap_or(0);
        let ready = status.map(|s| s.number_ready).unwrap_or(0);
        let available = status.and_then(|s| s.number_available).unwrap_or(0);

        if desired == 0 {
            HealthState::Stopped
        } else if ready == desired && available == desired {
            HealthState::Running
        } else if ready > 0 {
            HealthState::Progressing
        } else {
            HealthState::Failed
        }
    }

    fn attributes(&self) -> Attributes {
        let status = self.status.as_ref();
        tagged(
            ResourceKind::DaemonSet,
            [
                ("namespace", json!(self.metadata.namespace)),
                (
                    "desired_number_scheduled",
                    json!(status.map(|s| s.desired_number_scheduled).unwrap_or(0)),
                ),
                (
                    "current_number_scheduled",
                    json!(status.map(|s| s.current_number_scheduled).unwrap_or(0)),
                ),
                ("number_ready", json!(status.map(|s| s.number_ready).unwrap_or(0))),
                (
                    "number_available",
                    json!(status.and_then(|s| s.number_available).unwrap_or(0)),
                ),
            ],
        )
    }
}

// ============================================================================
// Cluster objects
// ============================================================================

impl DeriveStatus for Namespace {
    fn health(&self) -> HealthState {
        self.status
            .as_ref()
            .and_then(|s| s.phase.clone())
            .map(HealthState::Phase)
            .unwrap_or(HealthState::Unknown)
    }

    fn attributes(&self) -> Attributes {
        tagged(
            ResourceKind::Namespace,
            [
                (
                    "labels",
                    json!(self.metadata.labels.clone().unwrap_or_default()),
                ),
                (
                    "creation_timestamp",
                    json!(
                        self.metadata
                            .creation_timestamp
                            .as_ref()
                            .map(timestamp)
                    ),
                ),
                ("status", json!(self.status.as_ref().and_then(|s| s.phase.as_ref()))),
            ],
        )
    }
}

impl DeriveStatus for Node {
    fn health(&self) -> HealthState {
        let ready = self
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == "Ready" && c.status == "True")
            });

        if ready {
            HealthState::Ready
        } else {
            HealthState::NotReady
        }
    }

    fn attributes(&self) -> Attributes {
        let status = self.status.as_ref();
        let addresses = status
            .and_then(|s| s.addresses.as_deref())
            .unwrap_or_default();
        let capacity = status.and_then(|s| s.capacity.as_ref());
        let allocatable = status.and_then(|s| s.allocatable.as_ref());

        // Prefer the internal address, fall back to whatever is listed first
        let ip_address = addresses
            .iter()
            .find(|a| a.type_ == "InternalIP")
            .or_else(|| addresses.first())
            .map(|a| a.address.clone());

        let cpu_cores = capacity
            .and_then(|c| c.get("cpu"))
            .map(|cpu| format!("{} cores", cpu.0));

        let conditions: Vec<Value> = status
            .and_then(|s| s.conditions.as_deref())
            .unwrap_or_default()
            .iter()
            .map(|c| json!({ "type": c.type_, "status": c.status }))
            .collect();

        tagged(
            ResourceKind::Node,
            [
                ("ip_address", json!(ip_address)),
                ("CPU Cores", json!(cpu_cores)),
                ("Total Memory (GB)", json!(memory_gb(capacity))),
                ("Free Memory (GB)", json!(memory_gb(allocatable))),
                (
                    "labels",
                    json!(self.metadata.labels.clone().unwrap_or_default()),
                ),
                (
                    "addresses",
                    json!(addresses.iter().map(|a| &a.address).collect::<Vec<_>>()),
                ),
                ("capacity", json!(capacity)),
                ("allocatable", json!(allocatable)),
                ("conditions", Value::Array(conditions)),
            ],
        )
    }
}

/// Memory entry of a resource map rendered as whole GiB
fn memory_gb(resources: Option<&BTreeMap<String, Quantity>>) -> Option<String> {
    resources
        .and_then(|r| r.get("memory"))
        .and_then(|quantity| quantity_to_gib(&quantity.0))
        .map(|gib| format!("{} GB", gib))
}

/// Date, time and UTC offset separated by spaces, e.g. `2024-01-15 03:00:00+00:00`
fn timestamp(time: &Time) -> String {
    time.0.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

impl DeriveStatus for CronJob {
    fn health(&self) -> HealthState {
        self.status
            .as_ref()
            .and_then(|s| s.last_schedule_time.as_ref())
            .map(|t| HealthState::LastScheduled(timestamp(t)))
            .unwrap_or(HealthState::Never)
    }

    fn attributes(&self) -> Attributes {
        let spec = self.spec.as_ref();
        let status = self.status.as_ref();
        let active: Vec<&str> = status
            .and_then(|s| s.active.as_deref())
            .unwrap_or_default()
            .iter()
            .filter_map(|job| job.name.as_deref())
            .collect();

        tagged(
            ResourceKind::CronJob,
            [
                ("namespace", json!(self.metadata.namespace)),
                ("schedule", json!(spec.map(|s| &s.schedule))),
                ("suspend", json!(spec.and_then(|s| s.suspend).unwrap_or(false))),
                ("active", json!(active)),
                (
                    "last_successful_time",
                    json!(
                        status
                            .and_then(|s| s.last_successful_time.as_ref())
                            .map(timestamp)
                    ),
                ),
            ],
        )
    }
}
