//! Kubernetes client for kubestatus
//!
//! This crate loads credential bundles, builds client sets, and performs the
//! list-all and read-one calls the refresh engine is built on.

mod bundle;
mod client;
mod error;
mod fetch;
#[cfg(test)]
mod mock;
mod snapshot;

pub use bundle::CredentialBundle;
pub use client::{
    AppsApi, BatchApi, ClientSet, ClusterReader, Connect, CoreApi, KubeconfigConnector,
    NetworkingApi,
};
pub use error::ClusterError;
pub use fetch::Inventory;
pub use snapshot::Snapshot;

// Re-export types that are used in our public API
pub use kubestatus_types::{ResourceIdentity, ResourceKind};
