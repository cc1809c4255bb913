//! Status derivation and refresh engine for kubestatus
//!
//! This crate turns cluster snapshots into health states and attributes, and
//! keeps one tracker per discovered object refreshed with isolated failure
//! handling.

mod derive;
mod memory;
mod registry;
mod tracker;

#[cfg(test)]
mod fake;

pub use derive::DeriveStatus;
pub use memory::quantity_to_gib;
pub use registry::{ActivationError, ClusterEntry, ClusterRegistry, RefreshSummary};
pub use tracker::{RefreshOutcome, ResourceTracker};

// Re-export types used in our public API
pub use kubestatus_types::{
    Attributes, Availability, HealthState, ResourceIdentity, ResourceKind, StatusRecord,
};
