//! Fixed-interval refresh of every tracked resource

use std::time::Duration;

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use kubestatus_core::ClusterRegistry;
use kubestatus_k8s::Connect;

use crate::output::{self, OutputFormat};

/// Drives refresh passes over a registry until cancelled
pub struct Poller<C: Connect> {
    registry: ClusterRegistry<C>,
    interval: Duration,
    format: OutputFormat,
    cancel: CancellationToken,
}

impl<C: Connect> Poller<C> {
    pub fn new(registry: ClusterRegistry<C>, interval: Duration, format: OutputFormat) -> Self {
        Self {
            registry,
            interval,
            format,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops [`Poller::run`] when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Emit the discovered state, then refresh and emit on every tick.
    ///
    /// A pass that overruns the interval delays the next one rather than
    /// stacking passes.
    pub async fn run(&self) -> Result<()> {
        output::emit(&self.registry.records(), self.format)?;

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,

                _ = ticker.tick() => {
                    let summary = self.registry.refresh_all().await;
                    if summary.unavailable > 0 {
                        tracing::info!(
                            unavailable = summary.unavailable,
                            updated = summary.updated,
                            "some resources could not be refreshed"
                        );
                    }
                    output::emit(&self.registry.records(), self.format)?;
                }
            }
        }

        Ok(())
    }

    pub fn into_registry(self) -> ClusterRegistry<C> {
        self.registry
    }
}
