//! Relay coordinator.
//!
//! Periodically drains the outbox under a cluster-wide lock: scan in
//! insertion order, rebuild each broker-bound message, submit the publish
//! without waiting for its acknowledgment, and delete the row once the ack
//! arrives. A record whose publish fails simply stays put and is retried on
//! the next tick; retry cadence equals the relay interval.

use std::sync::Arc;
use std::time::Duration;

use outboxer_domain::error::OutboxError;
use outboxer_domain::lock::LockProvider;
use outboxer_domain::message::OutboxMessage;
use outboxer_domain::publisher::DestinationRegistry;
use outboxer_domain::registry::PayloadRegistry;
use outboxer_domain::store::OutboxStore;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};

/// Configuration for the relay coordinator
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Cluster-wide lock name shared by every instance draining the same
    /// outbox.
    pub lock_name: String,
    /// Maximum lock hold; caps how long a crashed holder blocks the fleet.
    pub max_lock_hold: Duration,
    /// How often `run` triggers a tick.
    pub interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            lock_name: "message-outboxer-relay".to_string(),
            max_lock_hold: Duration::from_secs(10),
            interval: Duration::from_secs(1),
        }
    }
}

/// Builder for RelayConfig
#[derive(Debug, Clone, Default)]
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl RelayConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_name(mut self, name: impl Into<String>) -> Self {
        self.config.lock_name = name.into();
        self
    }

    pub fn max_lock_hold(mut self, max_lock_hold: Duration) -> Self {
        self.config.max_lock_hold = max_lock_hold;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn build(self) -> RelayConfig {
        self.config
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The lock was held elsewhere; the tick touched nothing. Not an
    /// error, merely deferred work.
    Skipped,
    /// The batch was scanned and this many publishes were submitted.
    Submitted(usize),
}

/// Drives the store-to-broker relay loop.
pub struct RelayCoordinator {
    store: Arc<dyn OutboxStore>,
    registry: Arc<PayloadRegistry>,
    destinations: Arc<dyn DestinationRegistry>,
    lock: Arc<dyn LockProvider>,
    config: RelayConfig,
}

impl RelayCoordinator {
    pub fn new(
        store: Arc<dyn OutboxStore>,
        registry: Arc<PayloadRegistry>,
        destinations: Arc<dyn DestinationRegistry>,
        lock: Arc<dyn LockProvider>,
        config: RelayConfig,
    ) -> Self {
        Self {
            store,
            registry,
            destinations,
            lock,
            config,
        }
    }

    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::new()
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// One relay pass.
    ///
    /// Acquires the cluster lock (returning [`TickOutcome::Skipped`] when
    /// another member holds it), submits every pending message in
    /// ascending-id order, then releases the lock at the end of the
    /// synchronous phase regardless of how many publish acknowledgments
    /// have arrived. Outstanding acknowledgments keep deleting rows after
    /// release, so a subsequent tick can overlap stale in-flight callbacks;
    /// deletes being idempotent, such an overlap costs at most a duplicate
    /// delivery.
    ///
    /// A `ConfigNotFound` or `DestinationNotFound` on some record aborts
    /// the remainder of the batch: that record and every later one stay in
    /// the store for the next tick.
    pub async fn tick(&self) -> Result<TickOutcome, OutboxError> {
        if !self
            .lock
            .try_acquire(&self.config.lock_name, self.config.max_lock_hold)
            .await?
        {
            debug!(
                lock = %self.config.lock_name,
                "Relay lock held elsewhere, skipping tick"
            );
            return Ok(TickOutcome::Skipped);
        }

        let result = self.relay_pending().await;

        if let Err(e) = self.lock.release(&self.config.lock_name).await {
            warn!(
                lock = %self.config.lock_name,
                error = %e,
                "Failed to release relay lock, waiting for expiry"
            );
        }

        result
    }

    async fn relay_pending(&self) -> Result<TickOutcome, OutboxError> {
        let messages = self.store.load_all_ordered().await?;
        debug!(count = messages.len(), "Found messages in outbox, sending");

        let mut submitted = 0usize;
        for message in messages {
            self.submit(message)?;
            submitted += 1;
        }

        Ok(TickOutcome::Submitted(submitted))
    }

    /// Resolve, rebuild and submit one message. Submission is asynchronous:
    /// the publish acknowledgment is observed by a spawned task that
    /// deletes the row on success and leaves it untouched on failure.
    fn submit(&self, message: OutboxMessage) -> Result<(), OutboxError> {
        let config = self.registry.resolve(&message.type_tag)?;
        let outbound = config.build_outbound(&message.payload)?;
        let publisher = self.destinations.lookup(&message.topic)?;

        let store = Arc::clone(&self.store);
        let id = message.id;
        tokio::spawn(async move {
            match publisher.publish(outbound).await {
                Ok(()) => {
                    if let Err(e) = store.remove(id).await {
                        warn!(id, error = %e, "Failed to remove delivered outbox message");
                    }
                }
                Err(e) => {
                    // Non-deletion is the retry mechanism: the record is
                    // picked up again on the next tick.
                    warn!(id, error = %e, "Outbox publish failed, message kept for retry");
                }
            }
        });

        Ok(())
    }

    /// Drive `tick` forever at the configured interval. Tick errors are
    /// logged, never propagated; they manifest to operators only as outbox
    /// growth.
    pub async fn run(&self) {
        debug!(
            interval_ms = self.config.interval.as_millis() as u64,
            lock = %self.config.lock_name,
            "Outbox relay starting"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.tick().await {
                Ok(TickOutcome::Skipped) => {}
                Ok(TickOutcome::Submitted(count)) => {
                    if count > 0 {
                        debug!(count, "Relay tick submitted messages");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Relay tick failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_overrides_defaults() {
        let config = RelayConfigBuilder::new()
            .lock_name("custom-relay")
            .max_lock_hold(Duration::from_secs(30))
            .interval(Duration::from_millis(250))
            .build();

        assert_eq!(config.lock_name, "custom-relay");
        assert_eq!(config.max_lock_hold, Duration::from_secs(30));
        assert_eq!(config.interval, Duration::from_millis(250));
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = RelayConfig::default();
        assert_eq!(config.lock_name, "message-outboxer-relay");
        assert_eq!(config.max_lock_hold, Duration::from_secs(10));
        assert_eq!(config.interval, Duration::from_secs(1));
    }
}
