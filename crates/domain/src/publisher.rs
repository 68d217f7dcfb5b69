//! Broker-side ports: per-topic publishers and their registry.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::OutboxError;
use crate::message::OutboundMessage;

/// A configured publisher bound to one topic.
///
/// `publish` resolves only once the broker has acknowledged (or rejected)
/// the message. No timeout is enforced here; that is the broker client's
/// concern.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, message: OutboundMessage) -> Result<(), OutboxError>;

    fn topic(&self) -> &str;
}

impl std::fmt::Debug for dyn MessagePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagePublisher")
            .field("topic", &self.topic())
            .finish()
    }
}

/// Immutable, process-wide mapping from topic name to its publisher.
/// Publishers are constructed eagerly at startup and reused across all
/// relay ticks.
pub trait DestinationRegistry: Send + Sync {
    /// Look up the publisher for a topic. Fails with
    /// [`OutboxError::DestinationNotFound`] when the topic was never
    /// referenced by any registered payload configuration.
    fn lookup(&self, topic: &str) -> Result<Arc<dyn MessagePublisher>, OutboxError>;
}
