//! Enqueue-side service.
//!
//! Couples a caller's state change and the outbox write into one storage
//! transaction: resolve the payload configuration, serialize, append. Any
//! error propagates synchronously into the caller's transaction so an
//! unrecoverable configuration error can never silently drop a message.

use std::sync::Arc;

use tracing::debug;

use crate::error::OutboxError;
use crate::message::NewOutboxMessage;
use crate::registry::{OutboxPayload, PayloadRegistry};
use crate::store::{OutboxStoreTx, PgTransaction};

/// Saves payloads to the outbox inside the caller's transaction.
pub struct Outboxer<S> {
    registry: Arc<PayloadRegistry>,
    store: Arc<S>,
}

impl<S> Clone for Outboxer<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> Outboxer<S>
where
    S: OutboxStoreTx,
{
    pub fn new(registry: Arc<PayloadRegistry>, store: Arc<S>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &PayloadRegistry {
        &self.registry
    }

    /// Save one payload to the outbox. The write commits or rolls back
    /// together with whatever else the caller does in `tx`.
    pub async fn enqueue<T: OutboxPayload>(
        &self,
        tx: &mut PgTransaction<'_>,
        payload: &T,
    ) -> Result<i64, OutboxError> {
        let config = self
            .registry
            .resolve(T::TYPE_TAG)?
            .typed::<T>()
            .ok_or_else(|| OutboxError::ConfigNotFound(T::TYPE_TAG.to_string()))?;

        let message = NewOutboxMessage {
            type_tag: T::TYPE_TAG.to_string(),
            topic: config.topic().to_string(),
            payload: config.serialize(payload)?,
        };

        let id = self.store.append(tx, message).await?;
        debug!(type_tag = T::TYPE_TAG, id, "Saved payload to outbox");
        Ok(id)
    }

    /// Save a batch of payloads of one type, in order.
    pub async fn enqueue_all<T: OutboxPayload>(
        &self,
        tx: &mut PgTransaction<'_>,
        payloads: &[T],
    ) -> Result<Vec<i64>, OutboxError> {
        let mut ids = Vec::with_capacity(payloads.len());
        for payload in payloads {
            ids.push(self.enqueue(tx, payload).await?);
        }
        Ok(ids)
    }
}
