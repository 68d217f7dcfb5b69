//! Outbox store ports.
//!
//! The enqueue path and the relay path see different surfaces of the same
//! durable collection. `append` joins the caller's transaction, so it takes
//! the transaction handle explicitly; the relay-side operations run on
//! their own connections.

use async_trait::async_trait;

use crate::error::OutboxError;
use crate::message::{NewOutboxMessage, OutboxMessage};

/// Type alias for PostgreSQL transaction
pub type PgTransaction<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

/// Transaction-joined append. The signature enforces the
/// required-active-transaction precondition: without an open transaction
/// there is no handle to pass, so an outbox write can never commit apart
/// from the caller's own state change.
#[async_trait]
pub trait OutboxStoreTx: Send + Sync {
    /// Insert a message inside the caller's transaction and return the
    /// store-assigned id.
    async fn append(
        &self,
        tx: &mut PgTransaction<'_>,
        message: NewOutboxMessage,
    ) -> Result<i64, OutboxError>;
}

/// Relay-side surface of the store.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Snapshot of all pending messages in ascending-id (insertion) order.
    async fn load_all_ordered(&self) -> Result<Vec<OutboxMessage>, OutboxError>;

    /// Delete a message by id. Idempotent: removing an absent id is a
    /// no-op, which tolerates lock-expiry races across cluster members.
    async fn remove(&self, id: i64) -> Result<(), OutboxError>;

    /// Number of pending messages. Outbox growth is the observable signal
    /// of relay trouble.
    async fn count(&self) -> Result<u64, OutboxError>;
}
