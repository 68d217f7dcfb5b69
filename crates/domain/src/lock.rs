//! Cluster-wide mutual exclusion port.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::OutboxError;

/// Distributed lock honored across every process instance sharing one
/// outbox store.
///
/// A lock acquired with `try_acquire` auto-expires after `max_hold` if the
/// holder never releases it, which caps the blast radius of a crashed
/// holder. Expiry-induced overlap between two holders is tolerated by the
/// rest of the system (deletes are idempotent), so providers need not
/// fence.
#[async_trait]
pub trait LockProvider: Send + Sync {
    /// Try to take the named lock for at most `max_hold`. Returns `false`
    /// without blocking when another holder is active.
    async fn try_acquire(&self, name: &str, max_hold: Duration) -> Result<bool, OutboxError>;

    /// Release the named lock early. Best effort: the lock would expire on
    /// its own after `max_hold`.
    async fn release(&self, name: &str) -> Result<(), OutboxError>;
}
