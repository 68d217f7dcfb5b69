//! In-memory store and lock provider for deterministic relay tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use outboxer_domain::error::OutboxError;
use outboxer_domain::lock::LockProvider;
use outboxer_domain::message::{NewOutboxMessage, OutboxMessage};
use outboxer_domain::store::OutboxStore;

/// In-memory outbox store. Counts loads so tests can assert that a skipped
/// tick touched the store not at all.
pub struct InMemoryOutboxStore {
    messages: Mutex<Vec<OutboxMessage>>,
    next_id: AtomicI64,
    load_calls: AtomicU64,
}

impl InMemoryOutboxStore {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            load_calls: AtomicU64::new(0),
        }
    }

    /// Insert a message directly, standing in for the transactional append.
    pub fn insert(&self, message: NewOutboxMessage) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.messages.lock().unwrap().push(OutboxMessage {
            id,
            type_tag: message.type_tag,
            topic: message.topic,
            payload: message.payload,
        });
        id
    }

    /// How many times the relay scanned the store.
    pub fn load_calls(&self) -> u64 {
        self.load_calls.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<OutboxMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn load_all_ordered(&self) -> Result<Vec<OutboxMessage>, OutboxError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let mut messages = self.messages.lock().unwrap().clone();
        messages.sort_by_key(|m| m.id);
        Ok(messages)
    }

    async fn remove(&self, id: i64) -> Result<(), OutboxError> {
        self.messages.lock().unwrap().retain(|m| m.id != id);
        Ok(())
    }

    async fn count(&self) -> Result<u64, OutboxError> {
        Ok(self.messages.lock().unwrap().len() as u64)
    }
}

/// In-memory lock provider with timestamp expiry, shared between the relay
/// under test and a simulated second cluster member.
#[derive(Default)]
pub struct InMemoryLockProvider {
    holds: Mutex<HashMap<String, Instant>>,
}

impl InMemoryLockProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockProvider for InMemoryLockProvider {
    async fn try_acquire(&self, name: &str, max_hold: Duration) -> Result<bool, OutboxError> {
        let mut holds = self.holds.lock().unwrap();
        let now = Instant::now();
        match holds.get(name) {
            Some(expires_at) if *expires_at > now => Ok(false),
            _ => {
                holds.insert(name.to_string(), now + max_hold);
                Ok(true)
            }
        }
    }

    async fn release(&self, name: &str) -> Result<(), OutboxError> {
        self.holds.lock().unwrap().remove(name);
        Ok(())
    }
}
