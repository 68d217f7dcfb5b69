//! Domain layer of the transactional message outboxer.
//!
//! Implements the transactional-outbox pattern: callers persist a message
//! intent in the same storage transaction as their own state change, and a
//! separate relay later delivers the intent to the broker, deleting it only
//! once delivery is confirmed. At-least-once delivery without a distributed
//! transaction.
//!
//! This crate holds the models, the payload-type registry, the enqueue
//! service and the ports (store, publisher, lock) that the infrastructure
//! crate implements.

pub mod error;
pub mod lock;
pub mod message;
pub mod outboxer;
pub mod publisher;
pub mod registry;
pub mod store;

pub use error::OutboxError;
pub use lock::LockProvider;
pub use message::{NewOutboxMessage, OutboundMessage, OutboxMessage};
pub use outboxer::Outboxer;
pub use publisher::{DestinationRegistry, MessagePublisher};
pub use registry::{OutboxPayload, PayloadRegistry, PayloadRegistryBuilder, PayloadTypeConfig};
pub use store::{OutboxStore, OutboxStoreTx, PgTransaction};
