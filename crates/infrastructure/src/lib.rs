//! Infrastructure layer of the transactional message outboxer.
//!
//! Concrete adapters for the domain ports: a PostgreSQL store and lock
//! provider (sqlx), Kafka destinations (rdkafka), the relay coordinator
//! that drains the store under cluster-wide mutual exclusion, and
//! in-memory adapters for tests.

pub mod messaging;
pub mod persistence;

pub use messaging::{
    KafkaDestinationRegistry, ProducerSettings, RelayConfig, RelayCoordinator, TickOutcome,
};
pub use persistence::{PostgresLockProvider, PostgresOutboxStore};
