pub mod in_memory;
pub mod postgres_lock;
pub mod postgres_store;

pub use in_memory::{InMemoryLockProvider, InMemoryOutboxStore};
pub use postgres_lock::PostgresLockProvider;
pub use postgres_store::PostgresOutboxStore;
