pub mod in_memory;
pub mod kafka;
pub mod relay;

pub use in_memory::{CollectingPublisher, InMemoryDestinationRegistry};
pub use kafka::{KafkaDestinationRegistry, ProducerCustomizer, ProducerSettings};
pub use relay::{RelayConfig, RelayConfigBuilder, RelayCoordinator, TickOutcome};
