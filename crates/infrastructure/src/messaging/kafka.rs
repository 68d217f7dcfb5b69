//! Kafka destinations.
//!
//! One eagerly constructed `FutureProducer` per topic referenced by the
//! payload registry, all sharing the connection settings and each pinned to
//! at most one in-flight request per connection to bound reordering.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use outboxer_domain::error::OutboxError;
use outboxer_domain::message::OutboundMessage;
use outboxer_domain::publisher::{DestinationRegistry, MessagePublisher};
use outboxer_domain::registry::PayloadRegistry;
use rdkafka::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use tracing::{debug, info, warn};

/// Hook mutating the `ClientConfig` of a single topic's producer (schema
/// registry settings and the like).
pub type ProducerCustomizer = Arc<dyn Fn(&mut ClientConfig) + Send + Sync>;

/// Shared producer connection settings.
#[derive(Debug, Clone)]
pub struct ProducerSettings {
    pub bootstrap_servers: String,
    pub batch_size: usize,
    pub linger: Duration,
}

impl ProducerSettings {
    pub fn new(bootstrap_servers: impl Into<String>) -> Self {
        Self {
            bootstrap_servers: bootstrap_servers.into(),
            batch_size: 16384,
            linger: Duration::from_millis(0),
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }
}

/// Kafka-backed destination registry: topic name to cached publisher.
pub struct KafkaDestinationRegistry {
    publishers: HashMap<String, Arc<dyn MessagePublisher>>,
}

impl KafkaDestinationRegistry {
    /// Build one producer per distinct topic the registry references.
    pub fn build(
        registry: &PayloadRegistry,
        settings: &ProducerSettings,
    ) -> Result<Self, OutboxError> {
        Self::build_with_customizers(registry, settings, &HashMap::new())
    }

    /// Like [`build`](Self::build), with per-topic `ClientConfig` hooks.
    pub fn build_with_customizers(
        registry: &PayloadRegistry,
        settings: &ProducerSettings,
        customizers: &HashMap<String, ProducerCustomizer>,
    ) -> Result<Self, OutboxError> {
        let mut publishers: HashMap<String, Arc<dyn MessagePublisher>> = HashMap::new();

        for topic in registry.topics() {
            let producer = create_producer(settings, customizers.get(topic))
                .map_err(|e| OutboxError::Broker(e.to_string()))?;
            info!(topic, "Created kafka producer for outbox destination");
            publishers.insert(
                topic.to_string(),
                Arc::new(KafkaPublisher {
                    topic: topic.to_string(),
                    producer,
                }),
            );
        }

        Ok(Self { publishers })
    }
}

impl DestinationRegistry for KafkaDestinationRegistry {
    fn lookup(&self, topic: &str) -> Result<Arc<dyn MessagePublisher>, OutboxError> {
        self.publishers
            .get(topic)
            .cloned()
            .ok_or_else(|| OutboxError::DestinationNotFound(topic.to_string()))
    }
}

fn create_producer(
    settings: &ProducerSettings,
    customizer: Option<&ProducerCustomizer>,
) -> Result<FutureProducer, rdkafka::error::KafkaError> {
    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", &settings.bootstrap_servers)
        .set("batch.size", settings.batch_size.to_string())
        .set("linger.ms", settings.linger.as_millis().to_string())
        // One in-flight request per connection bounds, but does not
        // eliminate, reordering between submission and acknowledgment.
        .set("max.in.flight.requests.per.connection", "1");

    if let Some(customize) = customizer {
        customize(&mut config);
    }

    config.create()
}

/// Publisher bound to one Kafka topic.
struct KafkaPublisher {
    topic: String,
    producer: FutureProducer,
}

#[async_trait]
impl MessagePublisher for KafkaPublisher {
    async fn publish(&self, message: OutboundMessage) -> Result<(), OutboxError> {
        let mut headers = OwnedHeaders::new();
        for (name, value) in &message.headers {
            headers = headers.insert(Header {
                key: name,
                value: Some(value.as_bytes()),
            });
        }

        let record = FutureRecord::to(&self.topic)
            .key(message.key.as_str())
            .payload(&message.value)
            .headers(headers);

        // No producer-side timeout here; delivery.timeout.ms governs.
        match self.producer.send(record, Timeout::Never).await {
            Ok((partition, offset)) => {
                debug!(
                    topic = %self.topic,
                    partition,
                    offset,
                    key = %message.key,
                    "Outbox message acknowledged by broker"
                );
                Ok(())
            }
            Err((error, _)) => {
                warn!(topic = %self.topic, %error, "Outbox publish failed");
                Err(OutboxError::Publish {
                    topic: self.topic.clone(),
                    reason: error.to_string(),
                })
            }
        }
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outboxer_domain::registry::{OutboxPayload, PayloadTypeConfig};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct SomePayload {
        id: String,
        name: String,
    }

    impl OutboxPayload for SomePayload {
        const TYPE_TAG: &'static str = "some-payload";
    }

    fn registry() -> PayloadRegistry {
        PayloadRegistry::builder()
            .register(PayloadTypeConfig::new("test_topic", |p: &SomePayload| {
                p.name.clone()
            }))
            .unwrap()
            .build()
    }

    // Producer construction is lazy about connecting, so no broker is
    // needed to exercise registry building and lookup.
    #[test]
    fn builds_one_publisher_per_referenced_topic() {
        let destinations = KafkaDestinationRegistry::build(
            &registry(),
            &ProducerSettings::new("localhost:9092")
                .batch_size(1000)
                .linger(Duration::from_millis(1000)),
        )
        .unwrap();

        let publisher = destinations.lookup("test_topic").unwrap();
        assert_eq!(publisher.topic(), "test_topic");
    }

    #[test]
    fn unknown_topic_fails_with_destination_not_found() {
        let destinations =
            KafkaDestinationRegistry::build(&registry(), &ProducerSettings::new("localhost:9092"))
                .unwrap();

        let err = destinations.lookup("other_topic").unwrap_err();
        assert!(matches!(err, OutboxError::DestinationNotFound(topic) if topic == "other_topic"));
    }

    #[test]
    fn customizer_hook_is_applied() {
        let applied = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&applied);
        let customizer: ProducerCustomizer = Arc::new(move |config: &mut ClientConfig| {
            config.set("client.id", "customized");
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        });
        let mut customizers = HashMap::new();
        customizers.insert("test_topic".to_string(), customizer);

        KafkaDestinationRegistry::build_with_customizers(
            &registry(),
            &ProducerSettings::new("localhost:9092"),
            &customizers,
        )
        .unwrap();

        assert!(applied.load(std::sync::atomic::Ordering::SeqCst));
    }
}
