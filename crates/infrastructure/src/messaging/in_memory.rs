//! In-memory destinations for relay tests: a collecting publisher whose
//! failures can be scripted, and a registry over a fixed topic set.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use outboxer_domain::error::OutboxError;
use outboxer_domain::message::OutboundMessage;
use outboxer_domain::publisher::{DestinationRegistry, MessagePublisher};

/// Publisher that records everything published to it.
pub struct CollectingPublisher {
    topic: String,
    published: Mutex<Vec<OutboundMessage>>,
    fail_publishes: AtomicBool,
}

impl CollectingPublisher {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            published: Mutex::new(Vec::new()),
            fail_publishes: AtomicBool::new(false),
        }
    }

    /// Make subsequent publishes fail with a broker-style error.
    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<OutboundMessage> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagePublisher for CollectingPublisher {
    async fn publish(&self, message: OutboundMessage) -> Result<(), OutboxError> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(OutboxError::Publish {
                topic: self.topic.clone(),
                reason: "broker unavailable".to_string(),
            });
        }
        self.published.lock().unwrap().push(message);
        Ok(())
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}

/// Registry over a fixed set of collecting publishers.
#[derive(Default)]
pub struct InMemoryDestinationRegistry {
    publishers: HashMap<String, Arc<CollectingPublisher>>,
}

impl InMemoryDestinationRegistry {
    pub fn with_topics(topics: &[&str]) -> Self {
        let publishers = topics
            .iter()
            .map(|topic| {
                (
                    topic.to_string(),
                    Arc::new(CollectingPublisher::new(*topic)),
                )
            })
            .collect();
        Self { publishers }
    }

    /// Direct access to a topic's publisher for assertions.
    pub fn publisher(&self, topic: &str) -> Option<Arc<CollectingPublisher>> {
        self.publishers.get(topic).cloned()
    }
}

impl DestinationRegistry for InMemoryDestinationRegistry {
    fn lookup(&self, topic: &str) -> Result<Arc<dyn MessagePublisher>, OutboxError> {
        self.publishers
            .get(topic)
            .map(|p| Arc::clone(p) as Arc<dyn MessagePublisher>)
            .ok_or_else(|| OutboxError::DestinationNotFound(topic.to_string()))
    }
}
