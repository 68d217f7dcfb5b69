//! Payload-type configuration registry.
//!
//! Each payload type an application wants outboxed registers one
//! [`PayloadTypeConfig`] under a stable [`OutboxPayload::TYPE_TAG`]. The
//! registry is assembled once at startup from the enumerated configs and is
//! immutable afterwards, so concurrent reads need no synchronization.
//!
//! The tag is an explicit identifier chosen by the registering application,
//! never derived from a type name, so stored rows stay decodable across
//! refactors.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::OutboxError;
use crate::message::OutboundMessage;

/// A payload type that can be saved to the outbox.
///
/// `TYPE_TAG` is persisted with every record and used to resolve the
/// matching [`PayloadTypeConfig`] on both the enqueue and the relay path.
pub trait OutboxPayload: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable identifier for this payload type.
    const TYPE_TAG: &'static str;
}

/// Outboxing configuration for one payload type: destination topic, key
/// extractor and custom headers. Codecs are JSON on the value side and
/// UTF-8 on the key side.
pub struct PayloadTypeConfig<T: OutboxPayload> {
    topic: String,
    key_extractor: Arc<dyn Fn(&T) -> String + Send + Sync>,
    headers: Vec<(String, String)>,
}

impl<T: OutboxPayload> PayloadTypeConfig<T> {
    pub fn new(
        topic: impl Into<String>,
        key_extractor: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            topic: topic.into(),
            key_extractor: Arc::new(key_extractor),
            headers: Vec::new(),
        }
    }

    /// Add a custom header set on every outbound message of this type
    /// (like type information for consumers).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Serializes a payload for storage in the outbox.
    pub fn serialize(&self, payload: &T) -> Result<Vec<u8>, OutboxError> {
        serde_json::to_vec(payload).map_err(OutboxError::from)
    }

    /// Deserializes a stored payload back into its typed form.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<T, OutboxError> {
        serde_json::from_slice(bytes).map_err(OutboxError::from)
    }

    pub fn key_of(&self, payload: &T) -> String {
        (self.key_extractor)(payload)
    }
}

/// Type-erased entry stored in the registry.
///
/// The relay works on stored bytes and string tags only, so the typed
/// config is captured behind closures at registration time.
#[derive(Clone)]
pub struct ErasedPayloadConfig {
    type_tag: &'static str,
    topic: String,
    headers: Vec<(String, String)>,
    typed: Arc<dyn Any + Send + Sync>,
    build_outbound: Arc<dyn Fn(&[u8]) -> Result<OutboundMessage, OutboxError> + Send + Sync>,
}

impl std::fmt::Debug for ErasedPayloadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErasedPayloadConfig")
            .field("type_tag", &self.type_tag)
            .field("topic", &self.topic)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl ErasedPayloadConfig {
    fn new<T: OutboxPayload>(config: PayloadTypeConfig<T>) -> Self {
        let topic = config.topic.clone();
        let headers = config.headers.clone();
        let key_extractor = Arc::clone(&config.key_extractor);

        let outbound_topic = topic.clone();
        let outbound_headers = headers.clone();
        let build_outbound: Arc<
            dyn Fn(&[u8]) -> Result<OutboundMessage, OutboxError> + Send + Sync,
        > = Arc::new(move |bytes: &[u8]| {
            let payload: T = serde_json::from_slice(bytes)?;
            let key = key_extractor(&payload);
            let value = serde_json::to_vec(&payload)?;
            Ok(OutboundMessage {
                topic: outbound_topic.clone(),
                key,
                value,
                headers: outbound_headers.clone(),
            })
        });

        Self {
            type_tag: T::TYPE_TAG,
            topic,
            headers,
            typed: Arc::new(config),
            build_outbound,
        }
    }

    pub fn type_tag(&self) -> &'static str {
        self.type_tag
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Rebuild the broker-bound message from stored bytes: deserialize the
    /// payload, extract its key, re-encode the value and attach the
    /// configured headers.
    pub fn build_outbound(&self, bytes: &[u8]) -> Result<OutboundMessage, OutboxError> {
        (self.build_outbound)(bytes)
    }

    /// Recover the typed configuration. Returns `None` when `T` does not
    /// match the registered type.
    pub fn typed<T: OutboxPayload>(&self) -> Option<&PayloadTypeConfig<T>> {
        self.typed.downcast_ref::<PayloadTypeConfig<T>>()
    }
}

/// Builder assembling the registry from the enumerated payload configs.
#[derive(Default)]
pub struct PayloadRegistryBuilder {
    configs: HashMap<&'static str, ErasedPayloadConfig>,
}

impl PayloadRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload configuration. A duplicate type tag is a fatal
    /// startup error, never recoverable at runtime.
    pub fn register<T: OutboxPayload>(
        mut self,
        config: PayloadTypeConfig<T>,
    ) -> Result<Self, OutboxError> {
        if self.configs.contains_key(T::TYPE_TAG) {
            return Err(OutboxError::DuplicateTypeTag(T::TYPE_TAG.to_string()));
        }
        self.configs
            .insert(T::TYPE_TAG, ErasedPayloadConfig::new(config));
        Ok(self)
    }

    pub fn build(self) -> PayloadRegistry {
        PayloadRegistry {
            configs: self.configs,
        }
    }
}

/// Immutable, process-wide mapping from type tag to payload configuration.
#[derive(Clone)]
pub struct PayloadRegistry {
    configs: HashMap<&'static str, ErasedPayloadConfig>,
}

impl PayloadRegistry {
    pub fn builder() -> PayloadRegistryBuilder {
        PayloadRegistryBuilder::new()
    }

    /// O(1) lookup by type tag.
    pub fn resolve(&self, type_tag: &str) -> Result<&ErasedPayloadConfig, OutboxError> {
        self.configs
            .get(type_tag)
            .ok_or_else(|| OutboxError::ConfigNotFound(type_tag.to_string()))
    }

    /// Distinct topics referenced by the registered configs, sorted.
    /// Input for destination construction.
    pub fn topics(&self) -> Vec<&str> {
        let mut topics: Vec<&str> = self.configs.values().map(|c| c.topic()).collect();
        topics.sort_unstable();
        topics.dedup();
        topics
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
