//! Outbox message model.
//!
//! An outbox record couples a serialized payload with the routing data
//! needed to republish it later: the type tag resolving its payload
//! configuration and the topic it targets. Once stored, a record is never
//! updated in place; only deletion (after a confirmed publish) mutates its
//! existence.

/// A message pending relay, as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxMessage {
    /// Store-assigned, monotonically increasing id. Relay order.
    pub id: i64,
    /// Stable identifier of the payload configuration that serialized this
    /// message. Never a runtime type name.
    pub type_tag: String,
    /// Destination topic, denormalized from the configuration at insert
    /// time.
    pub topic: String,
    /// Serialized payload bytes.
    pub payload: Vec<u8>,
}

/// A message ready for insertion; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewOutboxMessage {
    pub type_tag: String,
    pub topic: String,
    pub payload: Vec<u8>,
}

/// A fully built broker-bound message: deserialized-and-re-encoded value,
/// extracted key, and the configured custom headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub key: String,
    pub value: Vec<u8>,
    pub headers: Vec<(String, String)>,
}
