//! Shared error taxonomy for outboxer operations.

use thiserror::Error;

/// Error types for outbox operations
#[derive(Debug, Error)]
pub enum OutboxError {
    /// No payload configuration registered for the given type tag.
    ///
    /// Surfaced synchronously to the enqueuing caller (rolling back its
    /// transaction), or aborts the remainder of a relay batch.
    #[error("No outboxing configuration found for type tag '{0}'")]
    ConfigNotFound(String),

    /// No publisher configured for the given topic.
    #[error("No destination found for topic '{0}'")]
    DestinationNotFound(String),

    /// Two payload configurations claimed the same type tag at startup.
    #[error("Duplicate payload configuration for type tag '{0}'")]
    DuplicateTypeTag(String),

    /// The broker rejected or failed to acknowledge a publish.
    ///
    /// Never surfaced to the enqueuing caller; the affected record stays in
    /// the store and is retried on the next relay tick.
    #[error("Publish to topic '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },

    /// The broker client itself could not be constructed or configured.
    #[error("Broker client error: {0}")]
    Broker(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lock provider error: {0}")]
    Lock(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_names_the_tag() {
        let err = OutboxError::ConfigNotFound("some-payload".to_string());
        assert!(err.to_string().contains("some-payload"));
    }

    #[test]
    fn destination_not_found_names_the_topic() {
        let err = OutboxError::DestinationNotFound("test_topic".to_string());
        assert!(err.to_string().contains("test_topic"));
    }
}
