use chrono::{DateTime, Utc};
use common::{MessageId, stream};
use serde::{Deserialize, Serialize};

/// Metadata blob persisted alongside every message.
///
/// Serialized as camelCase JSON; absent fields are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Correlates messages that belong to the same unit of work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// Identity of the message that caused this one to be written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caused_by_id: Option<String>,

    /// Identity of the principal that owns the affected entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl Metadata {
    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        self.correlation_id.is_none() && self.caused_by_id.is_none() && self.owner_id.is_none()
    }
}

/// The normalized record written to and read from the message store.
///
/// Positions are assigned by the store on the write path and are 1-based:
/// the first message in a stream has `position` 1 and the first message in
/// the log has `global_position` 1. Zero is the uniform "nothing yet"
/// sentinel used by read cursors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Position across all streams, assigned by the store.
    pub global_position: i64,

    /// Position within the stream, assigned by the store.
    pub position: i64,

    /// Unique message identity, provided by the producer.
    pub id: MessageId,

    /// Message type tag; the routing key for handlers and reducers.
    pub message_type: String,

    /// Full stream name, e.g. `"order-abc123"` or `"order:command"`.
    pub stream_name: String,

    /// Category portion of the stream name, used for category reads.
    pub stream_category: String,

    /// Message payload as JSON.
    pub data: serde_json::Value,

    /// Correlation, causation and ownership metadata.
    pub metadata: Metadata,

    /// Wall clock of the append, assigned by the store.
    pub time: DateTime<Utc>,
}

impl MessageEnvelope {
    /// Creates a new envelope builder.
    pub fn builder() -> MessageEnvelopeBuilder {
        MessageEnvelopeBuilder::default()
    }
}

/// Builder for constructing message envelopes.
#[derive(Debug, Default)]
pub struct MessageEnvelopeBuilder {
    id: Option<MessageId>,
    message_type: Option<String>,
    stream_name: Option<String>,
    stream_category: Option<String>,
    data: Option<serde_json::Value>,
    metadata: Metadata,
    time: Option<DateTime<Utc>>,
}

impl MessageEnvelopeBuilder {
    /// Sets the message ID. If not set, a new ID will be generated.
    pub fn id(mut self, id: MessageId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the message type.
    pub fn message_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_type = Some(message_type.into());
        self
    }

    /// Sets the stream name. The category is derived from it unless
    /// overridden with [`stream_category`](Self::stream_category).
    pub fn stream_name(mut self, stream_name: impl Into<String>) -> Self {
        self.stream_name = Some(stream_name.into());
        self
    }

    /// Overrides the derived stream category.
    pub fn stream_category(mut self, stream_category: impl Into<String>) -> Self {
        self.stream_category = Some(stream_category.into());
        self
    }

    /// Sets the payload from a raw JSON value.
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the metadata blob.
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets the append time. If not set, the current time will be used.
    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Builds the envelope.
    ///
    /// # Panics
    ///
    /// Panics if required fields (message_type, stream_name, data) are not
    /// set.
    pub fn build(self) -> MessageEnvelope {
        self.try_build().expect("message_type, stream_name and data are required")
    }

    /// Tries to build the envelope, returning `None` if required fields are
    /// missing.
    pub fn try_build(self) -> Option<MessageEnvelope> {
        let stream_name = self.stream_name?;
        let stream_category = self
            .stream_category
            .unwrap_or_else(|| stream::category_of(&stream_name).to_string());

        Some(MessageEnvelope {
            global_position: 0,
            position: 0,
            id: self.id.unwrap_or_default(),
            message_type: self.message_type?,
            stream_name,
            stream_category,
            data: self.data?,
            metadata: self.metadata,
            time: self.time.unwrap_or_else(Utc::now),
        })
    }
}
