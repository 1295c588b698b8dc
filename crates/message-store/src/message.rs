use common::{MessageId, stream};
use repository::{MessageEnvelope, Metadata};
use serde::Serialize;
use serde_json::Value;

use crate::error::MessageError;

/// A command addressed to the single handler of a category.
///
/// Commands target the stream `"{category}:command"`. The `position` and
/// `global_position` fields are zero on the producer side and populated
/// when a command is decoded from a stored envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub id: MessageId,
    pub message_type: String,
    pub category: String,
    pub caused_by_id: Option<String>,
    pub owner_id: Option<String>,
    pub data: Value,
    pub position: i64,
    pub global_position: i64,
}

impl Command {
    /// Creates a command with a raw JSON payload.
    pub fn new(
        id: MessageId,
        message_type: impl Into<String>,
        category: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            id,
            message_type: message_type.into(),
            category: category.into(),
            caused_by_id: None,
            owner_id: None,
            data,
            position: 0,
            global_position: 0,
        }
    }

    /// Creates a command by serializing `data` to JSON.
    pub fn with_data<T: Serialize>(
        id: MessageId,
        message_type: impl Into<String>,
        category: impl Into<String>,
        data: &T,
    ) -> Result<Self, MessageError> {
        let data = serde_json::to_value(data).map_err(MessageError::UnserializableData)?;
        Ok(Self::new(id, message_type, category, data))
    }

    /// The stream this command targets.
    pub fn stream_name(&self) -> String {
        stream::command_stream(&self.category)
    }

    /// Validates the command and converts it into a storage envelope.
    pub fn to_envelope(&self) -> Result<MessageEnvelope, MessageError> {
        validate_parts(&self.message_type, &self.category, self.id, &self.data)?;

        Ok(MessageEnvelope::builder()
            .id(self.id)
            .message_type(self.message_type.as_str())
            .stream_name(self.stream_name())
            .data(self.data.clone())
            .metadata(Metadata {
                correlation_id: None,
                caused_by_id: self.caused_by_id.clone(),
                owner_id: self.owner_id.clone(),
            })
            .build())
    }
}

/// An event recorded on an entity stream, consumed by many.
///
/// Events target the stream `"{category}-{entityId}"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: MessageId,
    pub message_type: String,
    pub category: String,
    pub entity_id: String,
    pub caused_by_id: Option<String>,
    pub owner_id: Option<String>,
    pub data: Value,
    pub position: i64,
    pub global_position: i64,
}

impl Event {
    /// Creates an event with a raw JSON payload.
    pub fn new(
        id: MessageId,
        message_type: impl Into<String>,
        category: impl Into<String>,
        entity_id: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            id,
            message_type: message_type.into(),
            category: category.into(),
            entity_id: entity_id.into(),
            caused_by_id: None,
            owner_id: None,
            data,
            position: 0,
            global_position: 0,
        }
    }

    /// Creates an event by serializing `data` to JSON.
    pub fn with_data<T: Serialize>(
        id: MessageId,
        message_type: impl Into<String>,
        category: impl Into<String>,
        entity_id: impl Into<String>,
        data: &T,
    ) -> Result<Self, MessageError> {
        let data = serde_json::to_value(data).map_err(MessageError::UnserializableData)?;
        Ok(Self::new(id, message_type, category, entity_id, data))
    }

    /// The stream this event targets.
    pub fn stream_name(&self) -> String {
        stream::entity_stream(&self.category, &self.entity_id)
    }

    /// Validates the event and converts it into a storage envelope.
    pub fn to_envelope(&self) -> Result<MessageEnvelope, MessageError> {
        validate_parts(&self.message_type, &self.category, self.id, &self.data)?;
        if self.entity_id.is_empty() {
            return Err(MessageError::MissingEntityId);
        }

        Ok(MessageEnvelope::builder()
            .id(self.id)
            .message_type(self.message_type.as_str())
            .stream_name(self.stream_name())
            .data(self.data.clone())
            .metadata(Metadata {
                correlation_id: None,
                caused_by_id: self.caused_by_id.clone(),
                owner_id: self.owner_id.clone(),
            })
            .build())
    }
}

fn validate_parts(
    message_type: &str,
    category: &str,
    id: MessageId,
    data: &Value,
) -> Result<(), MessageError> {
    if message_type.is_empty() {
        return Err(MessageError::MissingType);
    }
    if category.is_empty() {
        return Err(MessageError::MissingCategory);
    }
    if category.contains('-') {
        return Err(MessageError::InvalidCategory);
    }
    if id.is_nil() {
        return Err(MessageError::MissingId);
    }
    if data.is_null() {
        return Err(MessageError::MissingData);
    }
    Ok(())
}

/// A message read from or written to the store.
///
/// The variant is determined by the shape of the stream name: a
/// `":command"` suffix marks a command, a hyphen marks an entity stream
/// event, and anything else (position streams, ad hoc streams) is carried
/// through as [`Message::Unknown`] with its raw envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Command(Command),
    Event(Event),
    Unknown(MessageEnvelope),
}

impl Message {
    /// The message type tag used to route handlers and reducers.
    pub fn message_type(&self) -> &str {
        match self {
            Message::Command(command) => &command.message_type,
            Message::Event(event) => &event.message_type,
            Message::Unknown(envelope) => &envelope.message_type,
        }
    }

    /// The position of this message within its stream.
    pub fn position(&self) -> i64 {
        match self {
            Message::Command(command) => command.position,
            Message::Event(event) => event.position,
            Message::Unknown(envelope) => envelope.position,
        }
    }

    /// The position of this message across all streams.
    pub fn global_position(&self) -> i64 {
        match self {
            Message::Command(command) => command.global_position,
            Message::Event(event) => event.global_position,
            Message::Unknown(envelope) => envelope.global_position,
        }
    }

    /// Validates the message and converts it into a storage envelope.
    pub fn to_envelope(&self) -> Result<MessageEnvelope, MessageError> {
        match self {
            Message::Command(command) => command.to_envelope(),
            Message::Event(event) => event.to_envelope(),
            Message::Unknown(envelope) => Ok(envelope.clone()),
        }
    }

    /// Classifies a stored envelope into a command, event or unknown message.
    pub fn from_envelope(envelope: &MessageEnvelope) -> Message {
        if stream::is_command_stream(&envelope.stream_name) {
            return Message::Command(Command {
                id: envelope.id,
                message_type: envelope.message_type.clone(),
                category: stream::category_of(&envelope.stream_name).to_string(),
                caused_by_id: envelope.metadata.caused_by_id.clone(),
                owner_id: envelope.metadata.owner_id.clone(),
                data: envelope.data.clone(),
                position: envelope.position,
                global_position: envelope.global_position,
            });
        }

        if let Some(entity_id) = stream::entity_id_of(&envelope.stream_name) {
            return Message::Event(Event {
                id: envelope.id,
                message_type: envelope.message_type.clone(),
                category: stream::category_of(&envelope.stream_name).to_string(),
                entity_id: entity_id.to_string(),
                caused_by_id: envelope.metadata.caused_by_id.clone(),
                owner_id: envelope.metadata.owner_id.clone(),
                data: envelope.data.clone(),
                position: envelope.position,
                global_position: envelope.global_position,
            });
        }

        Message::Unknown(envelope.clone())
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Message::Command(command)
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn command() -> Command {
        Command::new(MessageId::new(), "PlaceOrder", "order", json!({"total": 42}))
    }

    fn event() -> Event {
        Event::new(
            MessageId::new(),
            "OrderPlaced",
            "order",
            "abc123",
            json!({"total": 42}),
        )
    }

    #[test]
    fn command_envelope_targets_command_stream() {
        let envelope = command().to_envelope().unwrap();
        assert_eq!(envelope.stream_name, "order:command");
        assert_eq!(envelope.stream_category, "order");
        assert_eq!(envelope.message_type, "PlaceOrder");
    }

    #[test]
    fn event_envelope_targets_entity_stream() {
        let envelope = event().to_envelope().unwrap();
        assert_eq!(envelope.stream_name, "order-abc123");
        assert_eq!(envelope.stream_category, "order");
    }

    #[test]
    fn envelope_carries_causation_and_ownership() {
        let mut command = command();
        command.caused_by_id = Some("cause-1".to_string());
        command.owner_id = Some("owner-1".to_string());

        let envelope = command.to_envelope().unwrap();
        assert_eq!(envelope.metadata.caused_by_id.as_deref(), Some("cause-1"));
        assert_eq!(envelope.metadata.owner_id.as_deref(), Some("owner-1"));
        assert_eq!(envelope.metadata.correlation_id, None);
    }

    #[test]
    fn missing_type_is_rejected() {
        let mut command = command();
        command.message_type.clear();
        assert!(matches!(
            command.to_envelope(),
            Err(MessageError::MissingType)
        ));
    }

    #[test]
    fn missing_category_is_rejected() {
        let mut command = command();
        command.category.clear();
        assert!(matches!(
            command.to_envelope(),
            Err(MessageError::MissingCategory)
        ));
    }

    #[test]
    fn hyphenated_category_is_rejected() {
        let mut command = command();
        command.category = "foo-bar".to_string();
        assert!(matches!(
            command.to_envelope(),
            Err(MessageError::InvalidCategory)
        ));

        let mut event = event();
        event.category = "foo-bar".to_string();
        assert!(matches!(
            event.to_envelope(),
            Err(MessageError::InvalidCategory)
        ));
    }

    #[test]
    fn nil_id_is_rejected() {
        let mut command = command();
        command.id = MessageId::nil();
        assert!(matches!(command.to_envelope(), Err(MessageError::MissingId)));
    }

    #[test]
    fn null_data_is_rejected() {
        let mut command = command();
        command.data = Value::Null;
        assert!(matches!(
            command.to_envelope(),
            Err(MessageError::MissingData)
        ));
    }

    #[test]
    fn empty_entity_id_is_rejected() {
        let mut event = event();
        event.entity_id.clear();
        assert!(matches!(
            event.to_envelope(),
            Err(MessageError::MissingEntityId)
        ));
    }

    #[test]
    fn with_data_serializes_payloads() {
        #[derive(Serialize)]
        struct Payload {
            total: u32,
        }

        let command =
            Command::with_data(MessageId::new(), "PlaceOrder", "order", &Payload { total: 7 })
                .unwrap();
        assert_eq!(command.data, json!({"total": 7}));
    }

    #[test]
    fn with_data_rejects_unserializable_payloads() {
        // maps with non-string keys cannot become JSON objects
        let bad: std::collections::HashMap<Vec<u8>, u32> =
            [(vec![1u8], 1u32)].into_iter().collect();
        let result = Command::with_data(MessageId::new(), "PlaceOrder", "order", &bad);
        assert!(matches!(result, Err(MessageError::UnserializableData(_))));
    }

    #[test]
    fn command_roundtrips_through_envelope() {
        let mut original = command();
        original.caused_by_id = Some("cause-1".to_string());
        let mut envelope = original.to_envelope().unwrap();
        envelope.position = 4;
        envelope.global_position = 90;

        let decoded = Message::from_envelope(&envelope);
        match decoded {
            Message::Command(decoded) => {
                assert_eq!(decoded.id, original.id);
                assert_eq!(decoded.category, "order");
                assert_eq!(decoded.caused_by_id.as_deref(), Some("cause-1"));
                assert_eq!(decoded.position, 4);
                assert_eq!(decoded.global_position, 90);
            }
            other => panic!("expected a command, got {other:?}"),
        }
    }

    #[test]
    fn event_roundtrips_through_envelope() {
        let original = event();
        let envelope = original.to_envelope().unwrap();

        match Message::from_envelope(&envelope) {
            Message::Event(decoded) => {
                assert_eq!(decoded.entity_id, "abc123");
                assert_eq!(decoded.category, "order");
                assert_eq!(decoded.data, original.data);
            }
            other => panic!("expected an event, got {other:?}"),
        }
    }

    #[test]
    fn entity_id_with_hyphens_survives_classification() {
        let original = Event::new(
            MessageId::new(),
            "OrderPlaced",
            "order",
            "3b30e754-9e04-4fde-a2f9-0e2a7dbb7a58",
            json!({}),
        );
        let envelope = original.to_envelope().unwrap();
        match Message::from_envelope(&envelope) {
            Message::Event(decoded) => {
                assert_eq!(decoded.entity_id, "3b30e754-9e04-4fde-a2f9-0e2a7dbb7a58");
            }
            other => panic!("expected an event, got {other:?}"),
        }
    }

    #[test]
    fn position_stream_envelopes_classify_as_unknown() {
        let envelope = MessageEnvelope::builder()
            .message_type("PositionCommitted")
            .stream_name("reporting+position")
            .data(json!({"position": 7}))
            .build();

        assert!(matches!(
            Message::from_envelope(&envelope),
            Message::Unknown(_)
        ));
    }
}
