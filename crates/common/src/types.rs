use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a single message in the store.
///
/// Backed by a UUID. The nil UUID doubles as the "no identity" marker:
/// producer validation rejects it, so a message that reaches the log always
/// carries a real ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// A fresh random ID.
    pub fn new() -> Self {
        Uuid::new_v4().into()
    }

    /// The nil ID, standing in for a missing identity.
    pub fn nil() -> Self {
        Uuid::nil().into()
    }

    /// Whether this is the nil ID.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Wraps an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        uuid.into()
    }

    /// The wrapped UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Uuid::parse_str(s)?.into())
    }
}

impl From<Uuid> for MessageId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<MessageId> for Uuid {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_do_not_collide() {
        let ids: Vec<MessageId> = (0..16).map(|_| MessageId::new()).collect();
        for (i, a) in ids.iter().enumerate() {
            assert!(!a.is_nil());
            assert!(ids.iter().skip(i + 1).all(|b| b != a));
        }
    }

    #[test]
    fn only_the_nil_id_is_nil() {
        assert!(MessageId::nil().is_nil());
        assert!(!MessageId::default().is_nil());
    }

    #[test]
    fn display_and_parse_roundtrip() {
        let id = MessageId::new();
        let parsed: MessageId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<MessageId>().is_err());
    }

    #[test]
    fn uuid_conversions_preserve_the_value() {
        let uuid = Uuid::new_v4();
        let id = MessageId::from(uuid);
        assert_eq!(Uuid::from(id), uuid);
        assert_eq!(MessageId::from_uuid(uuid).as_uuid(), uuid);
    }

    #[test]
    fn serializes_as_a_bare_uuid_string() {
        let id = MessageId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::json!(id.as_uuid().to_string()));

        let back: MessageId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }
}
