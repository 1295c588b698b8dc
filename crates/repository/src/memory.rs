use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    MessageEnvelope, RepositoryError, Result,
    repository::{
        ANY_POSITION, Repository, validate_category_read, validate_envelope_for_write,
        validate_expected_position, validate_stream_read,
    },
};

/// In-memory repository implementation for testing.
///
/// Stores all envelopes in memory and provides the same interface and
/// position-assignment behavior as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    messages: Arc<RwLock<Vec<MessageEnvelope>>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository seeded with the given envelopes.
    ///
    /// Positions are assigned as if each envelope had been written in order.
    pub fn with_messages(messages: Vec<MessageEnvelope>) -> Self {
        let mut stored: Vec<MessageEnvelope> = Vec::with_capacity(messages.len());
        for message in messages {
            let mut message = message;
            message.position = stream_head(&stored, &message.stream_name) + 1;
            message.global_position = stored.len() as i64 + 1;
            stored.push(message);
        }
        Self {
            messages: Arc::new(RwLock::new(stored)),
        }
    }

    /// Returns the total number of messages stored.
    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Clears all messages.
    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }

    async fn append(&self, message: &MessageEnvelope, expected_position: Option<i64>) -> Result<()> {
        validate_envelope_for_write(message)?;

        let mut store = self.messages.write().await;
        let head = stream_head(&store, &message.stream_name);

        if let Some(expected) = expected_position
            && expected != ANY_POSITION
            && expected != head
        {
            return Err(RepositoryError::VersionConflict {
                stream: message.stream_name.clone(),
                expected,
            });
        }

        let global = store.iter().map(|m| m.global_position).max().unwrap_or(0) + 1;
        let mut stored = message.clone();
        stored.position = head + 1;
        stored.global_position = global;
        stored.time = Utc::now();
        store.push(stored);

        Ok(())
    }
}

fn stream_head(store: &[MessageEnvelope], stream_name: &str) -> i64 {
    store
        .iter()
        .filter(|m| m.stream_name == stream_name)
        .map(|m| m.position)
        .max()
        .unwrap_or(0)
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn write_message(&self, message: &MessageEnvelope) -> Result<()> {
        self.append(message, None).await
    }

    async fn write_message_with_expected_position(
        &self,
        message: &MessageEnvelope,
        expected_position: i64,
    ) -> Result<()> {
        validate_expected_position(expected_position)?;
        self.append(message, Some(expected_position)).await
    }

    async fn get_all_messages_in_stream(
        &self,
        stream_name: &str,
        batch_size: i64,
    ) -> Result<Vec<MessageEnvelope>> {
        self.get_all_messages_in_stream_since(stream_name, 0, batch_size)
            .await
    }

    async fn get_all_messages_in_stream_since(
        &self,
        stream_name: &str,
        since_version: i64,
        batch_size: i64,
    ) -> Result<Vec<MessageEnvelope>> {
        validate_stream_read(stream_name, batch_size)?;

        let store = self.messages.read().await;
        let mut messages: Vec<_> = store
            .iter()
            .filter(|m| m.stream_name == stream_name && m.position >= since_version)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.position);
        messages.truncate(batch_size as usize);
        Ok(messages)
    }

    async fn get_all_messages_in_category(
        &self,
        category: &str,
        batch_size: i64,
    ) -> Result<Vec<MessageEnvelope>> {
        self.get_all_messages_in_category_since(category, 0, batch_size)
            .await
    }

    async fn get_all_messages_in_category_since(
        &self,
        category: &str,
        since_global_position: i64,
        batch_size: i64,
    ) -> Result<Vec<MessageEnvelope>> {
        validate_category_read(category, batch_size)?;

        let store = self.messages.read().await;
        let mut messages: Vec<_> = store
            .iter()
            .filter(|m| {
                m.stream_category == category && m.global_position >= since_global_position
            })
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.global_position);
        messages.truncate(batch_size as usize);
        Ok(messages)
    }

    async fn get_last_message_in_stream(
        &self,
        stream_name: &str,
    ) -> Result<Option<MessageEnvelope>> {
        if stream_name.is_empty() {
            return Err(RepositoryError::InvalidStreamName);
        }

        let store = self.messages.read().await;
        Ok(store
            .iter()
            .filter(|m| m.stream_name == stream_name)
            .max_by_key(|m| m.position)
            .cloned())
    }
}
