//! Stateless operations a poll cycle is made of.

use std::sync::Arc;

use async_trait::async_trait;
use common::{MessageId, stream};
use message_store::{Message, MessageStore, MessageStoreError};
use repository::MessageEnvelope;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SubscriberError};
use crate::handler::MessageHandler;
use crate::scope::SubscriptionScope;

/// Message type written to position streams.
pub const POSITION_COMMITTED: &str = "PositionCommitted";

/// Payload of a [`POSITION_COMMITTED`] message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedPosition {
    pub position: i64,
}

/// Outcome of dispatching one batch of messages.
///
/// `handled` counts messages for which at least one handler ran, not
/// handler invocations. `last_position` is the scope cursor of the last
/// message that went through without an error; it stays at zero when the
/// batch was empty. When a handler fails, `error` is set and the counts
/// reflect only the messages before the failing one.
#[derive(Debug, Default)]
pub struct ProcessedBatch {
    pub handled: usize,
    pub last_position: i64,
    pub error: Option<SubscriberError>,
}

/// The operations one poll cycle needs.
///
/// Implemented by [`SubscriptionWorker`] against a real store, and by
/// scripted fakes in the poller tests.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Reads the last committed position, or 0 when none exists.
    async fn get_position(&self) -> Result<i64>;

    /// Fetches the next batch at the cursor `since_position` (inclusive).
    async fn get_messages(&self, since_position: i64) -> Result<Vec<Message>>;

    /// Dispatches a batch to the registered handlers, in order.
    async fn process_messages(&self, messages: &[Message]) -> ProcessedBatch;

    /// Durably records `position` on the subscriber's position stream.
    async fn set_position(&self, position: i64) -> Result<()>;
}

/// Stateless helper binding a subscriber ID, a subscription scope and a
/// handler set to a message store.
pub struct SubscriptionWorker {
    store: MessageStore,
    subscriber_id: String,
    scope: SubscriptionScope,
    handlers: Vec<Arc<dyn MessageHandler>>,
    batch_size: i64,
}

impl SubscriptionWorker {
    /// Creates a worker. The caller has already validated the subscriber ID
    /// and the handler set.
    pub fn new(
        store: MessageStore,
        subscriber_id: impl Into<String>,
        scope: SubscriptionScope,
        handlers: Vec<Arc<dyn MessageHandler>>,
        batch_size: i64,
    ) -> Self {
        Self {
            store,
            subscriber_id: subscriber_id.into(),
            scope,
            handlers,
            batch_size,
        }
    }

    fn position_stream(&self) -> String {
        stream::position_stream(&self.subscriber_id)
    }
}

#[async_trait]
impl Worker for SubscriptionWorker {
    async fn get_position(&self) -> Result<i64> {
        let last = self
            .store
            .repository()
            .get_last_message_in_stream(&self.position_stream())
            .await
            .map_err(MessageStoreError::from)?;

        match last {
            Some(envelope) => {
                let committed: CommittedPosition = serde_json::from_value(envelope.data)
                    .map_err(SubscriberError::MalformedPosition)?;
                Ok(committed.position)
            }
            None => Ok(0),
        }
    }

    async fn get_messages(&self, since_position: i64) -> Result<Vec<Message>> {
        let messages = self
            .store
            .get(self.scope.read_options(since_position, self.batch_size))
            .await?;
        Ok(messages)
    }

    #[tracing::instrument(skip(self, messages), fields(batch = messages.len()))]
    async fn process_messages(&self, messages: &[Message]) -> ProcessedBatch {
        let mut batch = ProcessedBatch::default();

        for message in messages {
            let mut message_handled = false;
            for handler in &self.handlers {
                if handler.message_type() != message.message_type() {
                    continue;
                }
                if let Err(error) = handler.process(message).await {
                    batch.error = Some(SubscriberError::Handler(error));
                    return batch;
                }
                message_handled = true;
            }

            if message_handled {
                batch.handled += 1;
                metrics::counter!("subscription_messages_handled").increment(1);
            }
            // unhandled message types still advance the cursor
            batch.last_position = self.scope.position_of(message);
        }

        batch
    }

    async fn set_position(&self, position: i64) -> Result<()> {
        let position_stream = self.position_stream();
        let envelope = MessageEnvelope::builder()
            .id(MessageId::new())
            .message_type(POSITION_COMMITTED)
            .stream_name(position_stream.as_str())
            .stream_category(position_stream.as_str())
            .data(serde_json::json!({ "position": position }))
            .build();

        self.store
            .repository()
            .write_message(&envelope)
            .await
            .map_err(MessageStoreError::from)?;

        metrics::counter!("subscription_position_commits").increment(1);
        tracing::debug!(position, "committed read position");
        Ok(())
    }
}
