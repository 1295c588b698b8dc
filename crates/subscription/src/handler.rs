//! Handler trait dispatched by subscriptions.

use async_trait::async_trait;
use message_store::Message;

use crate::error::HandlerError;

/// Processes messages of a single type delivered by a subscription.
///
/// Handlers run on the polling task, one message at a time, in stream
/// order. A slow handler stalls its subscriber. Because a crash can replay
/// everything after the last committed position, handlers must be
/// idempotent.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// The message type this handler responds to.
    fn message_type(&self) -> &str;

    /// Processes one message. Returning an error halts the batch; the
    /// failing message is re-delivered on the next poll.
    async fn process(&self, message: &Message) -> Result<(), HandlerError>;
}
