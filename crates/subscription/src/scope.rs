//! Classification of what a subscription reads.

use message_store::{GetOptions, Message};

/// The scope a subscriber tails: one command stream, one entity stream, or
/// a whole category.
///
/// The scope decides which repository read serves the next batch and which
/// position field acts as the resume cursor: stream scopes track the
/// per-stream position, the category scope tracks the global position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionScope {
    CommandStream { category: String },
    EntityStream { category: String, entity_id: String },
    Category { category: String },
}

impl SubscriptionScope {
    /// The cursor position of a message under this scope.
    pub fn position_of(&self, message: &Message) -> i64 {
        match self {
            SubscriptionScope::CommandStream { .. } | SubscriptionScope::EntityStream { .. } => {
                message.position()
            }
            SubscriptionScope::Category { .. } => message.global_position(),
        }
    }

    /// Builds the read for the next batch at the cursor `since_position`.
    ///
    /// Reads are inclusive at the cursor for both position kinds. The
    /// poller resumes one past the last processed position, so the batch
    /// delivered is everything strictly after it; a fetch that excluded the
    /// cursor itself would silently skip the message sitting there.
    pub(crate) fn read_options(&self, since_position: i64, batch_size: i64) -> GetOptions {
        let options = GetOptions::new().batch_size(batch_size);
        match self {
            SubscriptionScope::CommandStream { category } => options
                .command_stream(category.as_str())
                .since_version(since_position),
            SubscriptionScope::EntityStream {
                category,
                entity_id,
            } => options
                .event_stream(category.as_str(), entity_id.as_str())
                .since_version(since_position),
            SubscriptionScope::Category { category } => options
                .category(category.as_str())
                .since_position(since_position),
        }
    }
}
