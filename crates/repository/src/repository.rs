use async_trait::async_trait;

use crate::{MessageEnvelope, RepositoryError, Result};

/// Expected position accepted by
/// [`Repository::write_message_with_expected_position`] that disables the
/// optimistic concurrency check.
pub const ANY_POSITION: i64 = -1;

/// Abstract append-only message log.
///
/// The log is dumb: it appends envelopes and serves ordered reads by stream
/// or by category. All client semantics (validation, classification,
/// subscriptions, projections) live above this port.
///
/// All reads return an empty sequence when nothing matches. Every method is
/// a plain future, so an in-flight call is aborted by dropping it; callers
/// that need prompt cancellation race the call against their shutdown
/// signal.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Appends a message to its stream.
    async fn write_message(&self, message: &MessageEnvelope) -> Result<()>;

    /// Appends a message, failing with [`RepositoryError::VersionConflict`]
    /// unless the stream head matches `expected_position`.
    ///
    /// `-1` disables the check, `0` requires an empty stream, any other
    /// positive value must equal the position of the last message in the
    /// stream.
    async fn write_message_with_expected_position(
        &self,
        message: &MessageEnvelope,
        expected_position: i64,
    ) -> Result<()>;

    /// Reads up to `batch_size` messages from a stream, oldest first.
    async fn get_all_messages_in_stream(
        &self,
        stream_name: &str,
        batch_size: i64,
    ) -> Result<Vec<MessageEnvelope>>;

    /// Reads up to `batch_size` messages from a stream with
    /// `position >= since_version`, oldest first.
    async fn get_all_messages_in_stream_since(
        &self,
        stream_name: &str,
        since_version: i64,
        batch_size: i64,
    ) -> Result<Vec<MessageEnvelope>>;

    /// Reads up to `batch_size` messages across all streams of a category,
    /// ordered by global position.
    async fn get_all_messages_in_category(
        &self,
        category: &str,
        batch_size: i64,
    ) -> Result<Vec<MessageEnvelope>>;

    /// Reads up to `batch_size` messages across all streams of a category
    /// with `global_position >= since_global_position`.
    async fn get_all_messages_in_category_since(
        &self,
        category: &str,
        since_global_position: i64,
        batch_size: i64,
    ) -> Result<Vec<MessageEnvelope>>;

    /// Reads the last message in a stream, or `None` if the stream is empty.
    async fn get_last_message_in_stream(
        &self,
        stream_name: &str,
    ) -> Result<Option<MessageEnvelope>>;
}

/// Validates an envelope before it is written.
pub fn validate_envelope_for_write(message: &MessageEnvelope) -> Result<()> {
    if message.id.is_nil() {
        return Err(RepositoryError::NoMessageId);
    }
    if message.stream_name.is_empty() {
        return Err(RepositoryError::InvalidStreamName);
    }
    Ok(())
}

/// Validates an expected position before it is used in an append.
pub fn validate_expected_position(expected_position: i64) -> Result<()> {
    if expected_position < ANY_POSITION {
        return Err(RepositoryError::InvalidPosition(expected_position));
    }
    Ok(())
}

/// Validates the arguments of a stream read.
pub(crate) fn validate_stream_read(stream_name: &str, batch_size: i64) -> Result<()> {
    if stream_name.is_empty() {
        return Err(RepositoryError::InvalidStreamName);
    }
    if batch_size < 0 {
        return Err(RepositoryError::NegativeBatchSize(batch_size));
    }
    Ok(())
}

/// Validates the arguments of a category read.
///
/// Categories may not contain a hyphen; a hyphen would make the category
/// portion of entity stream names ambiguous.
pub(crate) fn validate_category_read(category: &str, batch_size: i64) -> Result<()> {
    if category.is_empty() || category.contains('-') {
        return Err(RepositoryError::InvalidCategory);
    }
    if batch_size < 0 {
        return Err(RepositoryError::NegativeBatchSize(batch_size));
    }
    Ok(())
}
