use repository::RepositoryError;
use thiserror::Error;

/// Producer-side validation errors raised before anything touches the log.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The message has no type tag.
    #[error("message is missing a type")]
    MissingType,

    /// The message has no category.
    #[error("message is missing a category")]
    MissingCategory,

    /// The category contains a hyphen, which would make entity stream names
    /// ambiguous.
    #[error("message category cannot contain a hyphen")]
    InvalidCategory,

    /// The message has a nil ID.
    #[error("message is missing an id")]
    MissingId,

    /// The event has no entity ID.
    #[error("event is missing an entity id")]
    MissingEntityId,

    /// The message has no data payload.
    #[error("message is missing data")]
    MissingData,

    /// The data payload could not be serialized to JSON.
    #[error("message data cannot be serialized: {0}")]
    UnserializableData(#[source] serde_json::Error),
}

/// Errors surfaced by [`MessageStore`](crate::MessageStore) operations.
#[derive(Debug, Error)]
pub enum MessageStoreError {
    /// A producer message failed validation.
    #[error(transparent)]
    Message(#[from] MessageError),

    /// The repository failed; transport errors pass through unchanged.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A get was issued without a stream or category scope.
    #[error("get requires a stream or a category")]
    NeedsStreamOrCategory,

    /// A get named both a stream and a category.
    #[error("get cannot use both a stream and a category")]
    CannotUseBothStreamAndCategory,

    /// A get named more than one stream or more than one category.
    #[error("get accepts exactly one stream or category scope")]
    MultipleScopes,

    /// The requested batch size was zero or negative.
    #[error("batch size must be greater than zero")]
    InvalidBatchSize,

    /// `since_version` only applies to stream reads.
    #[error("since_version only applies to stream reads")]
    SinceVersionRequiresStream,

    /// `since_position` only applies to category reads.
    #[error("since_position only applies to category reads")]
    SincePositionRequiresCategory,
}

/// Result type for message store operations.
pub type Result<T> = std::result::Result<T, MessageStoreError>;
