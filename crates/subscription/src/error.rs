use message_store::MessageStoreError;
use thiserror::Error;

/// Error type returned by user message handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised when constructing or running a subscriber.
#[derive(Debug, Error)]
pub enum SubscriberError {
    /// The subscriber ID is empty.
    #[error("subscriber id cannot be empty")]
    EmptySubscriberId,

    /// The subscriber ID contains a `-` or `+`, which would collide with
    /// the stream-name conventions.
    #[error("subscriber id cannot contain a hyphen or plus")]
    InvalidSubscriberId,

    /// No message handlers were given.
    #[error("subscriber needs at least one message handler")]
    NeedsAtLeastOneHandler,

    /// No stream or category was subscribed to.
    #[error("subscriber needs a category or stream to subscribe to")]
    NeedsCategoryOrStream,

    /// Both a stream and a category were subscribed to.
    #[error("subscriber cannot use both a stream and a category")]
    CannotUseBothStreamAndCategory,

    /// More than one stream was subscribed to.
    #[error("subscriber cannot subscribe to multiple streams")]
    MultipleStreams,

    /// More than one category was subscribed to.
    #[error("subscriber cannot subscribe to multiple categories")]
    MultipleCategories,

    /// The poll time is zero.
    #[error("poll time must be greater than zero")]
    InvalidPollTime,

    /// The poll error delay is zero.
    #[error("poll error delay must be greater than zero")]
    InvalidPollErrorDelay,

    /// The position update interval is below two.
    #[error("position update interval cannot be less than two")]
    InvalidUpdateInterval,

    /// The batch size is zero or negative.
    #[error("batch size must be greater than zero")]
    InvalidBatchSize,

    /// The position stream carried a record that could not be decoded.
    #[error("malformed position record: {0}")]
    MalformedPosition(#[source] serde_json::Error),

    /// A message handler failed while processing a message.
    #[error("message handler failed: {0}")]
    Handler(HandlerError),

    /// The message store failed; transport errors pass through unchanged.
    #[error(transparent)]
    Store(#[from] MessageStoreError),
}

/// Result type for subscriber operations.
pub type Result<T> = std::result::Result<T, SubscriberError>;
