use thiserror::Error;

/// Errors that can occur when interacting with the message store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The message has no ID.
    #[error("message has no id")]
    NoMessageId,

    /// The stream name is empty.
    #[error("invalid stream name")]
    InvalidStreamName,

    /// The category is empty or contains a hyphen.
    #[error("invalid category")]
    InvalidCategory,

    /// The expected position is below -1.
    #[error("invalid expected position: {0}")]
    InvalidPosition(i64),

    /// A negative batch size was requested.
    #[error("negative batch size: {0}")]
    NegativeBatchSize(i64),

    /// An append with an expected position did not match the stream head.
    #[error("version conflict on stream {stream}: expected position {expected}")]
    VersionConflict { stream: String, expected: i64 },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
