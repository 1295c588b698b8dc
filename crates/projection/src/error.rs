//! Projector error types.

use thiserror::Error;

/// Errors that can occur when building or running a projector.
#[derive(Debug, Error)]
pub enum ProjectorError {
    /// A projector was built without any reducers.
    #[error("projector needs at least one reducer")]
    NeedsAtLeastOneReducer,

    /// A projector was built without a default state.
    #[error("projector default state is not set")]
    DefaultStateNotSet,

    /// The message store failed while fetching a page.
    #[error(transparent)]
    Store(#[from] message_store::MessageStoreError),
}

/// Result type for projector operations.
pub type Result<T> = std::result::Result<T, ProjectorError>;
