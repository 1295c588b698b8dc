use std::sync::Arc;

use common::stream;
use repository::MessageEnvelope;

use crate::error::{MessageError, MessageStoreError};
use crate::message::Message;

/// Default number of messages fetched per read.
pub const DEFAULT_BATCH_SIZE: i64 = 1000;

/// Converts a stored envelope into a message ahead of the built-in
/// classification. Converters are tried in registration order; the first
/// one that succeeds wins.
pub type MessageConverter =
    Arc<dyn Fn(&MessageEnvelope) -> Result<Message, MessageError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScopeRequest {
    CommandStream(String),
    EntityStream(String, String),
    Category(String),
}

/// Declarative query parameters for [`MessageStore::get`].
///
/// Options are applied left-to-right and validated as a whole when the get
/// runs, so conflicting scopes are reported uniformly. Exactly one scope —
/// a command stream, an entity stream, or a category — is required.
///
/// [`MessageStore::get`]: crate::MessageStore::get
#[derive(Clone, Default)]
pub struct GetOptions {
    scopes: Vec<ScopeRequest>,
    since_version: Option<i64>,
    since_position: Option<i64>,
    batch_size: Option<i64>,
    converters: Vec<MessageConverter>,
}

impl GetOptions {
    /// Creates an empty set of options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads from the command stream of a category.
    pub fn command_stream(mut self, category: impl Into<String>) -> Self {
        self.scopes.push(ScopeRequest::CommandStream(category.into()));
        self
    }

    /// Reads from the entity stream of a `(category, entityId)` pair.
    pub fn event_stream(
        mut self,
        category: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.scopes
            .push(ScopeRequest::EntityStream(category.into(), entity_id.into()));
        self
    }

    /// Reads across all streams of a category, ordered by global position.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.scopes.push(ScopeRequest::Category(category.into()));
        self
    }

    /// Starts the read at this stream position (inclusive). Stream scopes
    /// only.
    pub fn since_version(mut self, version: i64) -> Self {
        self.since_version = Some(version);
        self
    }

    /// Starts the read at this global position (inclusive). Category scope
    /// only.
    pub fn since_position(mut self, position: i64) -> Self {
        self.since_position = Some(position);
        self
    }

    /// Limits the number of messages returned. Defaults to
    /// [`DEFAULT_BATCH_SIZE`].
    pub fn batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Registers a converter tried before the built-in classification.
    pub fn converter(mut self, converter: MessageConverter) -> Self {
        self.converters.push(converter);
        self
    }

    /// Validates the applied options into a resolved read configuration.
    pub(crate) fn resolve(self) -> Result<GetConfig, MessageStoreError> {
        let mut streams = Vec::new();
        let mut categories = Vec::new();

        for scope in &self.scopes {
            match scope {
                ScopeRequest::CommandStream(category) if !category.is_empty() => {
                    streams.push(stream::command_stream(category));
                }
                ScopeRequest::EntityStream(category, entity_id)
                    if !category.is_empty() && !entity_id.is_empty() =>
                {
                    streams.push(stream::entity_stream(category, entity_id));
                }
                ScopeRequest::Category(category) if !category.is_empty() => {
                    categories.push(category.clone());
                }
                // blank scope parts count as unset
                _ => {}
            }
        }

        if !streams.is_empty() && !categories.is_empty() {
            return Err(MessageStoreError::CannotUseBothStreamAndCategory);
        }
        if streams.len() > 1 || categories.len() > 1 {
            return Err(MessageStoreError::MultipleScopes);
        }

        let scope = match (streams.pop(), categories.pop()) {
            (Some(stream_name), None) => ReadScope::Stream(stream_name),
            (None, Some(category)) => ReadScope::Category(category),
            _ => return Err(MessageStoreError::NeedsStreamOrCategory),
        };

        if self.since_version.is_some() && matches!(scope, ReadScope::Category(_)) {
            return Err(MessageStoreError::SinceVersionRequiresStream);
        }
        if self.since_position.is_some() && matches!(scope, ReadScope::Stream(_)) {
            return Err(MessageStoreError::SincePositionRequiresCategory);
        }

        let batch_size = self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size <= 0 {
            return Err(MessageStoreError::InvalidBatchSize);
        }

        Ok(GetConfig {
            scope,
            since_version: self.since_version,
            since_position: self.since_position,
            batch_size,
            converters: self.converters,
        })
    }
}

/// The single read scope a get resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReadScope {
    Stream(String),
    Category(String),
}

/// Validated read configuration produced by [`GetOptions::resolve`].
pub(crate) struct GetConfig {
    pub scope: ReadScope,
    pub since_version: Option<i64>,
    pub since_position: Option<i64>,
    pub batch_size: i64,
    pub converters: Vec<MessageConverter>,
}

/// Declarative append parameters for [`MessageStore::write`].
///
/// [`MessageStore::write`]: crate::MessageStore::write
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Expected stream position for optimistic concurrency: `-1` means any,
    /// `0` means the stream must be empty, a positive value must match the
    /// stream head exactly.
    pub expected_position: Option<i64>,
}

impl WriteOptions {
    /// Creates options with no concurrency check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stream head at a specific position.
    pub fn at_position(position: i64) -> Self {
        Self {
            expected_position: Some(position),
        }
    }
}
