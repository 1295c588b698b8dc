//! Subscriber configuration and its validation.

use std::sync::Arc;
use std::time::Duration;

use crate::error::SubscriberError;
use crate::scope::SubscriptionScope;

/// Poll cadence used when none is configured.
pub const DEFAULT_POLL_TIME: Duration = Duration::from_millis(200);

/// Delay after a failed poll used when none is configured.
pub const DEFAULT_POLL_ERROR_DELAY: Duration = Duration::from_secs(5);

/// Handled-message count between position flushes used when none is
/// configured.
pub const DEFAULT_UPDATE_INTERVAL: i64 = 100;

/// Messages fetched per poll used when none is configured.
pub const DEFAULT_BATCH_SIZE: i64 = 1000;

/// Callback invoked when message processing fails.
///
/// Called synchronously on the polling task, and only for handler failures;
/// repository transport errors do not reach it.
pub type OnError = Arc<dyn Fn(&SubscriberError) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum StreamRequest {
    Command(String),
    Entity(String, String),
}

/// Validated subscriber configuration.
#[derive(Clone)]
pub struct SubscriberConfig {
    pub(crate) scope: SubscriptionScope,
    pub(crate) poll_time: Duration,
    pub(crate) poll_error_delay: Duration,
    pub(crate) update_interval: i64,
    pub(crate) batch_size: i64,
    pub(crate) on_error: Option<OnError>,
    pub(crate) span: Option<tracing::Span>,
}

impl SubscriberConfig {
    /// Creates an empty configuration builder.
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// The scope this subscriber tails.
    pub fn scope(&self) -> &SubscriptionScope {
        &self.scope
    }
}

/// Builder applying subscriber options left-to-right.
///
/// Options are recorded as given and validated as a whole by
/// [`build`](Self::build), so conflicts (both a stream and a category, two
/// streams, ...) are reported uniformly no matter the order of the calls.
#[derive(Default)]
pub struct SubscriberConfigBuilder {
    streams: Vec<StreamRequest>,
    categories: Vec<String>,
    poll_time: Option<Duration>,
    poll_error_delay: Option<Duration>,
    update_interval: Option<i64>,
    batch_size: Option<i64>,
    on_error: Option<OnError>,
    span: Option<tracing::Span>,
}

impl SubscriberConfigBuilder {
    /// Subscribes to the command stream of a category.
    pub fn command_stream(mut self, category: impl Into<String>) -> Self {
        self.streams.push(StreamRequest::Command(category.into()));
        self
    }

    /// Subscribes to the entity stream of a `(category, entityId)` pair.
    pub fn entity_stream(
        mut self,
        category: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.streams
            .push(StreamRequest::Entity(category.into(), entity_id.into()));
        self
    }

    /// Subscribes to a whole category, ordered by global position.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    /// Time to sleep between successful polls.
    pub fn poll_time(mut self, poll_time: Duration) -> Self {
        self.poll_time = Some(poll_time);
        self
    }

    /// Time to sleep after a failed poll.
    pub fn poll_error_delay(mut self, poll_error_delay: Duration) -> Self {
        self.poll_error_delay = Some(poll_error_delay);
        self
    }

    /// Flushes the read position after this many handled messages.
    pub fn update_position_every(mut self, messages: i64) -> Self {
        self.update_interval = Some(messages);
        self
    }

    /// Number of messages fetched per poll.
    pub fn batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Callback invoked when message processing fails.
    pub fn on_error(mut self, on_error: OnError) -> Self {
        self.on_error = Some(on_error);
        self
    }

    /// Span the poll loop runs inside, e.g. to tag logs with deployment
    /// metadata.
    pub fn span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Validates the applied options into a subscriber configuration.
    pub fn build(mut self) -> Result<SubscriberConfig, SubscriberError> {
        // blank scope parts count as unset
        self.streams.retain(|request| match request {
            StreamRequest::Command(category) => !category.is_empty(),
            StreamRequest::Entity(category, entity_id) => {
                !category.is_empty() && !entity_id.is_empty()
            }
        });
        self.categories.retain(|category| !category.is_empty());

        if !self.streams.is_empty() && !self.categories.is_empty() {
            return Err(SubscriberError::CannotUseBothStreamAndCategory);
        }
        if self.streams.len() > 1 {
            return Err(SubscriberError::MultipleStreams);
        }
        if self.categories.len() > 1 {
            return Err(SubscriberError::MultipleCategories);
        }

        let scope = match (self.streams.pop(), self.categories.pop()) {
            (Some(StreamRequest::Command(category)), None) => {
                SubscriptionScope::CommandStream { category }
            }
            (Some(StreamRequest::Entity(category, entity_id)), None) => {
                SubscriptionScope::EntityStream {
                    category,
                    entity_id,
                }
            }
            (None, Some(category)) => SubscriptionScope::Category { category },
            _ => return Err(SubscriberError::NeedsCategoryOrStream),
        };

        let poll_time = self.poll_time.unwrap_or(DEFAULT_POLL_TIME);
        if poll_time.is_zero() {
            return Err(SubscriberError::InvalidPollTime);
        }

        let poll_error_delay = self.poll_error_delay.unwrap_or(DEFAULT_POLL_ERROR_DELAY);
        if poll_error_delay.is_zero() {
            return Err(SubscriberError::InvalidPollErrorDelay);
        }

        let update_interval = self.update_interval.unwrap_or(DEFAULT_UPDATE_INTERVAL);
        if update_interval < 2 {
            return Err(SubscriberError::InvalidUpdateInterval);
        }

        let batch_size = self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size <= 0 {
            return Err(SubscriberError::InvalidBatchSize);
        }

        Ok(SubscriberConfig {
            scope,
            poll_time,
            poll_error_delay,
            update_interval,
            batch_size,
            on_error: self.on_error,
            span: self.span,
        })
    }
}
