use std::sync::Arc;

use repository::{InMemoryRepository, MessageEnvelope, PostgresRepository, Repository};
use sqlx::PgPool;

use crate::Result;
use crate::message::Message;
use crate::options::{GetOptions, MessageConverter, ReadScope, WriteOptions};

/// Client over the message log.
///
/// Producers append commands and events through [`write`](Self::write);
/// consumers read streams and categories through [`get`](Self::get). The
/// projection and subscription crates build their replay and poll loops on
/// top of this client.
#[derive(Clone)]
pub struct MessageStore {
    repository: Arc<dyn Repository>,
}

impl MessageStore {
    /// Creates a message store over an injected repository.
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Creates a message store backed by PostgreSQL.
    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(Arc::new(PostgresRepository::new(pool)))
    }

    /// Creates an in-memory message store seeded with the given messages.
    ///
    /// Intended for tests; every message is validated on the way in.
    pub fn with_messages(messages: &[Message]) -> Result<Self> {
        let envelopes = messages
            .iter()
            .map(Message::to_envelope)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(Arc::new(InMemoryRepository::with_messages(
            envelopes,
        ))))
    }

    /// The underlying repository handle.
    pub fn repository(&self) -> Arc<dyn Repository> {
        Arc::clone(&self.repository)
    }

    /// Validates a message and appends it to its stream.
    ///
    /// When `options` carries an expected position the append uses the
    /// store's optimistic concurrency check and fails with a version
    /// conflict if the stream head has moved.
    #[tracing::instrument(skip(self, message, options), fields(message_type = message.message_type()))]
    pub async fn write(&self, message: &Message, options: WriteOptions) -> Result<()> {
        let envelope = message.to_envelope()?;

        match options.expected_position {
            Some(position) => {
                self.repository
                    .write_message_with_expected_position(&envelope, position)
                    .await?;
            }
            None => self.repository.write_message(&envelope).await?,
        }

        metrics::counter!("message_store_writes").increment(1);
        Ok(())
    }

    /// Reads messages from the scope described by `options`.
    ///
    /// Returns an empty vector when nothing matches.
    #[tracing::instrument(skip(self, options))]
    pub async fn get(&self, options: GetOptions) -> Result<Vec<Message>> {
        let config = options.resolve()?;

        let envelopes = match &config.scope {
            ReadScope::Stream(stream_name) => match config.since_version {
                Some(since) => {
                    self.repository
                        .get_all_messages_in_stream_since(stream_name, since, config.batch_size)
                        .await?
                }
                None => {
                    self.repository
                        .get_all_messages_in_stream(stream_name, config.batch_size)
                        .await?
                }
            },
            ReadScope::Category(category) => match config.since_position {
                Some(since) => {
                    self.repository
                        .get_all_messages_in_category_since(category, since, config.batch_size)
                        .await?
                }
                None => {
                    self.repository
                        .get_all_messages_in_category(category, config.batch_size)
                        .await?
                }
            },
        };

        Ok(envelopes
            .iter()
            .map(|envelope| convert(envelope, &config.converters))
            .collect())
    }
}

fn convert(envelope: &MessageEnvelope, converters: &[MessageConverter]) -> Message {
    for converter in converters {
        if let Ok(message) = converter(envelope) {
            return message;
        }
    }
    Message::from_envelope(envelope)
}
