use async_trait::async_trait;
use common::{MessageId, stream};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    MessageEnvelope, Metadata, RepositoryError, Result,
    repository::{
        Repository, validate_category_read, validate_envelope_for_write,
        validate_expected_position, validate_stream_read,
    },
};

/// PostgreSQL-backed repository implementation.
///
/// Talks to the message store schema through its stored functions
/// (`write_message`, `get_stream_messages`, `get_category_messages`,
/// `get_last_message`); the schema itself is owned by the database, not by
/// this crate.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new PostgreSQL repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_envelope(row: PgRow) -> Result<MessageEnvelope> {
        let stream_name: String = row.try_get("stream_name")?;
        let stream_category = stream::category_of(&stream_name).to_string();
        let metadata_json: serde_json::Value = row.try_get("metadata")?;
        let metadata = if metadata_json.is_null() {
            Metadata::default()
        } else {
            serde_json::from_value(metadata_json)?
        };

        Ok(MessageEnvelope {
            global_position: row.try_get("global_position")?,
            position: row.try_get("position")?,
            id: MessageId::from_uuid(row.try_get::<Uuid, _>("id")?),
            message_type: row.try_get("type")?,
            stream_name,
            stream_category,
            data: row.try_get("data")?,
            metadata,
            time: row.try_get("time")?,
        })
    }

    fn metadata_json(message: &MessageEnvelope) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(&message.metadata)?)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn write_message(&self, message: &MessageEnvelope) -> Result<()> {
        validate_envelope_for_write(message)?;

        sqlx::query("SELECT write_message($1, $2, $3, $4, $5)")
            .bind(message.id.as_uuid())
            .bind(&message.stream_name)
            .bind(&message.message_type)
            .bind(&message.data)
            .bind(Self::metadata_json(message)?)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn write_message_with_expected_position(
        &self,
        message: &MessageEnvelope,
        expected_position: i64,
    ) -> Result<()> {
        validate_envelope_for_write(message)?;
        validate_expected_position(expected_position)?;

        sqlx::query("SELECT write_message($1, $2, $3, $4, $5, $6)")
            .bind(message.id.as_uuid())
            .bind(&message.stream_name)
            .bind(&message.message_type)
            .bind(&message.data)
            .bind(Self::metadata_json(message)?)
            .bind(expected_position)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                // The stored function raises when the stream head has moved.
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.message().contains("Wrong expected version")
                {
                    return RepositoryError::VersionConflict {
                        stream: message.stream_name.clone(),
                        expected: expected_position,
                    };
                }
                RepositoryError::Database(e)
            })?;

        Ok(())
    }

    async fn get_all_messages_in_stream(
        &self,
        stream_name: &str,
        batch_size: i64,
    ) -> Result<Vec<MessageEnvelope>> {
        self.get_all_messages_in_stream_since(stream_name, 0, batch_size)
            .await
    }

    async fn get_all_messages_in_stream_since(
        &self,
        stream_name: &str,
        since_version: i64,
        batch_size: i64,
    ) -> Result<Vec<MessageEnvelope>> {
        validate_stream_read(stream_name, batch_size)?;

        let rows = sqlx::query(
            r#"
            SELECT id, stream_name, type, position, global_position, data, metadata, time
            FROM get_stream_messages($1, $2, $3)
            "#,
        )
        .bind(stream_name)
        .bind(since_version)
        .bind(batch_size)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_envelope).collect()
    }

    async fn get_all_messages_in_category(
        &self,
        category: &str,
        batch_size: i64,
    ) -> Result<Vec<MessageEnvelope>> {
        self.get_all_messages_in_category_since(category, 0, batch_size)
            .await
    }

    async fn get_all_messages_in_category_since(
        &self,
        category: &str,
        since_global_position: i64,
        batch_size: i64,
    ) -> Result<Vec<MessageEnvelope>> {
        validate_category_read(category, batch_size)?;

        let rows = sqlx::query(
            r#"
            SELECT id, stream_name, type, position, global_position, data, metadata, time
            FROM get_category_messages($1, $2, $3)
            "#,
        )
        .bind(category)
        .bind(since_global_position)
        .bind(batch_size)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_envelope).collect()
    }

    async fn get_last_message_in_stream(
        &self,
        stream_name: &str,
    ) -> Result<Option<MessageEnvelope>> {
        if stream_name.is_empty() {
            return Err(RepositoryError::InvalidStreamName);
        }

        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, stream_name, type, position, global_position, data, metadata, time
            FROM get_last_message($1)
            "#,
        )
        .bind(stream_name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_envelope).transpose()
    }
}
