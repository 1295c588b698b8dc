//! The poll state machine wrapped around a subscription worker.

use crate::config::{OnError, SubscriberConfig};
use crate::error::Result;
use crate::worker::Worker;

/// Drives one subscription: fetch a batch, dispatch it, and flush the read
/// position every `update_interval` handled messages.
///
/// The poller owns three pieces of state across polls: the resume cursor
/// (`current_position`), the handled-message count since the last
/// successful position flush, and the next position a flush would record.
/// The cursor is loaded from the position stream on the first poll of a
/// session.
///
/// The position flush trades durability for throughput: a crash replays at
/// most `update_interval - 1` handled messages, which is why handlers must
/// be idempotent.
pub struct Poller<W: Worker> {
    worker: W,
    update_interval: i64,
    on_error: Option<OnError>,
    current_position: i64,
    position_initialized: bool,
    messages_since_last_write: i64,
    last_known_position: i64,
}

impl<W: Worker> Poller<W> {
    /// Creates a poller over a worker, taking its cadence from `config`.
    pub fn new(worker: W, config: &SubscriberConfig) -> Self {
        Self {
            worker,
            update_interval: config.update_interval,
            on_error: config.on_error.clone(),
            current_position: 0,
            position_initialized: false,
            messages_since_last_write: 0,
            last_known_position: 0,
        }
    }

    /// Runs one poll cycle.
    ///
    /// Worker failures are returned as-is and leave the poller state
    /// untouched, so the next poll retries from the same cursor. Handler
    /// failures are additionally reported to the configured error callback;
    /// repository failures are not.
    #[tracing::instrument(skip(self), fields(position = self.current_position))]
    pub async fn poll(&mut self) -> Result<()> {
        if !self.position_initialized {
            let position = self.worker.get_position().await?;
            self.current_position = position;
            self.last_known_position = position;
            self.position_initialized = true;
        }

        let messages = self.worker.get_messages(self.current_position).await?;
        let batch = self.worker.process_messages(&messages).await;

        if let Some(error) = batch.error {
            // The failed tail of the batch is re-fetched and re-counted on
            // the next poll, so neither the cursor nor the flush counter
            // moves here.
            if let Some(on_error) = &self.on_error {
                on_error(&error);
            }
            return Err(error);
        }

        self.messages_since_last_write += batch.handled as i64;
        if batch.last_position > 0 {
            self.last_known_position = batch.last_position + 1;
        }
        self.current_position = self.last_known_position;

        if self.messages_since_last_write >= self.update_interval {
            self.worker.set_position(self.last_known_position).await?;
            self.messages_since_last_write = 0;
        }

        Ok(())
    }
}
