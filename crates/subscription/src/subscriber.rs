//! Long-running consumer that tails a stream or category.

use std::sync::Arc;
use std::time::Duration;

use message_store::MessageStore;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::SubscriberConfig;
use crate::error::{Result, SubscriberError};
use crate::handler::MessageHandler;
use crate::poller::Poller;
use crate::worker::SubscriptionWorker;

/// A continuously polling consumer identified by a subscriber ID.
///
/// The subscriber owns a [`Poller`] over a [`SubscriptionWorker`] and runs
/// it in a loop: sleep `poll_time` after a successful poll, sleep
/// `poll_error_delay` after a failed one. Its read position is persisted on
/// the stream `"{subscriberId}+position"`, so a restarted subscriber
/// resumes where the last position flush left off.
pub struct Subscriber {
    subscriber_id: String,
    poller: Poller<SubscriptionWorker>,
    poll_time: Duration,
    poll_error_delay: Duration,
    span: Option<tracing::Span>,
}

impl Subscriber {
    /// Creates a subscriber over a store.
    ///
    /// The subscriber ID must be non-empty and free of `-` and `+`, which
    /// are reserved by the stream-name conventions; at least one handler is
    /// required.
    pub fn new(
        store: MessageStore,
        subscriber_id: impl Into<String>,
        handlers: Vec<Arc<dyn MessageHandler>>,
        config: SubscriberConfig,
    ) -> Result<Self> {
        let subscriber_id = subscriber_id.into();
        if subscriber_id.is_empty() {
            return Err(SubscriberError::EmptySubscriberId);
        }
        if subscriber_id.contains('-') || subscriber_id.contains('+') {
            return Err(SubscriberError::InvalidSubscriberId);
        }
        if handlers.is_empty() {
            return Err(SubscriberError::NeedsAtLeastOneHandler);
        }

        let worker = SubscriptionWorker::new(
            store,
            subscriber_id.as_str(),
            config.scope.clone(),
            handlers,
            config.batch_size,
        );

        Ok(Self {
            subscriber_id,
            poller: Poller::new(worker, &config),
            poll_time: config.poll_time,
            poll_error_delay: config.poll_error_delay,
            span: config.span,
        })
    }

    /// The ID this subscriber persists its position under.
    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    /// Runs one poll cycle without entering the loop.
    pub async fn poll(&mut self) -> Result<()> {
        self.poller.poll().await
    }

    /// Spawns the poll loop and returns a handle for graceful shutdown.
    pub fn start(self) -> SubscriberHandle {
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
        let span = self.span.clone().unwrap_or_else(|| {
            tracing::info_span!("subscriber", subscriber_id = %self.subscriber_id)
        });
        let task = tokio::spawn(self.run(stop_rx).instrument(span));

        SubscriberHandle {
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }

    /// Runs the poll loop until `stop` fires (or its sender is dropped).
    ///
    /// The stop signal aborts an in-flight poll as well as the sleeps
    /// between polls; a poll cut short this way has written nothing beyond
    /// what its last completed repository call persisted.
    pub async fn run(mut self, mut stop: tokio::sync::oneshot::Receiver<()>) {
        loop {
            let result = tokio::select! {
                biased;
                _ = &mut stop => break,
                result = self.poller.poll() => result,
            };

            let delay = match result {
                Ok(()) => self.poll_time,
                Err(error) => {
                    tracing::warn!(error = %error, "poll failed");
                    self.poll_error_delay
                }
            };

            tokio::select! {
                biased;
                _ = &mut stop => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        tracing::debug!("subscriber stopped");
    }
}

/// Handle to a running subscriber.
///
/// Dropping the handle sends a best-effort stop signal. Call
/// [`stop()`](Self::stop) for graceful shutdown.
pub struct SubscriberHandle {
    stop_tx: Option<tokio::sync::oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SubscriberHandle {
    /// Stops the subscriber gracefully and waits for the loop to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Checks if the poll loop is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SubscriberHandle {
    fn drop(&mut self) {
        if self.is_running() {
            tracing::warn!("subscriber handle dropped without stop(); signaling the loop to stop");
            if let Some(tx) = self.stop_tx.take() {
                let _ = tx.send(());
            }
        }
    }
}
