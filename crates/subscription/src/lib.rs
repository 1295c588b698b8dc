//! Continuous consumption of streams and categories.
//!
//! This crate provides the subscription side of the message store:
//! - [`MessageHandler`] for processing messages of one type
//! - [`SubscriptionWorker`] for the stateless operations one poll is made of
//! - [`Poller`] for the cursor and position-flush state machine
//! - [`Subscriber`] for the poll loop with graceful shutdown

pub mod config;
pub mod error;
pub mod handler;
pub mod poller;
pub mod scope;
pub mod subscriber;
pub mod worker;

pub use config::{OnError, SubscriberConfig, SubscriberConfigBuilder};
pub use error::{HandlerError, Result, SubscriberError};
pub use handler::MessageHandler;
pub use poller::Poller;
pub use scope::SubscriptionScope;
pub use subscriber::{Subscriber, SubscriberHandle};
pub use worker::{CommittedPosition, POSITION_COMMITTED, ProcessedBatch, SubscriptionWorker, Worker};
