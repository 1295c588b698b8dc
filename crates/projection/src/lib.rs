//! Reducer-driven replay of entity streams.
//!
//! This crate provides the one-shot query side of the message store:
//! - [`MessageReducer`] for folding messages of one type into state
//! - [`Projector`] for paginated replay of an entity stream into a state
//!   snapshot

pub mod error;
pub mod projector;
pub mod reducer;

pub use error::{ProjectorError, Result};
pub use projector::{Projector, ProjectorBuilder};
pub use reducer::{FnReducer, MessageReducer};
