//! Shared identifier types and stream-name conventions.

pub mod stream;
pub mod types;

pub use types::MessageId;
