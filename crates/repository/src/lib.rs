pub mod envelope;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use common::MessageId;
pub use envelope::{MessageEnvelope, MessageEnvelopeBuilder, Metadata};
pub use error::{RepositoryError, Result};
pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
pub use repository::{ANY_POSITION, Repository, validate_envelope_for_write};
