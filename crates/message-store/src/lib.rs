pub mod error;
pub mod message;
pub mod options;
pub mod store;

pub use common::MessageId;
pub use error::{MessageError, MessageStoreError, Result};
pub use message::{Command, Event, Message};
pub use options::{DEFAULT_BATCH_SIZE, GetOptions, MessageConverter, WriteOptions};
pub use repository::{MessageEnvelope, Metadata};
pub use store::MessageStore;
