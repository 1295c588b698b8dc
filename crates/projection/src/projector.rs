//! Paginated replay of an entity stream into a state value.

use message_store::{GetOptions, Message, MessageStore};

use crate::Result;
use crate::error::ProjectorError;
use crate::reducer::MessageReducer;

/// Page size used when replaying a stream.
const PAGE_SIZE: i64 = 1000;

/// Replays all messages of an entity stream and folds them through a set of
/// reducers into a state snapshot.
///
/// A projector holds no mutable state of its own; every [`run`](Self::run)
/// starts from a fresh clone of the default state, so runs are deterministic
/// and independent.
pub struct Projector<S> {
    store: MessageStore,
    reducers: Vec<Box<dyn MessageReducer<S>>>,
    default_state: S,
}

impl<S> Projector<S>
where
    S: Clone + Send + Sync,
{
    /// Creates a new projector builder over the given store.
    pub fn builder(store: MessageStore) -> ProjectorBuilder<S> {
        ProjectorBuilder {
            store,
            reducers: Vec::new(),
            default_state: None,
        }
    }

    /// Replays `"{category}-{entityId}"` and returns the folded state.
    ///
    /// Messages are fetched in pages of 1000 and dispatched in order to
    /// every reducer whose type matches, in declaration order. A failed page
    /// fetch aborts the run; partial state is discarded.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, category: &str, entity_id: &str) -> Result<S> {
        let mut state = self.default_state.clone();
        let mut since_version = 0i64;

        loop {
            let page = self
                .store
                .get(
                    GetOptions::new()
                        .event_stream(category, entity_id)
                        .since_version(since_version)
                        .batch_size(PAGE_SIZE),
                )
                .await?;

            for message in &page {
                state = self.reduce(message, state);
            }
            metrics::counter!("projector_messages_replayed").increment(page.len() as u64);

            if page.len() < PAGE_SIZE as usize {
                break;
            }
            // reads are inclusive, so resume one past the last position seen
            since_version = page[page.len() - 1].position() + 1;
        }

        Ok(state)
    }

    fn reduce(&self, message: &Message, mut state: S) -> S {
        for reducer in &self.reducers {
            if reducer.message_type() == message.message_type() {
                state = reducer.reduce(message, state);
            }
        }
        state
    }
}

/// Builder for configuring a [`Projector`].
pub struct ProjectorBuilder<S> {
    store: MessageStore,
    reducers: Vec<Box<dyn MessageReducer<S>>>,
    default_state: Option<S>,
}

impl<S> ProjectorBuilder<S>
where
    S: Clone + Send + Sync,
{
    /// Registers a reducer. Reducers run in registration order.
    pub fn with_reducer(mut self, reducer: impl MessageReducer<S> + 'static) -> Self {
        self.reducers.push(Box::new(reducer));
        self
    }

    /// Sets the state every run starts from.
    pub fn default_state(mut self, state: S) -> Self {
        self.default_state = Some(state);
        self
    }

    /// Builds the projector.
    ///
    /// Fails when no reducer was registered or no default state was set.
    pub fn build(self) -> Result<Projector<S>> {
        if self.reducers.is_empty() {
            return Err(ProjectorError::NeedsAtLeastOneReducer);
        }
        let default_state = self.default_state.ok_or(ProjectorError::DefaultStateNotSet)?;

        Ok(Projector {
            store: self.store,
            reducers: self.reducers,
            default_state,
        })
    }
}
