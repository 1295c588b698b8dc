//! Reducer trait for folding messages into projected state.

use message_store::Message;

/// Folds messages of a single type into projected state.
///
/// Reducers are pure: `reduce` takes the state by value and returns the next
/// state. Taking state by value is what guarantees two projector runs never
/// share a mutable reference to the default state.
pub trait MessageReducer<S>: Send + Sync {
    /// The message type this reducer responds to.
    fn message_type(&self) -> &str;

    /// Folds one message into the state.
    fn reduce(&self, message: &Message, state: S) -> S;
}

/// A reducer backed by a plain function or closure.
pub struct FnReducer<S, F>
where
    F: Fn(&Message, S) -> S + Send + Sync,
{
    message_type: String,
    reduce: F,
    _state: std::marker::PhantomData<fn(S) -> S>,
}

impl<S, F> FnReducer<S, F>
where
    F: Fn(&Message, S) -> S + Send + Sync,
{
    /// Creates a reducer for `message_type` from a function.
    pub fn new(message_type: impl Into<String>, reduce: F) -> Self {
        Self {
            message_type: message_type.into(),
            reduce,
            _state: std::marker::PhantomData,
        }
    }
}

impl<S, F> MessageReducer<S> for FnReducer<S, F>
where
    F: Fn(&Message, S) -> S + Send + Sync,
{
    fn message_type(&self) -> &str {
        &self.message_type
    }

    fn reduce(&self, message: &Message, state: S) -> S {
        (self.reduce)(message, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MessageId;
    use message_store::Event;
    use serde_json::json;

    #[test]
    fn fn_reducer_folds_matching_messages() {
        let reducer = FnReducer::new("OrderPlaced", |_message: &Message, state: u32| state + 1);
        assert_eq!(reducer.message_type(), "OrderPlaced");

        let message = Message::Event(Event::new(
            MessageId::new(),
            "OrderPlaced",
            "order",
            "a",
            json!({}),
        ));
        let state = reducer.reduce(&message, 0);
        assert_eq!(state, 1);
    }
}
