//! Integration tests: write → subscribe → handle → position committed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::MessageId;
use message_store::{Command, Event, Message, MessageStore, WriteOptions};
use subscription::{
    HandlerError, MessageHandler, POSITION_COMMITTED, Subscriber, SubscriberConfig,
    SubscriberError,
};

struct RecordingHandler {
    message_type: String,
    seen: Arc<Mutex<Vec<String>>>,
    fail_on: Option<String>,
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    fn message_type(&self) -> &str {
        &self.message_type
    }

    async fn process(&self, message: &Message) -> Result<(), HandlerError> {
        let tag = match message {
            Message::Command(command) => command.data["tag"].as_str().unwrap_or("").to_string(),
            Message::Event(event) => event.data["tag"].as_str().unwrap_or("").to_string(),
            Message::Unknown(_) => return Err("unexpected message shape".into()),
        };
        if self.fail_on.as_deref() == Some(tag.as_str()) {
            return Err(format!("refusing {tag}").into());
        }
        self.seen.lock().unwrap().push(tag);
        Ok(())
    }
}

fn recording_handler(
    message_type: &str,
    fail_on: Option<&str>,
) -> (Arc<dyn MessageHandler>, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(RecordingHandler {
        message_type: message_type.to_string(),
        seen: Arc::clone(&seen),
        fail_on: fail_on.map(str::to_string),
    });
    (handler, seen)
}

async fn write_command(store: &MessageStore, tag: &str) {
    let command = Command::new(
        MessageId::new(),
        "PlaceOrder",
        "order",
        serde_json::json!({"tag": tag}),
    );
    store
        .write(&Message::Command(command), WriteOptions::new())
        .await
        .unwrap();
}

async fn write_event(store: &MessageStore, entity_id: &str, tag: &str) {
    let event = Event::new(
        MessageId::new(),
        "OrderPlaced",
        "order",
        entity_id,
        serde_json::json!({"tag": tag}),
    );
    store
        .write(&Message::Event(event), WriteOptions::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn command_stream_subscription_handles_in_order_and_commits_position() {
    let store = MessageStore::with_messages(&[]).unwrap();
    for tag in ["one", "two", "three"] {
        write_command(&store, tag).await;
    }

    let (handler, seen) = recording_handler("PlaceOrder", None);
    let config = SubscriberConfig::builder()
        .command_stream("order")
        .update_position_every(2)
        .build()
        .unwrap();
    let mut subscriber =
        Subscriber::new(store.clone(), "reporting", vec![handler], config).unwrap();

    subscriber.poll().await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["one", "two", "three"]);

    // 3 handled >= interval 2: the next cursor (stream position 3 + 1) was
    // committed to the position stream
    let record = store
        .repository()
        .get_last_message_in_stream("reporting+position")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.message_type, POSITION_COMMITTED);
    assert_eq!(record.data, serde_json::json!({"position": 4}));

    // nothing new: the next poll stays quiet
    subscriber.poll().await.unwrap();
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn category_subscription_spans_entity_streams() {
    let store = MessageStore::with_messages(&[]).unwrap();
    write_event(&store, "a", "one").await;
    write_event(&store, "b", "two").await;
    write_event(&store, "a", "three").await;

    let (handler, seen) = recording_handler("OrderPlaced", None);
    let config = SubscriberConfig::builder().category("order").build().unwrap();
    let mut subscriber = Subscriber::new(store, "reporting", vec![handler], config).unwrap();

    subscriber.poll().await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["one", "two", "three"]);
}

#[tokio::test]
async fn restarted_subscriber_resumes_from_the_committed_position() {
    let store = MessageStore::with_messages(&[]).unwrap();
    for tag in ["one", "two", "three"] {
        write_command(&store, tag).await;
    }

    let config = || {
        SubscriberConfig::builder()
            .command_stream("order")
            .update_position_every(2)
            .build()
            .unwrap()
    };

    let (handler, _) = recording_handler("PlaceOrder", None);
    let mut first =
        Subscriber::new(store.clone(), "reporting", vec![handler], config()).unwrap();
    first.poll().await.unwrap();
    drop(first);

    write_command(&store, "four").await;

    let (handler, seen) = recording_handler("PlaceOrder", None);
    let mut second =
        Subscriber::new(store.clone(), "reporting", vec![handler], config()).unwrap();
    second.poll().await.unwrap();

    // only the message written after the committed position is re-delivered
    assert_eq!(*seen.lock().unwrap(), vec!["four"]);
}

#[tokio::test]
async fn failed_messages_are_redelivered() {
    let store = MessageStore::with_messages(&[]).unwrap();
    write_command(&store, "one").await;
    write_command(&store, "boom").await;

    let (handler, seen) = recording_handler("PlaceOrder", Some("boom"));
    let config = SubscriberConfig::builder().command_stream("order").build().unwrap();
    let mut subscriber = Subscriber::new(store, "reporting", vec![handler], config).unwrap();

    let result = subscriber.poll().await;
    assert!(matches!(result, Err(SubscriberError::Handler(_))));
    assert_eq!(*seen.lock().unwrap(), vec!["one"]);

    // the failing message comes back on the next poll
    let result = subscriber.poll().await;
    assert!(matches!(result, Err(SubscriberError::Handler(_))));
    assert_eq!(*seen.lock().unwrap(), vec!["one", "one"]);
}

#[tokio::test]
async fn started_subscriber_picks_up_new_writes_until_stopped() {
    let store = MessageStore::with_messages(&[]).unwrap();
    write_command(&store, "one").await;

    let (handler, seen) = recording_handler("PlaceOrder", None);
    let config = SubscriberConfig::builder()
        .command_stream("order")
        .poll_time(Duration::from_millis(10))
        .build()
        .unwrap();
    let subscriber = Subscriber::new(store.clone(), "reporting", vec![handler], config).unwrap();

    let handle = subscriber.start();
    assert!(handle.is_running());

    tokio::time::sleep(Duration::from_millis(50)).await;
    write_command(&store, "two").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    handle.stop().await;
    assert_eq!(*seen.lock().unwrap(), vec!["one", "two"]);
}

#[tokio::test]
async fn stop_aborts_the_error_delay() {
    let store = MessageStore::with_messages(&[]).unwrap();
    write_command(&store, "boom").await;

    let (handler, _) = recording_handler("PlaceOrder", Some("boom"));
    let config = SubscriberConfig::builder()
        .command_stream("order")
        .poll_time(Duration::from_millis(10))
        .poll_error_delay(Duration::from_secs(3600))
        .build()
        .unwrap();
    let subscriber = Subscriber::new(store, "reporting", vec![handler], config).unwrap();

    let handle = subscriber.start();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // the loop is parked in the hour-long error delay; stop() returns
    // promptly anyway
    tokio::time::timeout(Duration::from_secs(1), handle.stop())
        .await
        .expect("stop did not interrupt the error delay");
}

#[tokio::test]
async fn on_error_fires_for_handler_failures() {
    let store = MessageStore::with_messages(&[]).unwrap();
    write_command(&store, "boom").await;

    let called = Arc::new(Mutex::new(false));
    let observed = Arc::clone(&called);

    let (handler, _) = recording_handler("PlaceOrder", Some("boom"));
    let config = SubscriberConfig::builder()
        .command_stream("order")
        .on_error(Arc::new(move |_error| {
            *observed.lock().unwrap() = true;
        }))
        .build()
        .unwrap();
    let mut subscriber = Subscriber::new(store, "reporting", vec![handler], config).unwrap();

    assert!(subscriber.poll().await.is_err());
    assert!(*called.lock().unwrap());
}
