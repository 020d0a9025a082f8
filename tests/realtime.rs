mod common;

use chat_sync::adapters::realtime::memory::TransportOp;
use chat_sync::common::error::AppError;
use chat_sync::models::messages::Message;
use chat_sync::usecases::realtime::RealtimeSubscriber;
use common::{TestContext, counterparty, eventually, own, settle};
use std::sync::{Arc, Mutex};

fn recorder() -> (Arc<Mutex<Vec<Message>>>, impl Fn(Message) + Send + Sync + 'static) {
    let received = Arc::new(Mutex::new(vec![]));
    let sink = received.clone();
    (received, move |message| sink.lock().unwrap().push(message))
}

#[tokio::test]
async fn counterparty_messages_are_delivered_once_and_echoes_dropped() {
    let ctx = TestContext::new();
    let mut subscriber = RealtimeSubscriber::new();
    let (received, on_message) = recorder();

    subscriber.subscribe(&ctx, 5, on_message).await.unwrap();
    assert_eq!(subscriber.channel_name(), Some("chat5"));

    assert_eq!(ctx.push(&own(1, 5, "echo")), 1);
    assert_eq!(ctx.push(&counterparty(2, 5, "hello")), 1);
    eventually(|| received.lock().unwrap().len() == 1).await;
    settle().await;

    let received = received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].message_id, 2);
    assert_eq!(received[0].content, "hello");
}

#[tokio::test]
async fn other_events_and_garbage_are_ignored() {
    let ctx = TestContext::new();
    let mut subscriber = RealtimeSubscriber::new();
    let (received, on_message) = recorder();
    subscriber.subscribe(&ctx, 5, on_message).await.unwrap();

    ctx.transport
        .publish("chat5", "typing", serde_json::json!({"message": counterparty(1, 5, "x")}));
    ctx.transport
        .publish("chat5", "new-message", serde_json::json!({"unexpected": true}));
    ctx.push(&counterparty(3, 5, "real"));

    eventually(|| received.lock().unwrap().len() == 1).await;
    settle().await;
    assert_eq!(received.lock().unwrap().len(), 1);
    assert!(subscriber.is_subscribed());
}

#[tokio::test]
async fn switching_closes_the_old_channel_before_opening_the_new_one() {
    let ctx = TestContext::new();
    let mut subscriber = RealtimeSubscriber::new();
    let (received, on_message) = recorder();
    subscriber.subscribe(&ctx, 1, on_message).await.unwrap();

    let (received_b, on_message_b) = recorder();
    subscriber.subscribe(&ctx, 2, on_message_b).await.unwrap();

    assert_eq!(
        ctx.transport.ops(),
        vec![
            TransportOp::Subscribed("chat1".to_string()),
            TransportOp::Unsubscribed("chat1".to_string()),
            TransportOp::Subscribed("chat2".to_string()),
        ]
    );
    assert_eq!(ctx.transport.subscriber_count("chat1"), 0);
    assert_eq!(ctx.transport.subscriber_count("chat2"), 1);

    assert_eq!(ctx.push(&counterparty(10, 1, "late from A")), 0);
    ctx.push(&counterparty(11, 2, "from B"));
    eventually(|| received_b.lock().unwrap().len() == 1).await;
    settle().await;

    assert!(received.lock().unwrap().is_empty());
    assert_eq!(received_b.lock().unwrap()[0].message_id, 11);
}

#[tokio::test]
async fn unsubscribe_stops_delivery() {
    let ctx = TestContext::new();
    let mut subscriber = RealtimeSubscriber::new();
    let (received, on_message) = recorder();
    subscriber.subscribe(&ctx, 5, on_message).await.unwrap();

    subscriber.unsubscribe().await;
    assert!(!subscriber.is_subscribed());
    assert_eq!(ctx.push(&counterparty(1, 5, "nobody listening")), 0);
    settle().await;
    assert!(received.lock().unwrap().is_empty());

    // a second unsubscribe is harmless
    subscriber.unsubscribe().await;
}

#[tokio::test]
async fn transport_failures_surface_as_subscription_errors() {
    let ctx = TestContext::new();
    ctx.transport.fail_subscribes(1);
    let mut subscriber = RealtimeSubscriber::new();
    let (_received, on_message) = recorder();

    let result = subscriber.subscribe(&ctx, 5, on_message).await;

    assert_eq!(result, Err(AppError::SubscriptionError));
    assert!(!subscriber.is_subscribed());
}

#[tokio::test]
async fn a_panicking_handler_does_not_stop_later_deliveries() {
    let ctx = TestContext::new();
    let mut subscriber = RealtimeSubscriber::new();
    let (received, record) = recorder();
    subscriber
        .subscribe(&ctx, 5, move |message| {
            if message.content == "boom" {
                panic!("handler bug");
            }
            record(message);
        })
        .await
        .unwrap();

    ctx.push(&counterparty(1, 5, "boom"));
    ctx.push(&counterparty(2, 5, "still listening"));
    eventually(|| received.lock().unwrap().len() == 1).await;

    assert_eq!(received.lock().unwrap()[0].message_id, 2);
    subscriber.unsubscribe().await;
    assert!(!subscriber.is_subscribed());
}
