#![allow(dead_code)]

use async_trait::async_trait;
use chat_sync::adapters::chat_service::ChatBackend;
use chat_sync::adapters::realtime::RealtimeTransport;
use chat_sync::adapters::realtime::memory::MemoryTransport;
use chat_sync::common::context::Context;
use chat_sync::entities::channels::{ChannelName, NEW_MESSAGE_EVENT};
use chat_sync::entities::messages::{Message, NewMessage};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

pub const CREATED_AT: &str = "2024-01-15 13:05:00";

pub fn counterparty(id: i64, conversation_id: i64, text: &str) -> Message {
    Message {
        id,
        service_id: conversation_id,
        message: text.to_string(),
        from_counterparty: true,
        provider_name: Some("Ana".to_string()),
        created_at: CREATED_AT.to_string(),
    }
}

pub fn own(id: i64, conversation_id: i64, text: &str) -> Message {
    Message {
        id,
        service_id: conversation_id,
        message: text.to_string(),
        from_counterparty: false,
        provider_name: None,
        created_at: CREATED_AT.to_string(),
    }
}

/// Keeps a backend call suspended until [`Hold::release`] is called.
pub struct Hold(oneshot::Sender<()>);

impl Hold {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

#[derive(Default)]
pub struct FakeBackend {
    histories: Mutex<Vec<(i64, Vec<Message>)>>,
    history_hold: Mutex<Option<oneshot::Receiver<()>>>,
    send_hold: Mutex<Option<oneshot::Receiver<()>>>,
    fail_history: Mutex<bool>,
    fail_send: Mutex<bool>,
    next_id: AtomicI64,
    pub get_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
    pub sent: Mutex<Vec<NewMessage>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1000),
            ..Default::default()
        }
    }

    pub fn set_history(&self, conversation_id: i64, messages: Vec<Message>) {
        let mut histories = self.histories.lock().unwrap();
        histories.retain(|(id, _)| *id != conversation_id);
        histories.push((conversation_id, messages));
    }

    pub fn fail_history(&self, fail: bool) {
        *self.fail_history.lock().unwrap() = fail;
    }

    pub fn fail_send(&self, fail: bool) {
        *self.fail_send.lock().unwrap() = fail;
    }

    pub fn hold_history(&self) -> Hold {
        let (tx, rx) = oneshot::channel();
        *self.history_hold.lock().unwrap() = Some(rx);
        Hold(tx)
    }

    pub fn hold_send(&self) -> Hold {
        let (tx, rx) = oneshot::channel();
        *self.send_hold.lock().unwrap() = Some(rx);
        Hold(tx)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn get_messages(&self, conversation_id: i64) -> anyhow::Result<Vec<Message>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        // a held call answers with the history as it was when the call arrived
        let history = self
            .histories
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| *id == conversation_id)
            .map(|(_, messages)| messages.clone())
            .unwrap_or_default();
        let hold = self.history_hold.lock().unwrap().take();
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        if *self.fail_history.lock().unwrap() {
            anyhow::bail!("chat service unavailable");
        }
        Ok(history)
    }

    async fn send_message(&self, message: &NewMessage) -> anyhow::Result<Message> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(message.clone());
        let hold = self.send_hold.lock().unwrap().take();
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        if *self.fail_send.lock().unwrap() {
            anyhow::bail!("chat service rejected the message");
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(own(id, message.service_id, &message.message))
    }
}

pub struct TestContext {
    pub backend: Arc<FakeBackend>,
    pub transport: MemoryTransport,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            backend: Arc::new(FakeBackend::new()),
            transport: MemoryTransport::new(),
        }
    }

    /// Publishes a `new-message` event on the conversation channel.
    pub fn push(&self, message: &Message) -> usize {
        let channel = ChannelName::for_conversation(message.service_id).to_string();
        self.transport.publish(
            &channel,
            NEW_MESSAGE_EVENT,
            serde_json::json!({ "message": message }),
        )
    }
}

impl Context for TestContext {
    fn backend(&self) -> &dyn ChatBackend {
        self.backend.as_ref()
    }

    fn transport(&self) -> &dyn RealtimeTransport {
        &self.transport
    }
}

/// Polls `condition` until it holds, failing the test after a second.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

/// Gives spawned tasks a chance to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
