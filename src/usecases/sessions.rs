use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult};
use crate::common::sync::lock;
use crate::models::messages::Message;
use crate::repositories::messages::MessageStore;
use crate::usecases::history;
use crate::usecases::outbound::OutboundSender;
use crate::usecases::realtime::RealtimeSubscriber;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What happened to a message handed to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Appended,
    /// Held back until the history load in flight completes.
    Queued,
    Duplicate,
    /// The session was deactivated or switched conversation since.
    Discarded,
}

struct SyncState {
    conversation_id: i64,
    generation: u64,
    active: bool,
    loads_in_flight: usize,
    /// Sequence handed to the latest load started, and to the latest one
    /// whose history was installed.
    load_seq: u64,
    applied_load_seq: u64,
    pending: Vec<Message>,
}

/// Serializes every mutation of the store coming from history loads,
/// realtime events and confirmed sends.
struct SyncGate {
    state: Mutex<SyncState>,
    store: MessageStore,
}

impl SyncGate {
    fn admit(&self, generation: u64, message: Message) -> Admission {
        let mut state = lock(&self.state);
        if !state.active || state.generation != generation {
            return Admission::Discarded;
        }
        if state.loads_in_flight > 0 {
            state.pending.push(message);
            return Admission::Queued;
        }
        match self.store.append_unique(message) {
            true => Admission::Appended,
            false => Admission::Duplicate,
        }
    }

    /// Returns the generation the load belongs to and its sequence.
    fn start_load(&self) -> (u64, u64, i64) {
        let mut state = lock(&self.state);
        state.loads_in_flight += 1;
        state.load_seq += 1;
        (state.generation, state.load_seq, state.conversation_id)
    }

    /// Installs `history` (when the load succeeded and no later load has been
    /// installed yet) and flushes queued messages once no load is left in
    /// flight. Returns false for stale loads.
    fn finish_load(&self, generation: u64, seq: u64, history: Option<Vec<Message>>) -> bool {
        let mut state = lock(&self.state);
        if !state.active || state.generation != generation {
            return false;
        }
        match history {
            Some(history) if seq > state.applied_load_seq => {
                self.store.replace_all(history);
                state.applied_load_seq = seq;
            }
            Some(_) => debug!(seq, "Skipping history older than the one shown"),
            None => {}
        }
        state.loads_in_flight = state.loads_in_flight.saturating_sub(1);
        if state.loads_in_flight == 0 {
            for message in state.pending.drain(..) {
                self.store.append_unique(message);
            }
        }
        true
    }

    /// Starts a new generation for `conversation_id` with an empty store.
    fn begin(&self, conversation_id: i64) -> u64 {
        let mut state = lock(&self.state);
        state.conversation_id = conversation_id;
        state.generation += 1;
        state.active = true;
        state.loads_in_flight = 0;
        state.pending.clear();
        self.store.clear();
        state.generation
    }

    fn end(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.active = false;
        state.loads_in_flight = 0;
        state.pending.clear();
        self.store.clear();
    }

    fn current(&self) -> Option<(u64, i64)> {
        let state = lock(&self.state);
        state
            .active
            .then_some((state.generation, state.conversation_id))
    }
}

/// One open chat thread: its messages, live updates, and the message being typed.
pub struct ChatSession<C: Context> {
    session_id: Uuid,
    ctx: Arc<C>,
    gate: Arc<SyncGate>,
    subscriber: tokio::sync::Mutex<RealtimeSubscriber>,
    sender: OutboundSender,
    draft: Mutex<String>,
}

impl<C: Context + 'static> ChatSession<C> {
    pub fn new(ctx: Arc<C>, conversation_id: i64) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            ctx,
            gate: Arc::new(SyncGate {
                state: Mutex::new(SyncState {
                    conversation_id,
                    generation: 0,
                    active: false,
                    loads_in_flight: 0,
                    load_seq: 0,
                    applied_load_seq: 0,
                    pending: vec![],
                }),
                store: MessageStore::new(),
            }),
            subscriber: tokio::sync::Mutex::new(RealtimeSubscriber::new()),
            sender: OutboundSender::new(),
            draft: Mutex::new(String::new()),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn conversation_id(&self) -> i64 {
        lock(&self.gate.state).conversation_id
    }

    pub fn is_active(&self) -> bool {
        lock(&self.gate.state).active
    }

    pub fn is_sending(&self) -> bool {
        self.sender.is_busy()
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.gate.store.snapshot()
    }

    pub fn watch(&self) -> watch::Receiver<u64> {
        self.gate.store.watch()
    }

    pub fn draft(&self) -> String {
        lock(&self.draft).clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *lock(&self.draft) = text.into();
    }

    /// Subscribes to the conversation channel, then loads its history.
    pub async fn activate(&self) -> ServiceResult<()> {
        let conversation_id = self.conversation_id();
        self.open(conversation_id).await
    }

    /// Moves the session to another conversation. Does nothing if it is already there.
    pub async fn switch_conversation(&self, conversation_id: i64) -> ServiceResult<()> {
        if self.is_active() && self.conversation_id() == conversation_id {
            return Ok(());
        }
        info!(
            session_id = %self.session_id,
            from = self.conversation_id(),
            to = conversation_id,
            "Switching conversation"
        );
        self.open(conversation_id).await
    }

    /// Re-fetches the history of the current conversation.
    pub async fn reload(&self) -> ServiceResult<()> {
        if !self.is_active() {
            return Err(AppError::SessionInactive);
        }
        self.load_history().await
    }

    /// Stops live updates and drops the messages. Loads and sends still in
    /// flight run to completion, but their results are discarded.
    pub async fn deactivate(&self) {
        let mut subscriber = self.subscriber.lock().await;
        self.gate.end();
        subscriber.unsubscribe().await;
        info!(session_id = %self.session_id, "Chat session deactivated");
    }

    /// Sends the draft. It is cleared once the backend confirms the message and
    /// kept when sending fails.
    pub async fn send_draft(&self) -> ServiceResult<Option<Message>> {
        let text = self.draft();
        let sent = self.send(&text).await?;
        if sent.is_some() {
            lock(&self.draft).clear();
        }
        Ok(sent)
    }

    pub async fn send(&self, text: &str) -> ServiceResult<Option<Message>> {
        let (generation, conversation_id) =
            self.gate.current().ok_or(AppError::SessionInactive)?;
        let sent = self
            .sender
            .send(self.ctx.as_ref(), conversation_id, text)
            .await?;
        if let Some(message) = &sent {
            let admission = self.gate.admit(generation, message.clone());
            debug!(
                session_id = %self.session_id,
                message_id = message.message_id,
                ?admission,
                "Admitted sent message"
            );
        }
        Ok(sent)
    }

    async fn open(&self, conversation_id: i64) -> ServiceResult<()> {
        {
            let mut subscriber = self.subscriber.lock().await;
            let generation = self.gate.begin(conversation_id);

            let gate = self.gate.clone();
            let on_message = move |message: Message| {
                let message_id = message.message_id;
                let admission = gate.admit(generation, message);
                debug!(message_id, ?admission, "Admitted realtime message");
            };
            if let Err(e) = subscriber
                .subscribe(self.ctx.as_ref(), conversation_id, on_message)
                .await
            {
                warn!(
                    session_id = %self.session_id,
                    conversation_id,
                    code = e.code(),
                    "Continuing without live updates"
                );
            }
        }
        self.load_history().await
    }

    async fn load_history(&self) -> ServiceResult<()> {
        let (generation, seq, conversation_id) = self.gate.start_load();
        match history::load(self.ctx.as_ref(), conversation_id).await {
            Ok(messages) => {
                if !self.gate.finish_load(generation, seq, Some(messages)) {
                    debug!(conversation_id, "Discarding stale history");
                }
                Ok(())
            }
            Err(e) => match self.gate.finish_load(generation, seq, None) {
                true => Err(e),
                false => Ok(()),
            },
        }
    }
}
