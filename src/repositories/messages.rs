use crate::common::sync::{read, write};
use crate::models::messages::{Message, MessageId};
use hashbrown::HashSet;
use std::sync::RwLock;
use tokio::sync::watch;

#[derive(Default)]
struct Messages {
    ordered: Vec<Message>,
    ids: HashSet<MessageId>,
}

impl Messages {
    fn push(&mut self, message: Message) {
        self.ids.insert(message.message_id);
        self.ordered.push(message);
    }
}

/// Ordered, in-memory message list of one conversation.
///
/// Order is insertion order; the store never sorts. Every mutation bumps a
/// revision counter observable through [`MessageStore::watch`].
pub struct MessageStore {
    messages: RwLock<Messages>,
    revision: watch::Sender<u64>,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore {
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Messages::default()),
            revision: watch::Sender::new(0),
        }
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    pub fn append(&self, message: Message) {
        write(&self.messages).push(message);
        self.bump();
    }

    /// Appends unless a message with the same id is already stored.
    pub fn append_unique(&self, message: Message) -> bool {
        {
            let mut messages = write(&self.messages);
            if messages.ids.contains(&message.message_id) {
                return false;
            }
            messages.push(message);
        }
        self.bump();
        true
    }

    pub fn replace_all(&self, replacement: Vec<Message>) {
        {
            let mut messages = write(&self.messages);
            messages.ids = replacement.iter().map(|m| m.message_id).collect();
            messages.ordered = replacement;
        }
        self.bump();
    }

    pub fn clear(&self) {
        self.replace_all(vec![]);
    }

    pub fn snapshot(&self) -> Vec<Message> {
        read(&self.messages).ordered.clone()
    }

    pub fn contains(&self, message_id: MessageId) -> bool {
        read(&self.messages).ids.contains(&message_id)
    }

    pub fn len(&self) -> usize {
        read(&self.messages).ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
