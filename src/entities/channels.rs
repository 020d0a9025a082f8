use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const CHANNEL_PREFIX: &str = "chat";
pub const NEW_MESSAGE_EVENT: &str = "new-message";

/// Realtime channel scoped to one conversation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName {
    pub conversation_id: i64,
}

impl ChannelName {
    pub const fn for_conversation(conversation_id: i64) -> Self {
        Self { conversation_id }
    }
}

impl Display for ChannelName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{CHANNEL_PREFIX}{}", self.conversation_id)
    }
}

/// What gets published on a channel: an event name and its JSON payload.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventEnvelope {
    pub event: String,
    pub data: serde_json::Value,
}
