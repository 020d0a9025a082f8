use crate::entities::messages::{Message as MessageEntity, NewMessage};

pub type MessageId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message_id: MessageId,
    pub conversation_id: i64,
    pub content: String,
    pub from_counterparty: bool,
    /// Only set for counterparty messages.
    pub author_name: Option<String>,
    /// `YYYY-MM-DD HH:MM:SS`, no timezone.
    pub created_at: String,
}

impl From<MessageEntity> for Message {
    fn from(value: MessageEntity) -> Self {
        let author_name = match value.from_counterparty {
            true => value.provider_name,
            false => None,
        };
        Self {
            message_id: value.id,
            conversation_id: value.service_id,
            content: value.message,
            from_counterparty: value.from_counterparty,
            author_name,
            created_at: value.created_at,
        }
    }
}

impl From<Message> for MessageEntity {
    fn from(value: Message) -> Self {
        Self {
            id: value.message_id,
            service_id: value.conversation_id,
            message: value.content,
            from_counterparty: value.from_counterparty,
            provider_name: value.author_name,
            created_at: value.created_at,
        }
    }
}

/// A locally authored message on its way to the chat service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub conversation_id: i64,
    pub content: String,
}

impl From<OutgoingMessage> for NewMessage {
    fn from(value: OutgoingMessage) -> Self {
        Self {
            service_id: value.conversation_id,
            message: value.content,
            from_counterparty: false,
        }
    }
}
