use serde::{Deserialize, Serialize};

/// A message as exchanged with the chat service and the realtime channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message {
    pub id: i64,
    pub service_id: i64,
    pub message: String,
    #[serde(rename = "fromCounterparty", alias = "fromTayder")]
    pub from_counterparty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewMessage {
    pub service_id: i64,
    pub message: String,
    #[serde(rename = "fromCounterparty")]
    pub from_counterparty: bool,
}

/// Response body of a message submission.
#[derive(Debug, Deserialize, Serialize)]
pub struct SendMessageReply {
    pub message: Message,
}

/// Payload of a `new-message` realtime event.
#[derive(Debug, Deserialize, Serialize)]
pub struct NewMessageEvent {
    pub message: Message,
}
