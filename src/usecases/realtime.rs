use crate::adapters::realtime::BoundChannel;
use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, fail};
use crate::entities::channels::{ChannelName, NEW_MESSAGE_EVENT};
use crate::entities::messages::NewMessageEvent;
use crate::models::messages::Message;
use tracing::{debug, info, warn};

/// Holds at most one live subscription to a conversation channel.
#[derive(Default)]
pub struct RealtimeSubscriber {
    channel: Option<BoundChannel>,
}

impl RealtimeSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel_name(&self) -> Option<&str> {
        self.channel.as_ref().map(BoundChannel::name)
    }

    pub fn is_subscribed(&self) -> bool {
        self.channel.is_some()
    }

    /// Subscribes to the channel of `conversation_id`, closing any previous
    /// subscription first. `on_message` only sees counterparty messages.
    pub async fn subscribe<C, F>(
        &mut self,
        ctx: &C,
        conversation_id: i64,
        on_message: F,
    ) -> ServiceResult<()>
    where
        C: Context + ?Sized,
        F: Fn(Message) + Send + Sync + 'static,
    {
        self.unsubscribe().await;

        let channel_name = ChannelName::for_conversation(conversation_id).to_string();
        let channel = match ctx.transport().subscribe(&channel_name).await {
            Ok(channel) => channel,
            Err(e) => return fail(AppError::SubscriptionError, e),
        };

        info!(
            conversation_id,
            channel = channel_name,
            "Listening for new messages"
        );
        let bound = channel.bind(NEW_MESSAGE_EVENT, move |data| {
            if let Some(message) = accept_new_message(conversation_id, data) {
                on_message(message);
            }
        });
        self.channel = Some(bound);
        Ok(())
    }

    pub async fn unsubscribe(&mut self) {
        if let Some(channel) = self.channel.take() {
            let channel_name = channel.name().to_string();
            channel.unsubscribe().await;
            info!(channel = channel_name, "Stopped listening for new messages");
        }
    }
}

/// Decodes a `new-message` payload, keeping only counterparty messages of this conversation.
fn accept_new_message(conversation_id: i64, data: serde_json::Value) -> Option<Message> {
    let event: NewMessageEvent = match serde_json::from_value(data) {
        Ok(event) => event,
        Err(e) => {
            warn!(conversation_id, "Dropping malformed new-message event: {e}");
            return None;
        }
    };

    let message = event.message;
    if message.service_id != conversation_id {
        warn!(
            conversation_id,
            message_id = message.id,
            service_id = message.service_id,
            "Dropping message addressed to another conversation"
        );
        return None;
    }
    if !message.from_counterparty {
        // our own sends are appended once the backend confirms them
        debug!(conversation_id, message_id = message.id, "Discarding echo");
        return None;
    }
    Some(Message::from(message))
}
