use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, fail};
use crate::entities::messages::NewMessage;
use crate::models::messages::{Message, OutgoingMessage};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Submits locally authored messages, at most one at a time.
#[derive(Default)]
pub struct OutboundSender {
    busy: AtomicBool,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl OutboundSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Returns the backend's record of the sent message, or `None` when nothing
    /// was sent: blank text, or another send still in flight.
    pub async fn send<C: Context + ?Sized>(
        &self,
        ctx: &C,
        conversation_id: i64,
        text: &str,
    ) -> ServiceResult<Option<Message>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(conversation_id, "Ignoring send while another is in flight");
            return Ok(None);
        }
        let _busy = BusyGuard(&self.busy);

        let request = NewMessage::from(OutgoingMessage {
            conversation_id,
            content: text.to_string(),
        });
        match ctx.backend().send_message(&request).await {
            Ok(message) => {
                info!(conversation_id, message_id = message.id, "Sent message");
                Ok(Some(Message::from(message)))
            }
            Err(e) => fail(AppError::SendFailed, e),
        }
    }
}
