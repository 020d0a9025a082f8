use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, fail};
use crate::models::messages::Message;
use tracing::info;

/// Fetches the full history of a conversation, oldest first as the backend orders it.
pub async fn load<C: Context + ?Sized>(
    ctx: &C,
    conversation_id: i64,
) -> ServiceResult<Vec<Message>> {
    match ctx.backend().get_messages(conversation_id).await {
        Ok(messages) => {
            info!(
                conversation_id,
                count = messages.len(),
                "Loaded conversation history"
            );
            Ok(messages.into_iter().map(Message::from).collect())
        }
        Err(e) => fail(AppError::HistoryLoadFailed, e),
    }
}
