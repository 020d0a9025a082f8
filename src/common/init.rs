use crate::adapters::chat_service::ChatServiceClient;
use crate::adapters::realtime::redis_pubsub::RedisTransport;
use crate::common::state::AppState;
use crate::settings::{AppSettings, LogFormat};
use std::sync::Arc;

pub fn initialize_logging(settings: &AppSettings) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(settings.level)
        .with_timer(tracing_subscriber::fmt::time())
        .with_level(true);
    match settings.log_format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}

pub async fn initialize_state(settings: &AppSettings) -> anyhow::Result<AppState> {
    let backend = ChatServiceClient::from_settings(settings)?;
    let transport = RedisTransport::from_settings(settings).await?;
    Ok(AppState {
        backend: Arc::new(backend),
        transport: Arc::new(transport),
    })
}
