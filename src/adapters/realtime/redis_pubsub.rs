use crate::adapters::realtime::{Channel, ChannelFeed, RealtimeTransport};
use crate::entities::channels::EventEnvelope;
use crate::settings::AppSettings;
use anyhow::Context as _;
use async_trait::async_trait;
use futures::StreamExt;
use redis::{AsyncCommands, IntoConnectionInfo, Msg};
use std::pin::pin;
use std::time::Duration;
use tracing::{info, warn};

/// Realtime transport over Redis pub/sub. Each channel gets its own connection.
pub struct RedisTransport {
    client: redis::Client,
}

impl RedisTransport {
    pub async fn connect(
        url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mut connection_info = url.into_connection_info()?;
        if let Some(api_key) = api_key {
            connection_info.redis.password = Some(api_key.to_string());
        }
        let client = redis::Client::open(connection_info)?;

        let mut conn = tokio::time::timeout(timeout, client.get_multiplexed_async_connection())
            .await
            .context("timed out connecting to the realtime service")??;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(Self { client })
    }

    pub async fn from_settings(settings: &AppSettings) -> anyhow::Result<Self> {
        Self::connect(
            &settings.realtime_url,
            settings.realtime_key.as_deref(),
            settings.realtime_connection_timeout,
        )
        .await
    }

    pub async fn publish(&self, channel_name: &str, envelope: &EventEnvelope) -> anyhow::Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(envelope)?;
        let _: i64 = conn.publish(channel_name, payload).await?;
        Ok(())
    }
}

fn decode(msg: &Msg) -> anyhow::Result<EventEnvelope> {
    let payload: String = msg.get_payload()?;
    Ok(serde_json::from_str(&payload)?)
}

#[async_trait]
impl RealtimeTransport for RedisTransport {
    async fn subscribe(&self, channel_name: &str) -> anyhow::Result<Channel> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel_name).await?;
        info!(channel = channel_name, "Subscribed to realtime channel");

        let name = channel_name.to_string();
        Ok(Channel::spawn(channel_name, move |feed: ChannelFeed| async move {
            let ChannelFeed {
                events,
                mut shutdown,
            } = feed;
            {
                let mut messages = pin!(pubsub.on_message());
                loop {
                    tokio::select! {
                        _ = &mut shutdown => break,
                        msg = messages.next() => match msg {
                            Some(msg) => match decode(&msg) {
                                Ok(envelope) => {
                                    if events.send(envelope).await.is_err() {
                                        break;
                                    }
                                }
                                Err(e) => warn!(channel = name, "Dropping undecodable event: {e}"),
                            },
                            None => {
                                warn!(channel = name, "Realtime connection closed");
                                break;
                            }
                        },
                    }
                }
            }
            match pubsub.unsubscribe(&name).await {
                Ok(()) => info!(channel = name, "Unsubscribed from realtime channel"),
                Err(e) => warn!(channel = name, "Failed to unsubscribe cleanly: {e}"),
            }
        }))
    }
}
