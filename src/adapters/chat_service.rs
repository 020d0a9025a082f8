use crate::entities::messages::{Message, NewMessage, SendMessageReply};
use crate::settings::AppSettings;
use anyhow::Context as _;
use async_trait::async_trait;
use std::time::Duration;

const API_PREFIX: &str = "/api/chat";
const SEND_ENDPOINT: &str = const_str::concat!(API_PREFIX, "/messages");

/// The backend collaborator holding the authoritative message history.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn get_messages(&self, conversation_id: i64) -> anyhow::Result<Vec<Message>>;

    async fn send_message(&self, message: &NewMessage) -> anyhow::Result<Message>;
}

pub struct ChatServiceClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ChatServiceClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn from_settings(settings: &AppSettings) -> anyhow::Result<Self> {
        Self::new(
            settings.chat_service_base_url.as_str(),
            settings.chat_service_token.clone(),
            settings.chat_service_timeout,
        )
    }

    fn make_url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ChatBackend for ChatServiceClient {
    async fn get_messages(&self, conversation_id: i64) -> anyhow::Result<Vec<Message>> {
        let url = self.make_url(&format!("{API_PREFIX}/{conversation_id}/messages"));
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await?
            .error_for_status()?;
        let messages = response
            .json()
            .await
            .context("decoding message history")?;
        Ok(messages)
    }

    async fn send_message(&self, message: &NewMessage) -> anyhow::Result<Message> {
        let url = self.make_url(SEND_ENDPOINT);
        let response = self
            .authorize(self.client.post(url))
            .json(message)
            .send()
            .await?
            .error_for_status()?;
        let reply: SendMessageReply = response
            .json()
            .await
            .context("decoding sent message")?;
        Ok(reply.message)
    }
}
