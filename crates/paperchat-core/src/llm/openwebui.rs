use futures::StreamExt;
use serde::Deserialize;

use crate::constants::endpoints;
use crate::error::PaperError;
use crate::history::{ChatDocument, ConversationStore};
use crate::llm::frame::ErrorBody;
use crate::llm::stream::CumulativeBody;
use crate::llm::traits::*;

/// Client for an Open WebUI compatible server: streaming chat completions and
/// the conversation store.
///
/// No request timeout is set; a stream stays open for as long as the server
/// keeps it open.
#[derive(Clone)]
pub struct OpenWebUiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

/// The account the API key belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SavedChat {
    id: String,
}

impl OpenWebUiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Browser link to a stored conversation.
    pub fn chat_url(&self, chat_id: &str) -> String {
        format!("{}{}{}", self.base_url, endpoints::CHAT_ROUTE, chat_id)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn current_user(&self) -> Result<UserInfo, PaperError> {
        let response = self
            .client
            .get(self.url(endpoints::CURRENT_USER_PATH))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let text = Self::checked_text(response).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Store a conversation and return the id the server assigned to it.
    pub async fn save_chat(&self, document: &ChatDocument) -> Result<String, PaperError> {
        let response = self
            .client
            .post(self.url(endpoints::NEW_CHAT_PATH))
            .bearer_auth(&self.api_key)
            .json(document)
            .send()
            .await?;
        let text = Self::checked_text(response).await?;
        let saved: SavedChat = serde_json::from_str(&text)?;
        tracing::info!("Saved conversation {}", saved.id);
        Ok(saved.id)
    }

    async fn checked_text(response: reqwest::Response) -> Result<String, PaperError> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = ErrorBody::parse(&text)
                .map(|error| error.message())
                .unwrap_or_else(|| text.clone());
            return Err(PaperError::protocol(status.as_u16(), message));
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl ChatTransport for OpenWebUiClient {
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_progress: &mut (dyn for<'s> FnMut(&'s str) + Send),
    ) -> Result<TransportResponse, PaperError> {
        let response = self
            .client
            .post(self.url(endpoints::CHAT_COMPLETIONS_PATH))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let status_text = status.canonical_reason().map(str::to_string);

        let mut body = CumulativeBody::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            on_progress(body.push(&chunk));
        }

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text,
            body: body.finish(),
        })
    }
}

#[async_trait::async_trait]
impl ConversationStore for OpenWebUiClient {
    async fn user_id(&self) -> Result<String, PaperError> {
        Ok(self.current_user().await?.id)
    }

    async fn store_chat(&self, document: &ChatDocument) -> Result<String, PaperError> {
        self.save_chat(document).await
    }

    fn chat_link(&self, chat_id: &str) -> String {
        self.chat_url(chat_id)
    }
}
