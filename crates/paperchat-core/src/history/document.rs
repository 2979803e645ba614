use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{pack, History, HistoryItem};
use crate::error::PaperError;
use crate::llm::ChatMessage;

/// A conversation snapshot as sent to the conversation store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatDocument {
    pub title: String,
    pub user_id: String,
    pub chat: Chat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub history: History,
    pub id: String,
    /// The path from the root to `history.current_id`.
    pub messages: Vec<HistoryItem>,
    pub models: Vec<String>,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub title: String,
}

impl ChatDocument {
    /// Pack `messages` into a fresh history and wrap it for persistence.
    pub fn build(
        title: impl Into<String>,
        user_id: impl Into<String>,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<Self, PaperError> {
        let title = title.into();
        let history = pack(messages, model);
        let linear = history.linearize(history.current_id.as_deref())?;

        Ok(Self {
            title: title.clone(),
            user_id: user_id.into(),
            chat: Chat {
                history,
                id: Uuid::new_v4().to_string(),
                messages: linear,
                models: vec![model.to_string()],
                params: Map::new(),
                tags: Vec::new(),
                timestamp: Utc::now().timestamp_millis(),
                title,
            },
        })
    }
}

/// Server-side conversation storage.
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    /// Id of the account conversations are stored under.
    async fn user_id(&self) -> Result<String, PaperError>;

    /// Store a conversation and return the id the store assigned to it.
    async fn store_chat(&self, document: &ChatDocument) -> Result<String, PaperError>;

    /// Browser link to a stored conversation.
    fn chat_link(&self, chat_id: &str) -> String;
}
