//! Conversation history as a parent-linked tree of turns.
//!
//! [`pack`] turns an ordered list of messages into a linear chain with fresh
//! ids; [`History::linearize`] projects any node back to its root-to-node path.

mod document;

pub use document::{Chat, ChatDocument, ConversationStore};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::PaperError;
use crate::llm::{ChatMessage, FileRef, Role};

/// Role of a turn together with the fields that only exist for that role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Turn {
    /// `models` lists the candidates offered for the next turn.
    System { models: Vec<String> },
    User { models: Vec<String> },
    Assistant {
        model: String,
        #[serde(rename = "modelIdx")]
        model_idx: usize,
    },
    Tool { models: Vec<String> },
}

impl Turn {
    /// Annotations for a turn served by a single `model`.
    pub fn for_role(role: Role, model: &str) -> Self {
        let models = vec![model.to_string()];
        match role {
            Role::System => Self::System { models },
            Role::User => Self::User { models },
            Role::Tool => Self::Tool { models },
            Role::Assistant => Self::Assistant {
                model: model.to_string(),
                model_idx: 0,
            },
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::Tool { .. } => Role::Tool,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub parent_id: Option<String>,
    /// Filled in by tree viewers; the packer leaves it empty.
    #[serde(default)]
    pub children_ids: Vec<String>,
    #[serde(flatten)]
    pub turn: Turn,
    pub content: String,
    #[serde(default)]
    pub files: Vec<FileRef>,
    /// Unix seconds.
    pub timestamp: i64,
}

impl HistoryItem {
    pub fn role(&self) -> Role {
        self.turn.role()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub messages: HashMap<String, HistoryItem>,
    #[serde(rename = "currentId")]
    pub current_id: Option<String>,
}

/// Pack an ordered message list into a linear history served by `model`.
///
/// Message *i* becomes the parent of message *i + 1*; `current_id` is the last
/// message's id, or `None` for an empty list.
pub fn pack(messages: &[ChatMessage], model: &str) -> History {
    let mut history = History::default();
    let mut parent_id: Option<String> = None;

    for message in messages {
        let id = Uuid::new_v4().to_string();
        let item = HistoryItem {
            id: id.clone(),
            parent_id: parent_id.take(),
            children_ids: Vec::new(),
            turn: Turn::for_role(message.role, model),
            content: message.content.clone(),
            files: message.files.clone(),
            timestamp: Utc::now().timestamp(),
        };
        history.messages.insert(id.clone(), item);
        parent_id = Some(id);
    }

    history.current_id = parent_id;
    history
}

impl History {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.messages.get(id)
    }

    /// The path from the root to `cursor`, root first.
    ///
    /// Unknown or absent cursors give an empty path. The walk visits at most
    /// `messages.len()` items; a cycle or a dangling parent is an error.
    pub fn linearize(&self, cursor: Option<&str>) -> Result<Vec<HistoryItem>, PaperError> {
        let Some(mut current) = cursor.and_then(|id| self.messages.get(id)) else {
            return Ok(Vec::new());
        };

        let mut path = vec![current.clone()];
        while let Some(parent_id) = current.parent_id.as_deref() {
            let parent = self.messages.get(parent_id).ok_or_else(|| {
                PaperError::History(format!(
                    "message {} references missing parent {}",
                    current.id, parent_id
                ))
            })?;
            if path.len() >= self.messages.len() {
                return Err(PaperError::History(format!(
                    "parent chain starting at {} does not reach a root",
                    path[0].id
                )));
            }
            path.push(parent.clone());
            current = parent;
        }

        path.reverse();
        Ok(path)
    }
}
