use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PaperError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file reference object exactly as the server returned it on upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(pub Value);

impl FileRef {
    /// Reference to an uploaded file by id: `{"type": "file", "id": ...}`.
    pub fn file(id: impl Into<String>) -> Self {
        Self(serde_json::json!({ "type": "file", "id": id.into() }))
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(|v| v.as_str())
    }
}

/// One conversation turn, as handed to the request builder and the history packer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileRef>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            files: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_files(mut self, files: Vec<FileRef>) -> Self {
        self.files = files;
        self
    }
}

/// Request-side message shape: role and content only.
#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Body of a streaming chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub stream: bool,
    pub max_tokens: u32,
    pub messages: Vec<WireMessage>,
    pub files: Vec<FileRef>,
}

impl ChatRequest {
    /// Build a streaming request; files attached to any turn are collected into `files`.
    pub fn streaming(model: impl Into<String>, max_tokens: u32, messages: &[ChatMessage]) -> Self {
        Self {
            model: model.into(),
            stream: true,
            max_tokens,
            messages: messages.iter().map(WireMessage::from).collect(),
            files: messages.iter().flat_map(|m| m.files.iter().cloned()).collect(),
        }
    }
}

/// Final state of an HTTP exchange after the body has been fully received.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: Option<String>,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An HTTP transport that can POST a chat request and report progress.
///
/// `on_progress` receives the *cumulative* response body decoded so far, never
/// a delta. Calls are strictly ordered and each supersedes the previous one.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_progress: &mut (dyn for<'s> FnMut(&'s str) + Send),
    ) -> Result<TransportResponse, PaperError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let messages = vec![
            ChatMessage::system("s"),
            ChatMessage::user("u").with_files(vec![FileRef::file("f-1")]),
        ];
        let request = ChatRequest::streaming("model-x", 512, &messages);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "model-x");
        assert_eq!(json["stream"], true);
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["messages"][1], serde_json::json!({"role": "user", "content": "u"}));
        assert_eq!(json["files"][0], serde_json::json!({"type": "file", "id": "f-1"}));
        assert_eq!(json.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::Tool.as_str(), "tool");
    }
}
