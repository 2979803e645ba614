use std::sync::{Arc, Mutex};

use paperchat_core::extract::{Attachment, TextExtractor};
use paperchat_core::history::{ChatDocument, ConversationStore};
use paperchat_core::llm::{
    stream_completion, ChatMessage, ChatRequest, ChatTransport, CumulativeBody, TransportResponse,
};
use paperchat_core::notes::{FsNoteStore, NoteTarget};
use paperchat_core::{PaperError, Settings, Summarizer};
use tempfile::TempDir;
use tokio::sync::Notify;

const HELLO_STREAM: [&str; 4] = [
    "data: {\"choices\":[{\"delta\":{\"content\":\"Hello \"}}]}\n",
    "\ndata: {\"choices\":[{\"delta\":{\"con",
    "tent\":\"world\"}}]}\n\n",
    "data: [DONE]\n\n",
];

/// In-process stand-in for the chat server and conversation store.
#[derive(Default)]
struct MockServer {
    chunks: Vec<String>,
    status: u16,
    fail_after_chunks: bool,
    gate: Option<Arc<Notify>>,
    requests: Mutex<Vec<serde_json::Value>>,
    stored: Mutex<Vec<ChatDocument>>,
}

impl MockServer {
    fn streaming(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            status: 200,
            ..Default::default()
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ChatTransport for MockServer {
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_progress: &mut (dyn for<'s> FnMut(&'s str) + Send),
    ) -> Result<TransportResponse, PaperError> {
        self.requests
            .lock()
            .unwrap()
            .push(serde_json::to_value(request).unwrap());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let mut body = CumulativeBody::new();
        for chunk in &self.chunks {
            on_progress(body.push(chunk.as_bytes()));
        }
        if self.fail_after_chunks {
            return Err(PaperError::Other("connection reset".into()));
        }

        Ok(TransportResponse {
            status: self.status,
            status_text: None,
            body: body.finish(),
        })
    }
}

#[async_trait::async_trait]
impl ConversationStore for MockServer {
    async fn user_id(&self) -> Result<String, PaperError> {
        Ok("user-1".into())
    }

    async fn store_chat(&self, document: &ChatDocument) -> Result<String, PaperError> {
        self.stored.lock().unwrap().push(document.clone());
        Ok("chat-42".into())
    }

    fn chat_link(&self, chat_id: &str) -> String {
        format!("http://webui.test/c/{}", chat_id)
    }
}

struct StaticExtractor(Option<&'static str>);

#[async_trait::async_trait]
impl TextExtractor for StaticExtractor {
    async fn extract(&self, _attachment: &Attachment) -> Result<String, PaperError> {
        self.0.map(str::to_string).ok_or_else(PaperError::no_text)
    }
}

fn settings(notes_dir: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.summary.model = "model-x".into();
    settings.summary.max_tokens = 1024;
    settings.notes.dir = Some(notes_dir.path().to_path_buf());
    settings
}

fn attachment() -> Attachment {
    Attachment::new("ABCD1234", "/tmp/paper.pdf", "application/pdf")
}

// ========================================================================
// Streaming driver
// ========================================================================

#[tokio::test]
async fn test_stream_completion_assembles_chunks() {
    let server = MockServer::streaming(&HELLO_STREAM);
    let request = ChatRequest::streaming("m", 16, &[ChatMessage::user("hi")]);
    let mut renders = Vec::new();

    let outcome = stream_completion(&server, &request, |text: &str| renders.push(text.to_string()))
        .await
        .unwrap();

    assert_eq!(outcome.text, "Hello world");
    assert!(outcome.completed);
    assert_eq!(renders.last().map(String::as_str), Some("Hello world"));
}

#[tokio::test]
async fn test_stream_completion_folds_error_status() {
    let mut server = MockServer::streaming(&[
        "data: {\"choices\":[{\"delta\":{\"content\":\"Partial\"}}]}\n\n",
    ]);
    server.status = 500;
    let request = ChatRequest::streaming("m", 16, &[ChatMessage::user("hi")]);

    let outcome = stream_completion(&server, &request, |_: &str| {}).await.unwrap();
    assert!(outcome.text.starts_with("Partial"));
    assert!(outcome.error.is_some());
}

#[tokio::test]
async fn test_stream_completion_surfaces_transport_error() {
    let mut server = MockServer::streaming(&HELLO_STREAM[..2]);
    server.fail_after_chunks = true;
    let request = ChatRequest::streaming("m", 16, &[ChatMessage::user("hi")]);
    let mut last_render = String::new();

    let result = stream_completion(&server, &request, |text: &str| last_render = text.to_string()).await;
    assert!(matches!(result, Err(PaperError::Other(_))));
    assert_eq!(last_render, "Hello ");
}

// ========================================================================
// Summarizer
// ========================================================================

#[tokio::test]
async fn test_summarize_streams_reply() {
    let dir = TempDir::new().unwrap();
    let summarizer = Summarizer::new(MockServer::streaming(&HELLO_STREAM), &settings(&dir))
        .with_extractor(StaticExtractor(Some("Document body")));

    let summary = summarizer.summarize(&attachment(), |_: &str| {}).await.unwrap();

    assert_eq!(summary.reply(), "Hello world");
    assert_eq!(summary.model, "model-x");
    assert_eq!(summary.messages.len(), 3);
    assert_eq!(summary.messages[2].content, "Hello world");
    assert!(!summarizer.registry().is_active("ABCD1234"));

    let requests = summarizer.client().requests.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request["model"], "model-x");
    assert_eq!(request["stream"], true);
    assert_eq!(request["max_tokens"], 1024);
    assert_eq!(request["messages"][0]["role"], "system");
    let user = request["messages"][1]["content"].as_str().unwrap();
    assert!(user.ends_with("Document body"));
}

#[tokio::test]
async fn test_extraction_failure_aborts_before_request() {
    let dir = TempDir::new().unwrap();
    let summarizer = Summarizer::new(MockServer::streaming(&HELLO_STREAM), &settings(&dir))
        .with_extractor(StaticExtractor(None));

    let err = summarizer.summarize(&attachment(), |_: &str| {}).await.unwrap_err();

    assert!(matches!(err, PaperError::Extraction(_)));
    assert_eq!(summarizer.client().request_count(), 0);
    assert!(!summarizer.registry().is_active("ABCD1234"));
}

#[test]
fn test_missing_configuration_is_reported() {
    let mut settings = Settings::default();
    settings.server.api_key_env = "PAPERCHAT_TEST_KEY_THAT_IS_NEVER_SET".into();

    let err = Summarizer::from_settings(&settings).err().unwrap();
    assert!(matches!(err, PaperError::Config(_)));

    settings.server.base_url = Some("http://localhost:3000".into());
    let err = Summarizer::from_settings(&settings).err().unwrap();
    assert!(matches!(err, PaperError::Config(_)));
}

#[tokio::test]
async fn test_concurrent_generation_for_same_item_fails_fast() {
    let dir = TempDir::new().unwrap();
    let gate = Arc::new(Notify::new());
    let mut server = MockServer::streaming(&HELLO_STREAM);
    server.gate = Some(gate.clone());
    let summarizer = Summarizer::new(server, &settings(&dir))
        .with_extractor(StaticExtractor(Some("text")));
    let attachment = attachment();

    let first = summarizer.summarize(&attachment, |_: &str| {});
    let second = async {
        let result = summarizer.summarize(&attachment, |_: &str| {}).await;
        gate.notify_one();
        result
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap().reply(), "Hello world");
    assert!(matches!(second, Err(PaperError::GenerationInProgress(ref key)) if key == "ABCD1234"));
    assert_eq!(summarizer.client().request_count(), 1);
    assert!(!summarizer.registry().is_active("ABCD1234"));
}

#[tokio::test]
async fn test_transport_error_clears_in_progress_marker() {
    let dir = TempDir::new().unwrap();
    let mut server = MockServer::streaming(&HELLO_STREAM);
    server.fail_after_chunks = true;
    let summarizer = Summarizer::new(server, &settings(&dir))
        .with_extractor(StaticExtractor(Some("text")));

    assert!(summarizer.summarize(&attachment(), |_: &str| {}).await.is_err());
    assert!(!summarizer.registry().is_active("ABCD1234"));
}

#[tokio::test]
async fn test_save_stores_linear_chat_and_note() {
    let dir = TempDir::new().unwrap();
    let summarizer = Summarizer::new(MockServer::streaming(&HELLO_STREAM), &settings(&dir))
        .with_extractor(StaticExtractor(Some("Document body")))
        .with_note_store(FsNoteStore::new(dir.path()));

    let summary = summarizer.summarize(&attachment(), |_: &str| {}).await.unwrap();
    let saved = summarizer
        .save(&summary, "My paper", &NoteTarget::ParentItem("ABCD1234".into()))
        .await
        .unwrap();

    assert_eq!(saved.chat_id, "chat-42");
    assert_eq!(saved.chat_url, "http://webui.test/c/chat-42");

    let stored = summarizer.client().stored.lock().unwrap();
    let document = &stored[0];
    assert_eq!(document.title, "My paper");
    assert_eq!(document.user_id, "user-1");
    assert_eq!(document.chat.models, vec!["model-x".to_string()]);
    assert_eq!(document.chat.messages.len(), 3);
    assert_eq!(
        document.chat.history.current_id.as_deref(),
        Some(document.chat.messages[2].id.as_str())
    );

    let html = std::fs::read_to_string(&saved.note.location).unwrap();
    assert!(html.contains("Hello world"));
    assert!(html.contains("http://webui.test/c/chat-42"));
    assert!(saved.note.location.contains("items"));
}
