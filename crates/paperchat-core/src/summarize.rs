//! End-to-end summary generation: extract, stream, save.

use std::sync::Arc;

use crate::config::{Settings, SummarySettings};
use crate::error::PaperError;
use crate::extract::{Attachment, AttachmentExtractor, TextExtractor};
use crate::history::{ChatDocument, ConversationStore};
use crate::llm::{
    stream_completion, ChatMessage, ChatRequest, ChatTransport, OpenWebUiClient, RenderSink,
    StreamOutcome,
};
use crate::notes::{FsNoteStore, NoteRef, NoteStore, NoteTarget};
use crate::render::{ComrakRenderer, MarkdownRenderer};
use crate::session::GenerationRegistry;

/// A generated summary and the conversation that produced it.
#[derive(Debug, Clone)]
pub struct Summary {
    pub attachment_key: String,
    pub model: String,
    /// Prompt turns followed by the assistant reply.
    pub messages: Vec<ChatMessage>,
    pub outcome: StreamOutcome,
}

impl Summary {
    pub fn reply(&self) -> &str {
        &self.outcome.text
    }
}

#[derive(Debug, Clone)]
pub struct SavedSummary {
    pub chat_id: String,
    pub chat_url: String,
    pub note: NoteRef,
}

pub struct Summarizer<C> {
    client: C,
    extractor: Arc<dyn TextExtractor>,
    notes: Arc<dyn NoteStore>,
    renderer: Arc<dyn MarkdownRenderer>,
    registry: GenerationRegistry,
    summary: SummarySettings,
    library_id: u64,
}

impl Summarizer<OpenWebUiClient> {
    /// Build a summarizer talking to the configured server.
    ///
    /// Fails with a configuration error when the server URL or API key is missing.
    pub fn from_settings(settings: &Settings) -> Result<Self, PaperError> {
        let (base_url, api_key) = settings.server_credentials()?;
        Ok(Self::new(OpenWebUiClient::new(base_url, api_key), settings))
    }
}

impl<C> Summarizer<C>
where
    C: ChatTransport + ConversationStore,
{
    pub fn new(client: C, settings: &Settings) -> Self {
        Self {
            client,
            extractor: Arc::new(AttachmentExtractor::new(settings.storage_dir())),
            notes: Arc::new(FsNoteStore::new(settings.notes_dir())),
            renderer: Arc::new(ComrakRenderer),
            registry: GenerationRegistry::new(),
            summary: settings.summary.clone(),
            library_id: settings.notes.library_id,
        }
    }

    pub fn with_extractor(mut self, extractor: impl TextExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn with_note_store(mut self, notes: impl NoteStore + 'static) -> Self {
        self.notes = Arc::new(notes);
        self
    }

    pub fn with_renderer(mut self, renderer: impl MarkdownRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Share in-progress markers with other summarizers.
    pub fn with_registry(mut self, registry: GenerationRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.summary.model = model.into();
        self
    }

    pub fn registry(&self) -> &GenerationRegistry {
        &self.registry
    }

    pub fn model(&self) -> &str {
        &self.summary.model
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Prompt turns for summarizing `text`.
    pub fn build_messages(&self, text: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.summary.system_prompt.clone()),
            ChatMessage::user(format!("{}\n\n{}", self.summary.prompt, text.trim())),
        ]
    }

    /// Generate a summary of `attachment`, rendering progress into `sink`.
    ///
    /// At most one generation runs per attachment key; a concurrent request for
    /// the same key fails immediately.
    pub async fn summarize<S>(&self, attachment: &Attachment, sink: S) -> Result<Summary, PaperError>
    where
        S: RenderSink + Send,
    {
        let _guard = self.registry.try_begin(&attachment.key)?;

        let text = self.extractor.extract(attachment).await?;
        tracing::debug!(
            "Extracted {} chars from attachment {}",
            text.len(),
            attachment.key
        );

        let mut messages = self.build_messages(&text);
        let request = ChatRequest::streaming(&self.summary.model, self.summary.max_tokens, &messages);
        let outcome = stream_completion(&self.client, &request, sink).await?;

        messages.push(ChatMessage::assistant(outcome.text.clone()));
        Ok(Summary {
            attachment_key: attachment.key.clone(),
            model: self.summary.model.clone(),
            messages,
            outcome,
        })
    }

    /// Store the conversation and file the reply as a note linking back to it.
    pub async fn save(
        &self,
        summary: &Summary,
        title: &str,
        target: &NoteTarget,
    ) -> Result<SavedSummary, PaperError> {
        let user_id = self.client.user_id().await?;
        let document = ChatDocument::build(title, user_id, &summary.messages, &summary.model)?;
        let chat_id = self.client.store_chat(&document).await?;
        let chat_url = self.client.chat_link(&chat_id);

        let markdown = format!(
            "{}\n\n---\n\n[Continue this conversation]({})\n",
            summary.reply().trim_end(),
            chat_url
        );
        let html = self.renderer.to_html(&markdown);
        let note = self.notes.create_note(&html, self.library_id, target).await?;

        Ok(SavedSummary {
            chat_id,
            chat_url,
            note,
        })
    }
}
