pub mod error;
pub mod constants;
pub mod config;
pub mod llm;
pub mod history;
pub mod extract;
pub mod render;
pub mod notes;
pub mod session;
pub mod summarize;

// Re-export key types
pub use error::PaperError;
pub use config::Settings;
pub use llm::{
    stream_completion, ChatMessage, ChatRequest, ChatTransport, OpenWebUiClient, RenderSink,
    Role, StreamAssembler, StreamOutcome, StreamStatus,
};
pub use history::{pack, ChatDocument, History, HistoryItem, Turn};
pub use extract::{Attachment, TextExtractor};
pub use notes::{NoteStore, NoteTarget};
pub use session::{GenerationGuard, GenerationRegistry};
pub use summarize::{SavedSummary, Summarizer, Summary};
