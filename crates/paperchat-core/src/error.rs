use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaperError {
    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error ({status}): {message}")]
    Protocol { status: u16, message: String },

    #[error("A summary is already being generated for {0}")]
    GenerationInProgress(String),

    #[error("Malformed history: {0}")]
    History(String),

    #[error("{0}")]
    Other(String),
}

impl PaperError {
    pub fn protocol(status: u16, message: impl Into<String>) -> Self {
        Self::Protocol {
            status,
            message: message.into(),
        }
    }

    /// Extraction failure used when an attachment yields no usable text.
    pub fn no_text() -> Self {
        Self::Extraction("no text available".to_string())
    }
}

pub type Result<T> = std::result::Result<T, PaperError>;
