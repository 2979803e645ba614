/// paperchat — centralized constants.
/// Wire strings, limits and default values live here.

// ─── Streaming ────────────────────────────────────────────────────────────────

pub mod stream {
    use std::time::Duration;

    /// Delimiter between two server-sent event frames.
    pub const FRAME_DELIMITER: &str = "\n\n";
    /// Optional prefix on every SSE data frame.
    pub const DATA_PREFIX: &str = "data:";
    /// Sentinel frame marking normal stream termination.
    pub const DONE_SENTINEL: &str = "[DONE]";
    /// Minimum spacing between two throttled renders.
    pub const RENDER_INTERVAL: Duration = Duration::from_millis(100);
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const CHAT_COMPLETIONS_PATH: &str = "/api/chat/completions";
    pub const CURRENT_USER_PATH: &str = "/api/v1/auths/";
    pub const NEW_CHAT_PATH: &str = "/api/v1/chats/new";
    /// Browser route of a stored conversation, followed by its id.
    pub const CHAT_ROUTE: &str = "/c/";
}

// ─── Defaults ─────────────────────────────────────────────────────────────────

pub mod defaults {
    pub const MODEL: &str = "llama3.1:8b";
    pub const MAX_TOKENS: u32 = 4096;
    pub const API_KEY_ENV: &str = "PAPERCHAT_API_KEY";
    pub const LIBRARY_ID: u64 = 1;

    pub const SYSTEM_PROMPT: &str =
        "You are a research assistant. Summarize academic documents accurately and concisely.";
    pub const PROMPT: &str = "Summarize the following document. Cover its research question, \
        method, main findings and limitations. Answer in Markdown.";

    /// Title used for saved conversations when the caller supplies none.
    pub const CHAT_TITLE: &str = "Document summary";
}

// ─── Paths ────────────────────────────────────────────────────────────────────

pub mod paths {
    pub const APP_DIR: &str = "paperchat";
    pub const CONFIG_FILE: &str = "config.toml";
    pub const NOTES_DIR: &str = "notes";
    /// Host's per-attachment full-text index file.
    pub const FULLTEXT_CACHE_FILE: &str = ".zotero-ft-cache";
    pub const ZOTERO_DIR: &str = "Zotero";
    pub const STORAGE_DIR: &str = "storage";
}
