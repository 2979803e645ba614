// Library interface for paperchat-cli
// This allows integration tests to access internal modules

// NOTE: render.rs is also declared in main.rs, so it is pulled in here with a
// path attribute to avoid "file loaded multiple times" errors.

#[path = "render.rs"]
pub mod render;

pub use render::TerminalSink;
