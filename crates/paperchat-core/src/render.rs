//! Markdown to HTML conversion for notes and panels.

use comrak::{markdown_to_html, Options};

pub trait MarkdownRenderer: Send + Sync {
    fn to_html(&self, markdown: &str) -> String;
}

/// CommonMark renderer with the GitHub extensions model output tends to use.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComrakRenderer;

impl MarkdownRenderer for ComrakRenderer {
    fn to_html(&self, markdown: &str) -> String {
        let mut options = Options::default();
        options.extension.table = true;
        options.extension.strikethrough = true;
        options.extension.autolink = true;
        options.extension.tasklist = true;
        markdown_to_html(markdown, &options)
    }
}
