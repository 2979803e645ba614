use std::io::Write;

use paperchat_core::RenderSink;

/// Prints streamed output to a terminal.
///
/// Every render carries the full text so far; only the part not yet printed
/// is written.
pub struct TerminalSink<W: Write> {
    out: W,
    printed: usize,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, printed: 0 }
    }

    pub fn printed(&self) -> usize {
        self.printed
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TerminalSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> RenderSink for TerminalSink<W> {
    fn render(&mut self, text: &str) {
        let Some(fresh) = text.get(self.printed..) else {
            return;
        };
        if fresh.is_empty() {
            return;
        }
        if let Err(e) = self.out.write_all(fresh.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write output: {}", e);
            return;
        }
        self.printed = text.len();
    }
}
