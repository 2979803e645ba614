//! Incremental assembly of a streamed chat-completion response.
//!
//! The transport hands over the cumulative response body each time more of it
//! arrives. The assembler slices off what is new, splits it into SSE frames on
//! the blank-line delimiter, keeps the trailing partial frame buffered, and
//! appends every decoded text delta to the accumulated output. Rendering is
//! throttled; `finish` always performs one last render.

use std::time::Instant;

use crate::constants::stream::{FRAME_DELIMITER, RENDER_INTERVAL};
use crate::llm::frame::{ErrorBody, Frame};

/// Mutable state of one streaming session.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    /// Raw text received since the last complete frame.
    pub buffer: String,
    /// All text emitted so far, including error annotations.
    pub accumulated: String,
    pub last_flush: Option<Instant>,
    pub done: bool,
    /// Bytes of the cumulative body already consumed.
    pub consumed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Done,
    Failed(String),
}

/// Receiver of rendered output.
///
/// `render` always gets the full accumulated text, never a delta, so calling it
/// repeatedly with the same text must be harmless.
pub trait RenderSink {
    fn render(&mut self, text: &str);

    fn status(&mut self, _status: &StreamStatus) {}
}

impl<F> RenderSink for F
where
    F: FnMut(&str),
{
    fn render(&mut self, text: &str) {
        self(text)
    }
}

/// What a finished streaming session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub text: String,
    /// The `[DONE]` sentinel was received.
    pub completed: bool,
    pub error: Option<String>,
}

pub struct StreamAssembler<S> {
    state: RenderState,
    sink: S,
    sentinel_seen: bool,
    error: Option<String>,
}

impl<S: RenderSink> StreamAssembler<S> {
    pub fn new(sink: S) -> Self {
        Self {
            state: RenderState::default(),
            sink,
            sentinel_seen: false,
            error: None,
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn accumulated(&self) -> &str {
        &self.state.accumulated
    }

    pub fn is_done(&self) -> bool {
        self.state.done
    }

    /// Feed the cumulative response body received so far.
    pub fn on_chunk(&mut self, cumulative: &str) {
        self.on_chunk_at(cumulative, Instant::now());
    }

    pub fn on_chunk_at(&mut self, cumulative: &str, now: Instant) {
        if cumulative.len() <= self.state.consumed {
            if cumulative.len() < self.state.consumed {
                tracing::warn!(
                    "Cumulative body shrank from {} to {} bytes; ignoring",
                    self.state.consumed,
                    cumulative.len()
                );
            }
            return;
        }
        let Some(slice) = cumulative.get(self.state.consumed..) else {
            tracing::warn!("Cumulative body does not extend the consumed prefix; ignoring");
            return;
        };
        self.state.consumed = cumulative.len();
        self.push(slice, now);
    }

    /// Feed a true delta, for transports that report only newly received text.
    pub fn on_delta(&mut self, delta: &str) {
        self.on_delta_at(delta, Instant::now());
    }

    pub fn on_delta_at(&mut self, delta: &str, now: Instant) {
        self.state.consumed += delta.len();
        self.push(delta, now);
    }

    fn push(&mut self, slice: &str, now: Instant) {
        if slice.is_empty() || self.state.done {
            return;
        }
        self.state.buffer.push_str(slice);

        let buffer = std::mem::take(&mut self.state.buffer);
        let mut pieces: Vec<&str> = buffer.split(FRAME_DELIMITER).collect();
        let trailing = pieces.pop().unwrap_or_default();

        for raw in pieces {
            self.handle_frame(raw);
            if self.state.done {
                break;
            }
        }

        // An unframed `{"detail": ..}` body replaces the event stream on some failures.
        match Frame::decode_bare_error(trailing) {
            Some(error) if !self.state.done && self.error.is_none() => self.fail(error.message()),
            _ => self.state.buffer = trailing.to_string(),
        }

        self.flush_if_due(now);
    }

    fn handle_frame(&mut self, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }
        match Frame::decode(raw) {
            Ok(Frame::Done) => {
                tracing::debug!("Stream finished with {} chars", self.state.accumulated.len());
                self.state.done = true;
                self.sentinel_seen = true;
                self.sink.status(&StreamStatus::Done);
            }
            Ok(Frame::Delta(event)) => {
                if let Some(text) = event.text() {
                    self.state.accumulated.push_str(text);
                }
            }
            Ok(Frame::Error(error)) => self.fail(error.message()),
            Ok(Frame::Ignored) => {}
            Err(e) => tracing::warn!("Skipping malformed stream frame: {}", e),
        }
    }

    fn flush_if_due(&mut self, now: Instant) {
        let due = match self.state.last_flush {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= RENDER_INTERVAL,
        };
        if due {
            self.sink.render(&self.state.accumulated);
            self.state.last_flush = Some(now);
        }
    }

    /// Fold a non-success terminal status into the accumulated text.
    ///
    /// The message comes from the body's `detail`, the raw body, the status
    /// text or the status code, in that order. Content streamed so far is kept.
    pub fn fail_with_status(&mut self, status: u16, status_text: Option<&str>, body: Option<&str>) {
        if self.error.is_some() {
            return;
        }
        let body = body.map(str::trim).filter(|body| !body.is_empty());
        let message = body
            .and_then(ErrorBody::parse)
            .map(|error| error.message())
            .or_else(|| body.map(str::to_string))
            .or_else(|| {
                status_text
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("HTTP {}", status));
        self.fail(message);
    }

    fn fail(&mut self, message: String) {
        tracing::warn!("Stream failed: {}", message);
        let accumulated = &mut self.state.accumulated;
        if !accumulated.is_empty() {
            if !accumulated.ends_with('\n') {
                accumulated.push('\n');
            }
            accumulated.push('\n');
        }
        accumulated.push_str(&format_error_block(&message));
        self.sink.status(&StreamStatus::Failed(message.clone()));
        self.error = Some(message);
    }

    /// End the session: render unconditionally and report what was assembled.
    pub fn finish(mut self) -> StreamOutcome {
        if !self.state.done {
            self.state.done = true;
            if self.error.is_none() {
                self.sink.status(&StreamStatus::Done);
            }
        }
        self.sink.render(&self.state.accumulated);
        StreamOutcome {
            text: self.state.accumulated,
            completed: self.sentinel_seen,
            error: self.error,
        }
    }
}

/// Markdown annotation appended to the output when the server reports an error.
pub fn format_error_block(message: &str) -> String {
    let quoted: Vec<String> = message.lines().map(|line| format!("> {}", line)).collect();
    format!("> **Error**\n>\n{}\n", quoted.join("\n"))
}
