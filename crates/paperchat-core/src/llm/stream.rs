use crate::error::PaperError;
use crate::llm::assembler::{RenderSink, StreamAssembler, StreamOutcome};
use crate::llm::traits::{ChatRequest, ChatTransport};

/// Incremental UTF-8 decoder for a response body that arrives in byte chunks.
///
/// The decoded text only ever grows: an incomplete multi-byte sequence at the
/// end of a chunk is held back until the rest arrives, and invalid bytes are
/// replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct CumulativeBody {
    text: String,
    pending: Vec<u8>,
}

impl CumulativeBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes and return the full text decoded so far.
    pub fn push(&mut self, bytes: &[u8]) -> &str {
        self.pending.extend_from_slice(bytes);
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    self.text
                        .push_str(&String::from_utf8_lossy(&self.pending[..valid_up_to]));
                    match e.error_len() {
                        Some(invalid) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid_up_to + invalid);
                        }
                        None => {
                            self.pending.drain(..valid_up_to);
                            break;
                        }
                    }
                }
            }
        }
        &self.text
    }

    /// Decoded text, with any held-back partial sequence flushed as U+FFFD.
    pub fn finish(mut self) -> String {
        if !self.pending.is_empty() {
            self.text.push_str(&String::from_utf8_lossy(&self.pending));
        }
        self.text
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Run one streaming exchange and assemble its output into `sink`.
///
/// Non-success statuses are folded into the returned text; only transport
/// failures are returned as errors. The final render always happens.
pub async fn stream_completion<T, S>(
    transport: &T,
    request: &ChatRequest,
    sink: S,
) -> Result<StreamOutcome, PaperError>
where
    T: ChatTransport + ?Sized,
    S: RenderSink + Send,
{
    let mut assembler = StreamAssembler::new(sink);
    tracing::debug!(
        "Streaming {} messages to model {}",
        request.messages.len(),
        request.model
    );

    let response = transport
        .stream_chat(request, &mut |cumulative: &str| assembler.on_chunk(cumulative))
        .await;

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            // Render what arrived before the transport broke, then surface the error.
            let _ = assembler.finish();
            return Err(e);
        }
    };

    if response.is_success() {
        // Bodies delivered without progress notifications still get assembled.
        assembler.on_chunk(&response.body);
    } else {
        assembler.fail_with_status(
            response.status,
            response.status_text.as_deref(),
            Some(&response.body),
        );
    }

    Ok(assembler.finish())
}
