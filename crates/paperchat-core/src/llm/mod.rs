mod traits;
pub mod assembler;
pub mod frame;
mod openwebui;
pub mod stream;

pub use traits::*;
pub use assembler::{RenderSink, RenderState, StreamAssembler, StreamOutcome, StreamStatus};
pub use frame::{DeltaEvent, ErrorBody, Frame};
pub use openwebui::{OpenWebUiClient, UserInfo};
pub use stream::{stream_completion, CumulativeBody};
