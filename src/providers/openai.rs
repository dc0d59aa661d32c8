pub mod client;
pub mod types;

pub use client::{OpenAIProvider, UpstreamReply};
pub use types::{ChatCompletionRequest, ChatCompletionResponse, Message};
