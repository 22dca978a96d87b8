//! OpenAI-compatible protocol types for the grounding proxy.
//!
//! Chat-completion request/response shapes, the flat grounding endpoint
//! payloads, and the uniform error envelope.

pub mod chat;
pub mod common;
pub mod grounding;
pub mod validated;

pub use chat::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ContentPart, MessageContent, Role,
};
pub use common::{ErrorResponse, Usage};
pub use grounding::{Coordinate, GroundingRequest, GroundingResponse};
