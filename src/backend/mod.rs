//! Completion dispatch.
//!
//! Handlers talk to a [`GroundingBackend`]: either [`ProxyBackend`], which
//! forwards to a running OpenAI-compatible server, or [`LocalEngine`], which
//! runs a vision-language model in-process.

pub mod local;
pub mod proxy;

use async_trait::async_trait;
use grounding_protocol::ChatCompletionRequest;
use serde::Serialize;
use serde_json::Value;

pub use local::LocalEngine;
pub use proxy::ProxyBackend;

use crate::error::GroundingResult;

#[async_trait]
pub trait GroundingBackend: Send + Sync {
    /// Answer an OpenAI chat-completions request with an OpenAI-shaped body.
    async fn chat(&self, request: ChatCompletionRequest) -> GroundingResult<Value>;

    /// Run one grounding query and return the model's raw text.
    ///
    /// `image` is base64, with or without a data-URL header.
    async fn ground(&self, prompt: String, image: String) -> GroundingResult<String>;

    fn health(&self) -> HealthReport;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_loaded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
}
