//! Forwarding to an OpenAI-compatible backend.

use async_trait::async_trait;
use futures::StreamExt;
use grounding_multimodal::ensure_data_url;
use grounding_protocol::{chat::completion_id, ChatCompletionRequest, ChatMessage, ContentPart};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use super::{GroundingBackend, HealthReport};
use crate::{
    error::{GroundingError, GroundingResult},
    messages::prepare_messages,
    parsers::{extract_response_text, BoxTokens},
    routers::error::upstream_error_message,
};

/// Maximum error response body size to read from the backend (1 MB)
const MAX_ERROR_RESPONSE_SIZE: usize = 1024 * 1024;

#[derive(Clone)]
pub struct ProxyConfig {
    /// Base URL including the API prefix, e.g. `http://localhost:8080/v1`
    pub base_url: String,
    pub api_key: String,
    pub default_model: String,
    pub default_max_tokens: u32,
    pub box_tokens: BoxTokens,
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("box_tokens", &self.box_tokens)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct BackendRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
}

/// Pure proxy: rewrites assistant text, forwards, and hands back the result.
///
/// The HTTP client is created on first use and shared afterwards. There is no
/// retry and no timeout; a backend that never answers holds the request open.
pub struct ProxyBackend {
    config: ProxyConfig,
    client: OnceCell<reqwest::Client>,
}

impl ProxyBackend {
    pub fn new(mut config: ProxyConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    async fn client(&self) -> GroundingResult<&reqwest::Client> {
        self.client
            .get_or_try_init(|| async {
                reqwest::Client::builder()
                    .build()
                    .map(|client| {
                        info!(base_url = %self.config.base_url, "Initialised backend client");
                        client
                    })
                    .map_err(|e| {
                        GroundingError::Internal(format!("Failed to create HTTP client: {}", e))
                    })
            })
            .await
    }

    /// POST `{base_url}/chat/completions` and return the parsed JSON body.
    pub async fn request_chat_completion(
        &self,
        messages: &[ChatMessage],
        model: Option<&str>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> GroundingResult<Value> {
        let payload = BackendRequest {
            model: model.unwrap_or(&self.config.default_model),
            messages,
            temperature,
            max_tokens: max_tokens.unwrap_or(self.config.default_max_tokens),
        };
        let url = format!("{}/chat/completions", self.config.base_url);
        debug!(url = %url, model = %payload.model, messages = messages.len(), "Sending request to backend");

        let response = self
            .client()
            .await?
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "Backend request failed");
                GroundingError::Internal(format!("Backend request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            let message = upstream_error_message(status, &body);
            error!(
                url = %url,
                status = %status,
                body_preview = %body.chars().take(200).collect::<String>(),
                "Backend rejected request"
            );
            return Err(GroundingError::Backend(message));
        }

        let completion: Value = response.json().await.map_err(|e| {
            error!(url = %url, error = %e, "Failed to parse backend response");
            GroundingError::Internal(format!("Invalid response from backend: {}", e))
        })?;

        if !completion.is_object() {
            return Err(GroundingError::Internal(
                "Invalid response from backend: expected a JSON object".to_string(),
            ));
        }

        Ok(completion)
    }
}

/// Read an error body, capped at [`MAX_ERROR_RESPONSE_SIZE`].
async fn read_error_body(response: reqwest::Response) -> String {
    let mut stream = response.bytes_stream();
    let mut buf: Vec<u8> = Vec::new();

    while let Some(chunk_result) = stream.next().await {
        match chunk_result {
            Ok(chunk) => {
                if buf.len() + chunk.len() > MAX_ERROR_RESPONSE_SIZE {
                    warn!(max_size = %MAX_ERROR_RESPONSE_SIZE, "Error response body too large");
                    break;
                }
                buf.extend_from_slice(&chunk);
            }
            Err(e) => {
                warn!(error = %e, "Failed to read error response body");
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

/// Fill `id`, `object` and `created` when the backend left them out.
fn ensure_completion_metadata(completion: &mut Value) {
    let Some(object) = completion.as_object_mut() else {
        return;
    };
    let created = chrono::Utc::now().timestamp();
    object
        .entry("id")
        .or_insert_with(|| Value::String(completion_id(created)));
    object
        .entry("object")
        .or_insert_with(|| Value::String("chat.completion".to_string()));
    object
        .entry("created")
        .or_insert_with(|| Value::from(created));
}

#[async_trait]
impl GroundingBackend for ProxyBackend {
    async fn chat(&self, request: ChatCompletionRequest) -> GroundingResult<Value> {
        let max_tokens = request.requested_max_tokens();
        let messages = prepare_messages(request.messages, &self.config.box_tokens);

        let mut completion = self
            .request_chat_completion(
                &messages,
                request.model.as_deref(),
                request.temperature,
                max_tokens,
            )
            .await?;
        ensure_completion_metadata(&mut completion);
        Ok(completion)
    }

    async fn ground(&self, prompt: String, image: String) -> GroundingResult<String> {
        let messages = [ChatMessage::user(vec![
            ContentPart::text(prompt),
            ContentPart::image_url(ensure_data_url(&image)),
        ])];

        let completion = self
            .request_chat_completion(&messages, None, Some(0.0), None)
            .await?;
        Ok(extract_response_text(&completion))
    }

    fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            model: self.config.default_model.clone(),
            base_url: Some(self.config.base_url.clone()),
            device: None,
            model_loaded: None,
            architecture: None,
        }
    }
}
