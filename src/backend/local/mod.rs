//! In-process inference with a vision-language model.
//!
//! [`LocalEngine`] is built once at startup from an ordered list of
//! [`ModelLoader`]s. A failed load does not stop the server: health reports
//! `model_loaded: false` and generation requests fail with a 500.

pub mod loader;
pub mod model;

use std::sync::Arc;

use async_trait::async_trait;
use grounding_multimodal::decode_image;
use grounding_protocol::{ChatCompletionRequest, ChatCompletionResponse, Usage};
use image::RgbImage;
use serde_json::Value;
use tracing::{error, info, warn};

pub use loader::{load_first, LoadAttempt, LoadError, LoadedModel, ModelCapabilities, ModelLoader};
pub use model::{
    format_prompt, EngineError, GenerationParams, ModelInput, PromptFormat, VisionLanguageModel,
};

use super::{GroundingBackend, HealthReport};
use crate::{
    error::{GroundingError, GroundingResult},
    messages::extract_prompt_and_image,
};

#[derive(Debug, Clone)]
pub struct LocalEngineConfig {
    pub model_id: String,
    pub device: String,
    /// Used when a request carries no max-token value
    pub default_max_tokens: u32,
}

#[derive(Debug)]
enum ModelState {
    Loaded(LoadedModel),
    Failed(String),
}

pub struct LocalEngine {
    config: LocalEngineConfig,
    state: ModelState,
}

impl LocalEngine {
    /// Run the loader cascade. Blocking; call it off the async runtime.
    pub fn load(config: LocalEngineConfig, loaders: &[Box<dyn ModelLoader>]) -> Self {
        info!(model = %config.model_id, device = %config.device, loaders = loaders.len(), "Loading model");
        let state = match load_first(loaders, &config.model_id, &config.device) {
            Ok(loaded) => ModelState::Loaded(loaded),
            Err(e) => {
                error!(model = %config.model_id, error = %e, "Model failed to load");
                ModelState::Failed(e.to_string())
            }
        };
        Self { config, state }
    }

    /// Wrap an already loaded model.
    pub fn from_loaded(config: LocalEngineConfig, loaded: LoadedModel) -> Self {
        Self {
            config,
            state: ModelState::Loaded(loaded),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ModelState::Loaded(_))
    }

    pub fn config(&self) -> &LocalEngineConfig {
        &self.config
    }

    fn loaded(&self) -> GroundingResult<&LoadedModel> {
        match &self.state {
            ModelState::Loaded(loaded) => Ok(loaded),
            ModelState::Failed(reason) => Err(GroundingError::ModelNotLoaded(reason.clone())),
        }
    }

    /// Format the prompt and run generation on a blocking worker thread.
    pub async fn generate(
        &self,
        prompt: String,
        image: RgbImage,
        params: GenerationParams,
    ) -> GroundingResult<String> {
        let loaded = self.loaded()?;
        let model = Arc::clone(&loaded.model);
        let format = loaded.capabilities.prompt_format();

        tokio::task::spawn_blocking(move || {
            let text = format_prompt(model.as_ref(), format, &prompt);
            model.generate(&ModelInput { text, image }, &params)
        })
        .await
        .map_err(|e| GroundingError::Generation(format!("generation task aborted: {}", e)))?
        .map_err(|e| GroundingError::Generation(e.to_string()))
    }
}

#[async_trait]
impl GroundingBackend for LocalEngine {
    async fn chat(&self, request: ChatCompletionRequest) -> GroundingResult<Value> {
        self.loaded()?;

        let max_new_tokens = request.effective_max_tokens(self.config.default_max_tokens);
        let temperature = request.temperature.unwrap_or(0.0);
        let model_id = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.model_id.clone());

        // Image decoding is CPU-bound
        let normalized = tokio::task::spawn_blocking(move || extract_prompt_and_image(&request.messages))
            .await
            .map_err(|e| GroundingError::Internal(format!("message extraction aborted: {}", e)))?;

        if normalized.prompt.is_empty() {
            return Err(GroundingError::validation("No text prompt found in user messages"));
        }
        let Some(image) = normalized.image else {
            return Err(GroundingError::validation(
                "No image found in user messages; a base64 data URL image is required",
            ));
        };

        let prompt = normalized.prompt;
        let text = self
            .generate(
                prompt.clone(),
                image,
                GenerationParams::new(max_new_tokens, temperature),
            )
            .await?;

        let usage = Usage::from_texts(&prompt, &text);
        let response = ChatCompletionResponse::from_text(
            model_id,
            chrono::Utc::now().timestamp(),
            text,
            usage,
        );
        serde_json::to_value(response)
            .map_err(|e| GroundingError::Internal(format!("Failed to serialize response: {}", e)))
    }

    async fn ground(&self, prompt: String, image: String) -> GroundingResult<String> {
        self.loaded()?;

        let image = tokio::task::spawn_blocking(move || decode_image(&image))
            .await
            .map_err(|e| GroundingError::Internal(format!("image decoding aborted: {}", e)))?
            .map_err(|e| {
                warn!(error = %e, "Rejecting grounding request with undecodable image");
                GroundingError::validation(format!("Invalid image: {}", e))
            })?;

        self.generate(
            prompt,
            image,
            GenerationParams::new(self.config.default_max_tokens, 0.0),
        )
        .await
    }

    fn health(&self) -> HealthReport {
        let (status, architecture) = match &self.state {
            ModelState::Loaded(loaded) => ("healthy", Some(loaded.architecture.clone())),
            ModelState::Failed(_) => ("degraded", None),
        };
        HealthReport {
            status,
            model: self.config.model_id.clone(),
            base_url: None,
            device: Some(self.config.device.clone()),
            model_loaded: Some(self.is_loaded()),
            architecture,
        }
    }
}
