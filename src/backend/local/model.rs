use image::RgbImage;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0} is not supported by this model")]
    Unsupported(&'static str),

    #[error("{0}")]
    Load(String),

    #[error("chat template failed: {0}")]
    Template(String),

    #[error("{0}")]
    Generation(String),
}

/// Formatted text plus the screenshot, as handed to the model.
#[derive(Debug, Clone)]
pub struct ModelInput {
    pub text: String,
    pub image: RgbImage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    /// Sampling is off (greedy decoding) exactly when temperature is 0
    pub do_sample: bool,
}

impl GenerationParams {
    pub fn new(max_new_tokens: u32, temperature: f32) -> Self {
        Self {
            max_new_tokens,
            temperature,
            do_sample: temperature != 0.0,
        }
    }
}

/// An in-process vision-language model.
///
/// Implementations are shared read-only across requests and called from
/// blocking worker threads.
pub trait VisionLanguageModel: Send + Sync {
    /// Render `prompt` (with one image slot) through the model's chat template.
    fn apply_chat_template(&self, _prompt: &str) -> Result<String, EngineError> {
        Err(EngineError::Unsupported("chat template"))
    }

    fn generate(&self, input: &ModelInput, params: &GenerationParams) -> Result<String, EngineError>;
}

/// How prompts are presented to the model, fixed when the model is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptFormat {
    ChatTemplate,
    Plain,
}

impl PromptFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptFormat::ChatTemplate => "chat_template",
            PromptFormat::Plain => "plain",
        }
    }
}

/// Build the model text for `prompt`.
///
/// With [`PromptFormat::ChatTemplate`] the template is tried first and any
/// failure falls back to the raw prompt.
pub fn format_prompt(model: &dyn VisionLanguageModel, format: PromptFormat, prompt: &str) -> String {
    match format {
        PromptFormat::ChatTemplate => match model.apply_chat_template(prompt) {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "Chat template unavailable, using plain prompt");
                prompt.to_string()
            }
        },
        PromptFormat::Plain => prompt.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Templated;

    impl VisionLanguageModel for Templated {
        fn apply_chat_template(&self, prompt: &str) -> Result<String, EngineError> {
            Ok(format!("<|user|><image>{prompt}<|assistant|>"))
        }

        fn generate(&self, _: &ModelInput, _: &GenerationParams) -> Result<String, EngineError> {
            Ok(String::new())
        }
    }

    struct Untemplated;

    impl VisionLanguageModel for Untemplated {
        fn generate(&self, _: &ModelInput, _: &GenerationParams) -> Result<String, EngineError> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_sampling_disabled_only_at_zero() {
        assert!(!GenerationParams::new(128, 0.0).do_sample);
        assert!(GenerationParams::new(128, 0.01).do_sample);
        assert!(GenerationParams::new(128, 1.0).do_sample);
    }

    #[test]
    fn test_chat_template_is_used() {
        assert_eq!(
            format_prompt(&Templated, PromptFormat::ChatTemplate, "click ok"),
            "<|user|><image>click ok<|assistant|>"
        );
    }

    #[test]
    fn test_chat_template_failure_falls_back() {
        assert_eq!(
            format_prompt(&Untemplated, PromptFormat::ChatTemplate, "click ok"),
            "click ok"
        );
    }

    #[test]
    fn test_plain_format_skips_template() {
        assert_eq!(format_prompt(&Templated, PromptFormat::Plain, "click ok"), "click ok");
    }
}
