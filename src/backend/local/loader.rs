//! Ordered model-loading cascade.
//!
//! Each [`ModelLoader`] knows one model architecture. Loaders are tried in
//! registration order; the first success wins and is logged, and when every
//! attempt fails the error lists each architecture with its reason.

use std::{fmt, sync::Arc};

use thiserror::Error;
use tracing::{info, warn};

use super::model::{EngineError, PromptFormat, VisionLanguageModel};

/// What a loaded architecture can do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelCapabilities {
    pub chat_template: bool,
}

impl ModelCapabilities {
    pub fn prompt_format(&self) -> PromptFormat {
        if self.chat_template {
            PromptFormat::ChatTemplate
        } else {
            PromptFormat::Plain
        }
    }
}

pub trait ModelLoader: Send + Sync {
    fn architecture(&self) -> &str;

    fn capabilities(&self) -> ModelCapabilities;

    fn load(&self, model_id: &str, device: &str) -> Result<Arc<dyn VisionLanguageModel>, EngineError>;
}

pub struct LoadedModel {
    pub architecture: String,
    pub capabilities: ModelCapabilities,
    pub model: Arc<dyn VisionLanguageModel>,
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("architecture", &self.architecture)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadAttempt {
    pub architecture: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no model loaders are registered")]
    NoLoaders,

    #[error("failed to load '{model_id}': {}", format_attempts(.attempts))]
    Exhausted {
        model_id: String,
        attempts: Vec<LoadAttempt>,
    },
}

fn format_attempts(attempts: &[LoadAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.architecture, a.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Try `loaders` in order and return the first model that loads.
pub fn load_first(
    loaders: &[Box<dyn ModelLoader>],
    model_id: &str,
    device: &str,
) -> Result<LoadedModel, LoadError> {
    if loaders.is_empty() {
        return Err(LoadError::NoLoaders);
    }

    let mut attempts = Vec::with_capacity(loaders.len());
    for loader in loaders {
        let architecture = loader.architecture();
        match loader.load(model_id, device) {
            Ok(model) => {
                let capabilities = loader.capabilities();
                info!(
                    model = %model_id,
                    device = %device,
                    architecture = %architecture,
                    prompt_format = capabilities.prompt_format().as_str(),
                    "Loaded model"
                );
                return Ok(LoadedModel {
                    architecture: architecture.to_string(),
                    capabilities,
                    model,
                });
            }
            Err(e) => {
                warn!(model = %model_id, architecture = %architecture, error = %e, "Loader failed");
                attempts.push(LoadAttempt {
                    architecture: architecture.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Err(LoadError::Exhausted {
        model_id: model_id.to_string(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::backend::local::model::{GenerationParams, ModelInput};

    struct Echo;

    impl VisionLanguageModel for Echo {
        fn generate(&self, input: &ModelInput, _: &GenerationParams) -> Result<String, EngineError> {
            Ok(input.text.clone())
        }
    }

    struct TestLoader {
        architecture: &'static str,
        succeeds: bool,
        calls: Arc<AtomicUsize>,
    }

    impl ModelLoader for TestLoader {
        fn architecture(&self) -> &str {
            self.architecture
        }

        fn capabilities(&self) -> ModelCapabilities {
            ModelCapabilities { chat_template: true }
        }

        fn load(&self, model_id: &str, _device: &str) -> Result<Arc<dyn VisionLanguageModel>, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeeds {
                Ok(Arc::new(Echo))
            } else {
                Err(EngineError::Load(format!("{model_id} is not a {}", self.architecture)))
            }
        }
    }

    fn loader(architecture: &'static str, succeeds: bool, calls: &Arc<AtomicUsize>) -> Box<dyn ModelLoader> {
        Box::new(TestLoader {
            architecture,
            succeeds,
            calls: calls.clone(),
        })
    }

    #[test]
    fn test_first_success_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loaders = vec![
            loader("qwen2_vl", false, &calls),
            loader("qwen2_5_vl", true, &calls),
            loader("llava", true, &calls),
        ];
        let loaded = load_first(&loaders, "ui-tars", "cpu").unwrap();
        assert_eq!(loaded.architecture, "qwen2_5_vl");
        assert_eq!(loaded.capabilities.prompt_format(), PromptFormat::ChatTemplate);
        // the third loader is never tried
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_all_failures_are_reported() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loaders = vec![loader("qwen2_vl", false, &calls), loader("llava", false, &calls)];
        let err = load_first(&loaders, "ui-tars", "cpu").unwrap_err();

        let LoadError::Exhausted { attempts, .. } = &err else {
            panic!("expected exhausted, got {err:?}");
        };
        assert_eq!(attempts.len(), 2);
        assert_eq!(
            err.to_string(),
            "failed to load 'ui-tars': qwen2_vl (ui-tars is not a qwen2_vl); llava (ui-tars is not a llava)"
        );
    }

    #[test]
    fn test_no_loaders() {
        assert!(matches!(load_first(&[], "ui-tars", "cpu"), Err(LoadError::NoLoaders)));
    }
}
