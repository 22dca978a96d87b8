//! Command line and environment configuration.

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::logging::LoggingConfig;

pub const DEFAULT_PROXY_MAX_TOKENS: u32 = 400;
pub const DEFAULT_DIRECT_MAX_TOKENS: u32 = 128;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServingMode {
    /// Forward requests to an OpenAI-compatible inference server
    Proxy,
    /// Run the model in-process
    Direct,
}

impl ServingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServingMode::Proxy => "proxy",
            ServingMode::Direct => "direct",
        }
    }

    pub fn default_max_tokens(&self) -> u32 {
        match self {
            ServingMode::Proxy => DEFAULT_PROXY_MAX_TOKENS,
            ServingMode::Direct => DEFAULT_DIRECT_MAX_TOKENS,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "grounding-proxy")]
#[command(about = "OpenAI-compatible front end for GUI grounding models")]
#[command(version)]
pub struct Cli {
    #[arg(long, env = "GROUNDING_MODE", value_enum, default_value_t = ServingMode::Proxy)]
    pub mode: ServingMode,

    /// Model name sent upstream (proxy) or model id to load (direct)
    #[arg(long, env = "GROUNDING_MODEL", default_value = "tgi")]
    pub model: String,

    /// Backend base URL including the API prefix
    #[arg(long, env = "GROUNDING_BASE_URL", default_value = "http://localhost:8080/v1")]
    pub base_url: String,

    /// Bearer token for the backend; falls back to OPENAI_API_KEY, then "dummy"
    #[arg(long, env = "GROUNDING_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Default max tokens when a request does not set one
    #[arg(long, env = "GROUNDING_MAX_TOKENS")]
    pub max_tokens: Option<u32>,

    #[arg(long, env = "GROUNDING_DEVICE", default_value = "cpu")]
    pub device: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Largest accepted request body in bytes
    #[arg(long, env = "GROUNDING_MAX_PAYLOAD_BYTES", default_value_t = DEFAULT_MAX_PAYLOAD_BYTES)]
    pub max_payload_size: usize,

    #[arg(long, env = "GROUNDING_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "GROUNDING_LOG_JSON")]
    pub log_json: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("model must not be empty")]
    EmptyModel,

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),
}

#[derive(Clone)]
pub struct ServerConfig {
    pub mode: ServingMode,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub max_tokens: u32,
    pub device: String,
    pub host: String,
    pub port: u16,
    pub max_payload_size: usize,
    pub logging: LoggingConfig,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("mode", &self.mode)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("max_tokens", &self.max_tokens)
            .field("device", &self.device)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("max_payload_size", &self.max_payload_size)
            .field("logging", &self.logging)
            .finish()
    }
}

impl Cli {
    /// Resolve fallbacks and validate.
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| "dummy".to_string());

        let config = ServerConfig {
            max_tokens: self
                .max_tokens
                .unwrap_or_else(|| self.mode.default_max_tokens()),
            mode: self.mode,
            model: self.model,
            base_url: self.base_url,
            api_key,
            device: self.device,
            host: self.host,
            port: self.port,
            max_payload_size: self.max_payload_size,
            logging: LoggingConfig {
                level: self.log_level,
                json: self.log_json,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if self.mode == ServingMode::Proxy {
            let url = url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidBaseUrl {
                    url: self.base_url.clone(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Zero { field: "max_tokens" });
        }
        if self.max_payload_size == 0 {
            return Err(ConfigError::Zero {
                field: "max_payload_size",
            });
        }
        if self.logging.level_filter().is_none() {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
