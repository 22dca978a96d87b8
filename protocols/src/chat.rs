use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::{common::Usage, validated::Normalizable};

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single chat message. Fields other than `role` and `content` (for example
/// `name`) are kept in `other` and forwarded untouched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            role,
            content: content.into(),
            other: Map::new(),
        }
    }

    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::System, content)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        MessageContent::Parts(parts)
    }
}

// ============================================================================
// Content parts
// ============================================================================

/// One element of a multi-part message, discriminated by its `type` field.
///
/// Only `text` and `image_url` parts are interpreted. Anything else, including
/// a recognised tag whose payload has an unexpected shape, is kept as
/// [`ContentPart::Other`] and serialized back exactly as received. Fields the
/// typed variants do not model (the `type` tag itself included) live in `extra`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(from = "Value", into = "Value")]
pub enum ContentPart {
    Text {
        text: String,
        extra: Map<String, Value>,
    },
    ImageUrl {
        url: String,
        /// Remaining keys of the `image_url` object, e.g. `detail`.
        url_extra: Map<String, Value>,
        extra: Map<String, Value>,
    },
    Other(Value),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        let mut extra = Map::new();
        extra.insert("type".to_string(), Value::String("text".to_string()));
        ContentPart::Text {
            text: text.into(),
            extra,
        }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        let mut extra = Map::new();
        extra.insert("type".to_string(), Value::String("image_url".to_string()));
        ContentPart::ImageUrl {
            url: url.into(),
            url_extra: Map::new(),
            extra,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn as_image_url(&self) -> Option<&str> {
        match self {
            ContentPart::ImageUrl { url, .. } => Some(url),
            _ => None,
        }
    }
}

impl From<Value> for ContentPart {
    fn from(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return ContentPart::Other(value);
        };

        match map.get("type").and_then(Value::as_str) {
            Some("text") => {
                let Some(text) = map.get("text").and_then(Value::as_str).map(str::to_owned) else {
                    return ContentPart::Other(Value::Object(map));
                };
                map.remove("text");
                ContentPart::Text { text, extra: map }
            }
            Some("image_url") => {
                let Some(mut url_extra) = map.get("image_url").and_then(Value::as_object).cloned()
                else {
                    return ContentPart::Other(Value::Object(map));
                };
                let Some(url) = url_extra.get("url").and_then(Value::as_str).map(str::to_owned)
                else {
                    return ContentPart::Other(Value::Object(map));
                };
                url_extra.remove("url");
                map.remove("image_url");
                ContentPart::ImageUrl {
                    url,
                    url_extra,
                    extra: map,
                }
            }
            _ => ContentPart::Other(Value::Object(map)),
        }
    }
}

impl From<ContentPart> for Value {
    fn from(part: ContentPart) -> Self {
        match part {
            ContentPart::Text { text, mut extra } => {
                extra.insert("text".to_string(), Value::String(text));
                Value::Object(extra)
            }
            ContentPart::ImageUrl {
                url,
                mut url_extra,
                mut extra,
            } => {
                url_extra.insert("url".to_string(), Value::String(url));
                extra.insert("image_url".to_string(), Value::Object(url_extra));
                Value::Object(extra)
            }
            ContentPart::Other(value) => value,
        }
    }
}

// ============================================================================
// Chat Completions API (v1/chat/completions)
// ============================================================================

fn default_temperature() -> Option<f32> {
    Some(0.0)
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ChatCompletionRequest {
    /// Model to route to; the configured default is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[validate(length(min = 1, message = "messages must contain at least one message"))]
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature. Omitted means 0.0, an explicit `null` means
    /// "let the backend decide".
    #[serde(default = "default_temperature")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Newer alias of `max_tokens`; `max_tokens` wins when both are set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            model: None,
            messages,
            temperature: default_temperature(),
            max_tokens: None,
            max_completion_tokens: None,
        }
    }

    /// The client's max-token limit: `max_tokens`, then `max_completion_tokens`.
    /// Zero counts as unset.
    pub fn requested_max_tokens(&self) -> Option<u32> {
        self.max_tokens
            .filter(|&n| n > 0)
            .or(self.max_completion_tokens.filter(|&n| n > 0))
    }

    /// [`Self::requested_max_tokens`], falling back to the configured default.
    pub fn effective_max_tokens(&self, default: u32) -> u32 {
        self.requested_max_tokens().unwrap_or(default)
    }
}

impl Normalizable for ChatCompletionRequest {
    fn normalize(&mut self) {
        self.max_tokens = self.requested_max_tokens();
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String, // "chat.completion"
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: Option<String>, // "stop"
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantMessage {
    pub role: Role,
    pub content: String,
}

pub fn completion_id(created: i64) -> String {
    format!("chatcmpl-{}", created)
}

impl ChatCompletionResponse {
    /// Single-choice completion with `finish_reason: "stop"`.
    pub fn from_text(model: impl Into<String>, created: i64, text: String, usage: Usage) -> Self {
        Self {
            id: completion_id(created),
            object: "chat.completion".to_string(),
            created,
            model: model.into(),
            choices: vec![ChatChoice {
                index: 0,
                message: AssistantMessage {
                    role: Role::Assistant,
                    content: text,
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage,
        }
    }
}
