use serde::{Deserialize, Serialize};

/// Token accounting attached to a completion.
///
/// Locally generated completions count whitespace-separated words rather
/// than tokenizer tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn from_word_counts(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    pub fn from_texts(prompt: &str, completion: &str) -> Self {
        Self::from_word_counts(word_count(prompt), word_count(completion))
    }
}

fn word_count(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

// ============================================================================
// Error envelope
// ============================================================================

pub const INVALID_REQUEST_ERROR: &str = "invalid_request_error";
pub const SERVER_ERROR: &str = "server_error";

/// `{"error": {"message", "type", "code"}}`, the body of every non-2xx reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: u16,
}

impl ErrorResponse {
    /// The type is `invalid_request_error` for 400 and `server_error` for
    /// every other status.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        let error_type = if status == 400 {
            INVALID_REQUEST_ERROR
        } else {
            SERVER_ERROR
        };
        Self {
            error: ErrorDetail {
                message: message.into(),
                error_type: error_type.to_string(),
                code: status,
            },
        }
    }
}
