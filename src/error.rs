//! Request-level error taxonomy.
//!
//! Every variant renders through the same error envelope; the variant only
//! picks the status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::routers::error::create_error;

pub type GroundingResult<T> = Result<T, GroundingError>;

#[derive(Debug, Error)]
pub enum GroundingError {
    /// Missing prompt or image, malformed parameters
    #[error("{0}")]
    Validation(String),

    /// The inference backend answered with a non-success status
    #[error("{0}")]
    Backend(String),

    /// Network failures, unexpected response shapes, anything unplanned
    #[error("{0}")]
    Internal(String),

    /// The local model failed while generating
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Model is not loaded: {0}")]
    ModelNotLoaded(String),
}

impl GroundingError {
    pub fn validation(message: impl Into<String>) -> Self {
        GroundingError::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GroundingError::Validation(_) => StatusCode::BAD_REQUEST,
            GroundingError::Backend(_) => StatusCode::BAD_GATEWAY,
            GroundingError::Internal(_)
            | GroundingError::Generation(_)
            | GroundingError::ModelNotLoaded(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GroundingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = %status, error = %self, "Request failed");
        }
        create_error(status, self.to_string())
    }
}
