use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use grounding_protocol::{GroundingRequest, GroundingResponse};
use tracing::{debug, warn};

use crate::{
    error::{GroundingError, GroundingResult},
    parsers::parse_coordinates,
    server::AppState,
};

/// `POST /grounding/generate`
///
/// `prompt` and `image` are read from the query string. A JSON body with the
/// same field names fills whatever the query string left out.
pub async fn generate(
    State(state): State<AppState>,
    query: Result<Query<GroundingRequest>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> GroundingResult<Json<GroundingResponse>> {
    let Query(params) = query
        .map_err(|e| GroundingError::validation(format!("Invalid query parameters: {}", e)))?;
    let body =
        body.map_err(|e| GroundingError::validation(format!("Failed to read request body: {}", e)))?;
    let params = merge_body(params, &body)?;

    let prompt = required(params.prompt, "prompt")?;
    let image = required(params.image, "image")?;
    debug!(prompt_len = prompt.len(), image_len = image.len(), "Grounding request");

    let response = state.backend.ground(prompt, image).await?;
    let coordinates = parse_coordinates(&response);
    if coordinates.is_none() {
        warn!(response = %response, "No coordinates in grounding response");
    }

    Ok(Json(GroundingResponse {
        response,
        coordinates,
    }))
}

fn merge_body(params: GroundingRequest, body: &[u8]) -> GroundingResult<GroundingRequest> {
    let complete = params.prompt.is_some() && params.image.is_some();
    if complete || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(params);
    }
    let fallback: GroundingRequest = serde_json::from_slice(body)
        .map_err(|e| GroundingError::validation(format!("Invalid JSON body: {}", e)))?;
    Ok(params.or(fallback))
}

fn required(value: Option<String>, field: &str) -> GroundingResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(GroundingError::validation(format!("Missing required parameter: {}", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: Option<&str>, image: Option<&str>) -> GroundingRequest {
        GroundingRequest {
            prompt: prompt.map(str::to_string),
            image: image.map(str::to_string),
        }
    }

    #[test]
    fn test_query_wins_over_body() {
        let merged = merge_body(
            request(Some("click ok"), None),
            br#"{"prompt": "ignored", "image": "AAAA"}"#,
        )
        .unwrap();
        assert_eq!(merged.prompt.as_deref(), Some("click ok"));
        assert_eq!(merged.image.as_deref(), Some("AAAA"));
    }

    #[test]
    fn test_body_ignored_when_query_complete() {
        let merged = merge_body(request(Some("p"), Some("i")), b"not json").unwrap();
        assert_eq!(merged.prompt.as_deref(), Some("p"));
    }

    #[test]
    fn test_malformed_body_is_validation_error() {
        let err = merge_body(request(None, None), b"{oops").unwrap_err();
        assert!(matches!(err, GroundingError::Validation(_)));
    }

    #[test]
    fn test_blank_values_are_missing() {
        assert!(required(Some("  ".to_string()), "prompt").is_err());
        assert!(required(None, "image").is_err());
        assert_eq!(required(Some("x".to_string()), "image").unwrap(), "x");
    }
}
