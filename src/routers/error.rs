use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use grounding_protocol::ErrorResponse;
use serde_json::Value;

/// Render the uniform `{"error": {"message", "type", "code"}}` envelope.
pub fn create_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse::new(status.as_u16(), message)),
    )
        .into_response()
}

/// Best human-readable message from an upstream error body.
///
/// OpenAI-style `{"error": {"message": ...}}` and FastAPI-style
/// `{"detail": ...}` bodies yield their message; anything else is returned
/// verbatim (trimmed). An empty body falls back to the status line.
pub fn upstream_error_message(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("Backend returned error: {}", status);
    }

    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    json.get("error")
        .and_then(|error| {
            error
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| error.as_str())
        })
        .or_else(|| json.get("detail").and_then(Value::as_str))
        .or_else(|| json.get("message").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_envelope() {
        let response = create_error(StatusCode::BAD_REQUEST, "Prompt is required");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": {
                "message": "Prompt is required",
                "type": "invalid_request_error",
                "code": 400
            }})
        );
    }

    #[tokio::test]
    async fn test_server_error_types() {
        for response in [
            create_error(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            create_error(StatusCode::BAD_GATEWAY, "upstream"),
        ] {
            let status = response.status().as_u16();
            let body = body_json(response).await;
            assert_eq!(body["error"]["type"], "server_error");
            assert_eq!(body["error"]["code"], status);
        }
    }

    #[test]
    fn test_upstream_openai_error() {
        let body = r#"{"error":{"message":"model `foo` does not exist","type":"invalid_request_error"}}"#;
        assert_eq!(
            upstream_error_message(reqwest::StatusCode::NOT_FOUND, body),
            "model `foo` does not exist"
        );
    }

    #[test]
    fn test_upstream_fastapi_detail() {
        let body = r#"{"detail":"Input validation error"}"#;
        assert_eq!(
            upstream_error_message(reqwest::StatusCode::UNPROCESSABLE_ENTITY, body),
            "Input validation error"
        );
    }

    #[test]
    fn test_upstream_plain_text_passthrough() {
        assert_eq!(
            upstream_error_message(reqwest::StatusCode::BAD_GATEWAY, "Bad Gateway\n"),
            "Bad Gateway"
        );
    }

    #[test]
    fn test_upstream_empty_body() {
        assert_eq!(
            upstream_error_message(reqwest::StatusCode::SERVICE_UNAVAILABLE, ""),
            "Backend returned error: 503 Service Unavailable"
        );
    }
}
