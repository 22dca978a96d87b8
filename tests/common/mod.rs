//! Shared fixtures: an in-memory OpenAI-compatible backend, a scripted
//! vision-language model, and request helpers.

#![allow(dead_code)]

use std::{
    io::Cursor,
    sync::{Arc, Mutex},
};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use grounding::backend::local::{EngineError, GenerationParams, ModelInput, VisionLanguageModel};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    reply: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// A running fake `/v1/chat/completions` server.
pub struct MockBackend {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    /// Answer every request with `status` and a raw `reply` body.
    pub async fn start(status: StatusCode, reply: impl Into<String>) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            reply: reply.into(),
            requests: requests.clone(),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(mock_chat_completions))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/v1", addr),
            requests,
        }
    }

    /// Reply 200 with a single-choice completion whose content is `content`.
    pub async fn completing(content: &str) -> Self {
        let reply = serde_json::json!({
            "id": "chatcmpl-upstream",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "tgi",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        });
        Self::start(StatusCode::OK, reply.to_string()).await
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("backend received no request")
    }
}

async fn mock_chat_completions(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .requests
        .lock()
        .unwrap()
        .push(RecordedRequest {
            authorization,
            body,
        });
    (
        state.status,
        [("content-type", "application/json")],
        state.reply.clone(),
    )
        .into_response()
}

/// What the scripted model saw on each call.
#[derive(Debug, Clone)]
pub struct SeenInput {
    pub text: String,
    pub dimensions: (u32, u32),
    pub params: GenerationParams,
}

/// Replies with a fixed string and records every input.
pub struct ScriptedModel {
    reply: String,
    template: bool,
    seen: Arc<Mutex<Vec<SeenInput>>>,
}

impl ScriptedModel {
    pub fn new(reply: &str) -> (Self, Arc<Mutex<Vec<SeenInput>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                reply: reply.to_string(),
                template: false,
                seen: seen.clone(),
            },
            seen,
        )
    }

    pub fn with_template(mut self) -> Self {
        self.template = true;
        self
    }
}

impl VisionLanguageModel for ScriptedModel {
    fn apply_chat_template(&self, prompt: &str) -> Result<String, EngineError> {
        if self.template {
            Ok(format!("<|im_start|>user\n<image>{prompt}<|im_end|>\n<|im_start|>assistant\n"))
        } else {
            Err(EngineError::Unsupported("chat template"))
        }
    }

    fn generate(&self, input: &ModelInput, params: &GenerationParams) -> Result<String, EngineError> {
        self.seen.lock().unwrap().push(SeenInput {
            text: input.text.clone(),
            dimensions: input.image.dimensions(),
            params: *params,
        });
        Ok(self.reply.clone())
    }
}

/// Base64 PNG of a solid `width` x `height` image, without a data-URL header.
pub fn png_base64(width: u32, height: u32) -> String {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    STANDARD.encode(bytes.into_inner())
}

pub fn png_data_url(width: u32, height: u32) -> String {
    format!("data:image/png;base64,{}", png_base64(width, height))
}

/// Send one request through the router and decode the JSON reply.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
