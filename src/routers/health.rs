use axum::{extract::State, Json};

use crate::{backend::HealthReport, server::AppState};

/// `GET /health`. Always 200; a model that failed to load shows up as
/// `"degraded"` in the body.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.backend.health())
}
