use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    routes::health::health_response::HealthResponse,
};

/// `GET /health`: liveness plus the number of open chat sessions.
pub async fn health_route(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "ok",
        active_sessions: state.active_sessions(),
    }))
}
