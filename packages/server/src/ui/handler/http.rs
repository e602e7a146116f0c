//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use room21_shared::time::now_rfc3339;

use crate::{infrastructure::dto::http::StatsDto, ui::state::AppState};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// `GET /api/stats`: number of connected users
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsDto> {
    Json(StatsDto {
        active_users: state.get_stats.active_users().await,
        timestamp: now_rfc3339(),
    })
}
