use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub users: u64,
    pub categories: u64,
    pub database_ok: bool,
}

/// GET /api/system/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let database_ok = state.store().ping().await.is_ok();

    let users = state
        .store()
        .count_users()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to count users: {e}")))?;

    let categories = state
        .store()
        .count_categories()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to count categories: {e}")))?;

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        users,
        categories,
        database_ok,
    })))
}
