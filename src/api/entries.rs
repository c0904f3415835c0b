use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::session_user_id;
use super::types::double_option;
use super::{ApiError, ApiResponse, AppState, CategoryDto};
use crate::services::{EntryUpdateInput, NewEntryInput};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntryRequest {
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub invested: Option<f64>,
    /// Stored only when present; an explicit 0 is kept, an omitted or null
    /// field leaves the entry without a current value.
    pub current_value: Option<f64>,
    pub expected_percent: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    pub entry_index: Option<usize>,
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub invested: Option<f64>,
    /// Absent = leave alone, null = clear, value = set.
    #[serde(default, deserialize_with = "double_option")]
    pub current_value: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub expected_percent: Option<Option<f64>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEntryQuery {
    pub entry_index: Option<usize>,
}

/// POST /api/categories/{slug}/entries
pub async fn add_entry(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(slug): Path<String>,
    Json(payload): Json<AddEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session_user_id(&session).await?;

    let (Some(name), Some(quantity), Some(invested)) =
        (payload.name, payload.quantity, payload.invested)
    else {
        return Err(ApiError::validation(
            "Name, quantity, and invested are required",
        ));
    };

    let category = state
        .portfolio()
        .add_entry(
            user_id,
            &slug,
            NewEntryInput {
                name,
                quantity,
                invested,
                current_value: payload.current_value,
                expected_percent: payload.expected_percent,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CategoryDto::from(category))),
    ))
}

/// PUT /api/categories/{slug}/entries
/// Entries are addressed by their position in the category's list.
pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(slug): Path<String>,
    Json(payload): Json<UpdateEntryRequest>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    let user_id = session_user_id(&session).await?;

    let Some(entry_index) = payload.entry_index else {
        return Err(ApiError::validation("entryIndex is required"));
    };

    let category = state
        .portfolio()
        .update_entry(
            user_id,
            &slug,
            EntryUpdateInput {
                entry_index,
                name: payload.name,
                quantity: payload.quantity,
                invested: payload.invested,
                current_value: payload.current_value,
                expected_percent: payload.expected_percent,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(CategoryDto::from(category))))
}

/// DELETE /api/categories/{slug}/entries?entryIndex=N
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(slug): Path<String>,
    Query(query): Query<DeleteEntryQuery>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    let user_id = session_user_id(&session).await?;

    let Some(entry_index) = query.entry_index else {
        return Err(ApiError::validation("entryIndex is required"));
    };

    let category = state
        .portfolio()
        .delete_entry(user_id, &slug, entry_index)
        .await?;

    Ok(Json(ApiResponse::success(CategoryDto::from(category))))
}
