use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::session_user_id;
use super::{ApiError, ApiResponse, AppState, CategoryDto};
use crate::services::{CategoryUpdateInput, NewCategoryInput};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
    pub slug: Option<String>,
    pub expected_percent: Option<f64>,
    pub current_value: Option<f64>,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub expected_percent: Option<f64>,
    pub current_value: Option<f64>,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

/// GET /api/categories
/// All categories owned by the caller, sorted by name.
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<CategoryDto>>>, ApiError> {
    let user_id = session_user_id(&session).await?;

    let categories = state.portfolio().list_categories(user_id).await?;
    let dtos = categories.into_iter().map(CategoryDto::from).collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session_user_id(&session).await?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Name is required"));
    }

    let category = state
        .portfolio()
        .create_category(
            user_id,
            NewCategoryInput {
                name: payload.name,
                slug: payload.slug,
                expected_percent: payload.expected_percent,
                current_value: payload.current_value,
                display_name: payload.display_name,
                description: payload.description,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CategoryDto::from(category))),
    ))
}

/// GET /api/categories/export
/// Whole-portfolio CSV download.
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, ApiError> {
    let user_id = session_user_id(&session).await?;

    let csv = state.portfolio().export_csv(user_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"portfolio-export.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

/// GET /api/categories/{slug}
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    let user_id = session_user_id(&session).await?;

    let category = state.portfolio().get_category(user_id, &slug).await?;
    Ok(Json(ApiResponse::success(CategoryDto::from(category))))
}

/// PUT /api/categories/{slug}
/// Partial update; a slug change is re-normalized and checked for
/// duplicates against the caller's other categories.
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(slug): Path<String>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    let user_id = session_user_id(&session).await?;

    let category = state
        .portfolio()
        .update_category(
            user_id,
            &slug,
            CategoryUpdateInput {
                name: payload.name,
                slug: payload.slug,
                expected_percent: payload.expected_percent,
                current_value: payload.current_value,
                display_name: payload.display_name,
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(CategoryDto::from(category))))
}

/// DELETE /api/categories/{slug}
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    let user_id = session_user_id(&session).await?;

    let category = state.portfolio().delete_category(user_id, &slug).await?;
    Ok(Json(ApiResponse::success(CategoryDto::from(category))))
}
