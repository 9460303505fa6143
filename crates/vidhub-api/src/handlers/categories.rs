use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
use vidhub_core::models::{Category, CreateCategoryRequest, UpdateCategoryRequest, Video};
use vidhub_core::AppError;

fn category_not_found() -> AppError {
    AppError::NotFound("Category not found".to_string())
}

fn normalized_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput(
            "Category name cannot be blank".to_string(),
        ));
    }
    Ok(name)
}

#[utoipa::path(
    get,
    path = "/api/v0/categories",
    tag = "categories",
    responses(
        (status = 200, description = "All categories", body = Vec<Category>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let categories = state.db.categories.list_categories().await?;
    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/v0/categories",
    tag = "categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 409, description = "Category already exists", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(name = %request.name))]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let name = normalized_name(&request.name)?;

    let category = state.db.categories.create_category(name).await?;
    tracing::info!(category_id = %category.id, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/api/v0/categories/{id}",
    tag = "categories",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category renamed", body = Category),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category already exists", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(category_id = %id))]
pub async fn update_category(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let name = normalized_name(&request.name)?;

    let category = state
        .db
        .categories
        .update_category(id, name)
        .await?
        .ok_or_else(category_not_found)?;
    Ok(Json(category))
}

/// Delete a category. Refused with 400 while videos still reference it.
#[utoipa::path(
    delete,
    path = "/api/v0/categories/{id}",
    tag = "categories",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 400, description = "Category still has videos", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(category_id = %id))]
pub async fn delete_category(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .db
        .categories
        .delete_category(id)
        .await?
        .ok_or_else(category_not_found)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v0/categories/{id}/videos",
    tag = "categories",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Videos in the category, newest first", body = Vec<Video>),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(category_id = %id))]
pub async fn list_category_videos(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .db
        .categories
        .get_category(id)
        .await?
        .ok_or_else(category_not_found)?;

    let videos = state.db.videos.list_videos_by_category(id).await?;
    Ok(Json(videos))
}
