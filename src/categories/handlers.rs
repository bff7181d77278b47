use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{dto::CategoryRequest, repo, repo_types::Category, services::normalize_name};
use crate::{
    auth::{services::ensure_owner, AuthUser},
    error::{is_unique_violation, AppError, AppResult},
    extractors::{AppJson, AppPath},
    state::AppState,
};

const DUPLICATE_NAME: &str = "A category with this name already exists";

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", put(update_category).delete(delete_category))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<Category>>> {
    let categories = repo::list_by_author(&state.db, user_id).await?;
    Ok(Json(categories))
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CategoryRequest>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let name = normalize_name(payload.name)?;

    if repo::name_taken(&state.db, user_id, &name, None).await? {
        warn!(%user_id, %name, "duplicate category");
        return Err(AppError::conflict(DUPLICATE_NAME));
    }

    let category = repo::insert(&state.db, user_id, &name)
        .await
        .map_err(conflict_or_internal)?;

    info!(%user_id, category_id = %category.id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(state, payload))]
pub async fn update_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> AppResult<Json<Category>> {
    let name = normalize_name(payload.name)?;

    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))?;
    ensure_owner(existing.author_id, user_id, "category")?;

    if repo::name_taken(&state.db, user_id, &name, Some(id)).await? {
        warn!(%user_id, %name, "rename collides with another category");
        return Err(AppError::conflict(DUPLICATE_NAME));
    }

    let category = repo::rename(&state.db, id, &name)
        .await
        .map_err(conflict_or_internal)?;

    info!(%user_id, category_id = %id, "category renamed");
    Ok(Json(category))
}

#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))?;
    ensure_owner(existing.author_id, user_id, "category")?;

    repo::delete(&state.db, id).await?;

    info!(%user_id, category_id = %id, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn conflict_or_internal(e: anyhow::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::conflict(DUPLICATE_NAME)
    } else {
        AppError::Internal(e)
    }
}
