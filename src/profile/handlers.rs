use axum::{extract::State, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use super::dto::{ProfileResponse, UpdateProfileRequest};
use super::{repo, services};
use crate::{
    auth::{dto::MessageResponse, repo_types::User, AuthUser},
    categories, recipes,
    error::{is_unique_violation, AppError, AppResult},
    extractors::AppJson,
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ProfileResponse>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let recipes_count = recipes::repo::count_by_author(&state.db, user_id).await?;
    let categories_count = categories::repo::count_by_author(&state.db, user_id).await?;

    let today = OffsetDateTime::now_utc().date();
    Ok(Json(ProfileResponse {
        age: user.birth_date.map(|b| services::age_on(b, today)),
        username: user.username,
        email: user.email,
        phone: user.phone,
        birth_date: user.birth_date.map(|d| d.to_string()),
        recipes_count,
        categories_count,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let changes = services::plan_changes(payload, &user.password_hash).map_err(|e| {
        warn!(%user_id, error = %e, "rejected profile update");
        e
    })?;
    let password_changed = changes.password_hash.is_some();

    repo::update_user(&state.db, user_id, changes)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!(%user_id, "profile update collides with another account");
                AppError::conflict("Email or phone number is already taken")
            } else {
                AppError::Internal(e)
            }
        })?;

    info!(%user_id, password_changed, "profile updated");
    Ok(Json(MessageResponse::new("Profile updated")))
}
