use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, MessageResponse, RegisterRequest, TokenResponse},
        repo_types::User,
        services::{hash_password, validate_register, verify_password, JwtKeys},
    },
    error::{is_unique_violation, AppError, AppResult},
    extractors::AppJson,
    state::AppState,
};

const DUPLICATE_USER: &str = "A user with this email or phone number already exists";
const BAD_CREDENTIALS: &str = "Invalid email or password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let new_user = validate_register(payload).map_err(|e| {
        warn!(error = %e, "invalid registration");
        e
    })?;

    if User::email_or_phone_taken(&state.db, &new_user.email, &new_user.phone).await? {
        warn!(email = %new_user.email, "email or phone already registered");
        return Err(AppError::conflict(DUPLICATE_USER));
    }

    let hash = hash_password(&new_user.password)?;

    let user = User::create(
        &state.db,
        &new_user.username,
        &new_user.phone,
        &new_user.email,
        &hash,
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            warn!(email = %new_user.email, "registration lost a uniqueness race");
            AppError::conflict(DUPLICATE_USER)
        } else {
            AppError::Internal(e)
        }
    })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Registration successful")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let email = payload.email.trim().to_lowercase();

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::Auth(BAD_CREDENTIALS.into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Auth(BAD_CREDENTIALS.into()));
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}
