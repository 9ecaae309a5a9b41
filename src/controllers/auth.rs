use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::error::ApiError;
use super::extract::ApiJson;
use crate::models::User;
use crate::services::auth::{hash_password, AuthError};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/token/refresh", post(refresh_token))
}

/* ---------- SIGNUP ---------- */

// POST /api/signup
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Serialize)]
struct SignupResponse {
    id: i64,
    username: String,
    email: String,
}

async fn signup(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let cost = state.config.jwt.bcrypt_cost;
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let user = User::create(&req.username, &req.email, &password_hash, &state.db)
        .await?
        .ok_or_else(|| ApiError::BadRequest("A user with that username already exists.".to_string()))?;

    tracing::info!(user_id = user.id, "user signed up");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: user.id,
            username: user.username,
            email: user.email,
        }),
    ))
}

/* ---------- TOKENS ---------- */

// POST /api/login
#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = User::find_by_username(&req.username, &state.db)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let password = req.password;
    let (user, valid) = tokio::task::spawn_blocking(move || {
        let valid = user.verify_password(&password);
        (user, valid)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    if !valid {
        return Err(AuthError::InvalidCredentials.into());
    }

    let pair = state.tokens.issue_pair(user.id, &user.username)?;
    Ok(Json(pair))
}

// POST /api/token/refresh
#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh: String,
}

#[derive(Debug, Serialize)]
struct RefreshResponse {
    access: String,
}

async fn refresh_token(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.tokens.refresh(&req.refresh)?;
    Ok(Json(RefreshResponse { access }))
}
