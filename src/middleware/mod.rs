use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::sync::Arc;

use crate::controllers::error::ApiError;
use crate::services::auth::TokenType;
use crate::services::TokenService;

/// Аутентифицированный пользователь запроса.
///
/// Хендлеры, принимающие `AuthUser`, требуют авторизации; остальные открыты.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
}

/// Reads `Authorization: Bearer <access token>` from `headers`.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthUser, ApiError> {
    // Получаем заголовок Authorization
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    // Проверяем что это Bearer
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let claims = tokens.verify(token.trim(), TokenType::Access).map_err(|e| {
        tracing::debug!("rejected access token: {}", e);
        ApiError::Unauthorized
    })?;

    Ok(AuthUser {
        user_id: claims.sub,
        username: claims.username,
    })
}

// Bearer JWT extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, &state.tokens)
    }
}
