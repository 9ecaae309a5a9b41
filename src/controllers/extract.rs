use axum::extract::FromRequest;

use super::error::ApiError;

/// `axum::Json` whose rejections answer through [`ApiError`] (400 with a
/// `{"detail": ...}` body) instead of axum's plain-text 4xx.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
