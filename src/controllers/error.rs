//! Отображение ошибок сервисов в HTTP-ответы `{"detail": "..."}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{AuthError, BookingError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("authentication credentials were not provided or are invalid")]
    Unauthorized,

    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Тело запроса не разобралось как JSON нужной формы.
    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error("{0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Booking(e) => booking_status(e),
            ApiError::Auth(AuthError::Hash(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(_) | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) | ApiError::Json(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Booking(e) => booking_detail(e),
            ApiError::Auth(AuthError::InvalidCredentials) => {
                "No active account found with the given credentials.".to_string()
            }
            ApiError::Auth(AuthError::Hash(_)) => "Internal server error.".to_string(),
            ApiError::Auth(_) => "Token is invalid or expired.".to_string(),
            ApiError::Unauthorized => "Authentication credentials were not provided.".to_string(),
            ApiError::Validation(e) => e.to_string(),
            ApiError::Json(e) => e.body_text(),
            ApiError::BadRequest(m) | ApiError::NotFound(m) => m.clone(),
            // Внутренности БД наружу не отдаём
            ApiError::Database(_) | ApiError::Internal(_) => "Internal server error.".to_string(),
        }
    }
}

fn booking_status(e: &BookingError) -> StatusCode {
    match e {
        BookingError::ShowNotFound(_) | BookingError::BookingNotFound(_) => StatusCode::NOT_FOUND,
        BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
        BookingError::InvalidSeat(_)
        | BookingError::SeatTaken { .. }
        | BookingError::ShowFull(_)
        | BookingError::AlreadyCancelled(_) => StatusCode::BAD_REQUEST,
        BookingError::SeatTakenRace { .. } => StatusCode::CONFLICT,
        BookingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn booking_detail(e: &BookingError) -> String {
    match e {
        BookingError::ShowNotFound(_) => "Show not found.".to_string(),
        BookingError::BookingNotFound(_) => "Booking not found.".to_string(),
        BookingError::InvalidSeat(seat) => format!("Seat {} does not exist for this show.", seat),
        BookingError::Forbidden(_) => "You cannot cancel another user's booking.".to_string(),
        BookingError::SeatTaken { .. } => "Seat already booked.".to_string(),
        BookingError::SeatTakenRace { .. } => "Seat already booked (race).".to_string(),
        BookingError::ShowFull(_) => "Show is fully booked.".to_string(),
        BookingError::AlreadyCancelled(_) => "Booking already cancelled.".to_string(),
        BookingError::Store(_) => "Internal server error.".to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self);
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_errors_map_to_boundary_codes() {
        let cases = [
            (BookingError::ShowNotFound(1), StatusCode::NOT_FOUND),
            (BookingError::BookingNotFound(1), StatusCode::NOT_FOUND),
            (BookingError::Forbidden(1), StatusCode::FORBIDDEN),
            (BookingError::InvalidSeat(0), StatusCode::BAD_REQUEST),
            (BookingError::SeatTaken { show_id: 1, seat_number: 1 }, StatusCode::BAD_REQUEST),
            (BookingError::ShowFull(1), StatusCode::BAD_REQUEST),
            (BookingError::AlreadyCancelled(1), StatusCode::BAD_REQUEST),
            (BookingError::SeatTakenRace { show_id: 1, seat_number: 1 }, StatusCode::CONFLICT),
        ];

        for (err, expected) in cases {
            let msg = err.to_string();
            assert_eq!(ApiError::from(err).status(), expected, "{msg}");
        }
    }

    #[test]
    fn auth_failures_are_unauthorized() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn database_errors_hide_details() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Internal server error.");
    }

    #[tokio::test]
    async fn response_body_carries_detail() {
        let response = ApiError::from(BookingError::ShowFull(3)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["detail"], "Show is fully booked.");
    }
}
