use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use super::error::ApiError;
use super::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::models::{Booking, BookingWithShow, ShowWithMovie};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows/{id}/book", post(book_seat))
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/my-bookings", get(my_bookings))
}

/* ---------- BOOKINGS ---------- */

// POST /api/shows/{id}/book
#[derive(Debug, Deserialize)]
struct BookSeatRequest {
    seat_number: i32,
}

async fn book_seat(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(show_id): Path<i64>,
    ApiJson(req): ApiJson<BookSeatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .reservations
        .reserve_seat(show_id, req.seat_number, user.user_id)
        .await?;

    let shows = ShowWithMovie::find_by_ids(&state.db, &[booking.show_id]).await?;
    let mut rows = with_shows(vec![booking], shows)?;
    let row = rows
        .pop()
        .ok_or_else(|| ApiError::Internal("reserved booking vanished".to_string()))?;

    Ok((StatusCode::CREATED, Json(row)))
}

// POST /api/bookings/{id}/cancel
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .reservations
        .cancel_booking(booking_id, user.user_id)
        .await?;

    Ok(Json(json!({ "detail": "Booking cancelled." })))
}

// GET /api/my-bookings
async fn my_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = state.reservations.list_my_bookings(user.user_id).await?;

    let mut show_ids: Vec<i64> = bookings.iter().map(|b| b.show_id).collect();
    show_ids.sort_unstable();
    show_ids.dedup();
    let shows = ShowWithMovie::find_by_ids(&state.db, &show_ids).await?;

    Ok(Json(with_shows(bookings, shows)?))
}

/// Inlines each booking's show, keeping the order of `bookings`.
fn with_shows(
    bookings: Vec<Booking>,
    shows: Vec<ShowWithMovie>,
) -> Result<Vec<BookingWithShow>, ApiError> {
    let shows: HashMap<i64, ShowWithMovie> = shows.into_iter().map(|s| (s.id, s)).collect();

    bookings
        .into_iter()
        .map(|booking| {
            // Сеансы не удаляются (FK), так что промах означает рассинхрон
            let show = shows
                .get(&booking.show_id)
                .cloned()
                .ok_or_else(|| ApiError::Internal(format!("show {} missing", booking.show_id)))?;
            Ok(BookingWithShow::new(booking, show))
        })
        .collect()
}
