use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ShowWithMovie;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Cancelled,
}

/// One user's claim on one seat of one show.
///
/// Rows are never deleted. Cancelling flips `status` to `Cancelled` and a
/// later reservation of the same seat creates a new row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub show_id: i64,
    pub user_id: i64,
    pub seat_number: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_booked(&self) -> bool {
        self.status == BookingStatus::Booked
    }
}

/// Booking as shown to its owner: the show and its movie inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingWithShow {
    pub id: i64,
    pub user_id: i64,
    pub show: ShowWithMovie,
    pub seat_number: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl BookingWithShow {
    pub fn new(booking: Booking, show: ShowWithMovie) -> Self {
        BookingWithShow {
            id: booking.id,
            user_id: booking.user_id,
            show,
            seat_number: booking.seat_number,
            status: booking.status,
            created_at: booking.created_at,
        }
    }
}
