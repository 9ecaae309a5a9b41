//! Seat reservation engine.
//!
//! Every reservation runs inside the show's exclusive lock (see
//! [`BookingStore::lock_show`]), so reservations on the same show serialize
//! and reservations on different shows run in parallel. Inside the lock the
//! engine checks the seat, then the show's capacity, then inserts. The
//! storage-level uniqueness constraint on booked seats stays the final word:
//! if it rejects an insert the caller gets [`BookingError::SeatTakenRace`].
//!
//! The engine never retries. Every failure aborts the transaction.

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::models::{Booking, BookingStatus};
use crate::store::{BookingStore, InsertError, LockedShow, StoreError};

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("show not found: {0}")]
    ShowNotFound(i64),

    #[error("booking not found: {0}")]
    BookingNotFound(i64),

    #[error("seat {0} does not exist in this show")]
    InvalidSeat(i32),

    #[error("booking {0} belongs to another user")]
    Forbidden(i64),

    #[error("seat {seat_number} of show {show_id} is already booked")]
    SeatTaken { show_id: i64, seat_number: i32 },

    /// The application check passed but the storage uniqueness constraint
    /// rejected the insert.
    #[error("seat {seat_number} of show {show_id} was booked concurrently")]
    SeatTakenRace { show_id: i64, seat_number: i32 },

    #[error("show {0} is fully booked")]
    ShowFull(i64),

    #[error("booking {0} is already cancelled")]
    AlreadyCancelled(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct ReservationService<S> {
    store: S,
}

impl<S: BookingStore> ReservationService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Books `seat_number` of `show_id` for `user_id`.
    ///
    /// First committer wins. A loser gets [`BookingError::SeatTaken`] or
    /// [`BookingError::SeatTakenRace`] and no row is written.
    #[instrument(skip(self))]
    pub async fn reserve_seat(
        &self,
        show_id: i64,
        seat_number: i32,
        user_id: i64,
    ) -> Result<Booking, BookingError> {
        // Номер места проверяем до любого обращения к хранилищу
        if seat_number < 1 {
            return Err(BookingError::InvalidSeat(seat_number));
        }

        let show = self
            .store
            .get_show(show_id)
            .await?
            .ok_or(BookingError::ShowNotFound(show_id))?;

        if !show.has_seat(seat_number) {
            return Err(BookingError::InvalidSeat(seat_number));
        }

        let mut locked = self
            .store
            .lock_show(show_id)
            .await?
            .ok_or(BookingError::ShowNotFound(show_id))?;

        // Дальше держим блокировку сеанса; любой return откатывает транзакцию
        if locked.booked_seat_exists(seat_number).await? {
            return Err(BookingError::SeatTaken { show_id, seat_number });
        }

        let booked = locked.count_booked_seats().await?;
        if booked >= i64::from(locked.show().total_seats) {
            return Err(BookingError::ShowFull(show_id));
        }

        let booking = match locked.insert_booking(seat_number, user_id).await {
            Ok(booking) => booking,
            Err(InsertError::UniqueViolation) => {
                warn!(show_id, seat_number, "seat conflict caught by the uniqueness constraint");
                return Err(BookingError::SeatTakenRace { show_id, seat_number });
            }
            Err(InsertError::Store(e)) => return Err(e.into()),
        };

        locked.commit().await?;

        info!(booking_id = booking.id, "seat reserved");
        Ok(booking)
    }

    /// Cancels a booked seat on behalf of its owner.
    ///
    /// Cancelling twice is an error, not a no-op.
    #[instrument(skip(self))]
    pub async fn cancel_booking(&self, booking_id: i64, user_id: i64) -> Result<Booking, BookingError> {
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        if booking.user_id != user_id {
            return Err(BookingError::Forbidden(booking_id));
        }
        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled(booking_id));
        }

        let updated = self
            .store
            .update_booking_status(booking_id, BookingStatus::Booked, BookingStatus::Cancelled)
            .await?;
        if !updated {
            // Параллельная отмена успела раньше
            return Err(BookingError::AlreadyCancelled(booking_id));
        }

        info!(show_id = booking.show_id, seat_number = booking.seat_number, "booking cancelled");
        Ok(Booking {
            status: BookingStatus::Cancelled,
            ..booking
        })
    }

    /// The user's bookings, most recent first.
    pub async fn list_my_bookings(&self, user_id: i64) -> Result<Vec<Booking>, BookingError> {
        Ok(self.store.list_bookings_for_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;

    async fn service_with_show(total_seats: i32) -> (ReservationService<MemoryStore>, i64) {
        let store = MemoryStore::new();
        let show = store.add_show(1, total_seats, Utc::now()).await;
        (ReservationService::new(store), show.id)
    }

    #[tokio::test]
    async fn reserve_then_same_seat_is_taken() {
        let (svc, show_id) = service_with_show(10).await;

        let booking = svc.reserve_seat(show_id, 3, 1).await.unwrap();
        assert_eq!(booking.seat_number, 3);
        assert_eq!(booking.status, BookingStatus::Booked);

        let err = svc.reserve_seat(show_id, 3, 2).await.unwrap_err();
        assert!(matches!(err, BookingError::SeatTaken { seat_number: 3, .. }));
    }

    #[tokio::test]
    async fn unknown_show_is_not_found() {
        let (svc, _) = service_with_show(10).await;
        let err = svc.reserve_seat(999, 1, 1).await.unwrap_err();
        assert!(matches!(err, BookingError::ShowNotFound(999)));
    }

    #[tokio::test]
    async fn out_of_range_seats_are_invalid() {
        let (svc, show_id) = service_with_show(10).await;

        for seat in [0, -1, 11] {
            let err = svc.reserve_seat(show_id, seat, 1).await.unwrap_err();
            assert!(matches!(err, BookingError::InvalidSeat(s) if s == seat), "seat {seat}: {err:?}");
        }
        assert!(svc.store().bookings_for_show(show_id).await.is_empty());
    }

    #[tokio::test]
    async fn cancel_unknown_booking_is_not_found() {
        let (svc, _) = service_with_show(10).await;
        let err = svc.cancel_booking(42, 1).await.unwrap_err();
        assert!(matches!(err, BookingError::BookingNotFound(42)));
    }

    #[tokio::test]
    async fn cancel_returns_cancelled_booking() {
        let (svc, show_id) = service_with_show(10).await;
        let booking = svc.reserve_seat(show_id, 1, 7).await.unwrap();

        let cancelled = svc.cancel_booking(booking.id, 7).await.unwrap();
        assert_eq!(cancelled.id, booking.id);
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }
}
