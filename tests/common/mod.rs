#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use cinema_booking::models::{Booking, BookingStatus, Show};
use cinema_booking::services::ReservationService;
use cinema_booking::store::memory::MemoryLockedShow;
use cinema_booking::store::{BookingStore, InsertError, LockedShow, MemoryStore, StoreError};

pub async fn service_with_show(total_seats: i32) -> (Arc<ReservationService<MemoryStore>>, Show) {
    let store = MemoryStore::new();
    let show = store.add_show(1, total_seats, Utc::now()).await;
    (Arc::new(ReservationService::new(store)), show)
}

/// Booked rows per seat for one show, as committed in the store.
pub async fn booked_seats(store: &MemoryStore, show_id: i64) -> Vec<i32> {
    let mut seats: Vec<i32> = store
        .bookings_for_show(show_id)
        .await
        .into_iter()
        .filter(Booking::is_booked)
        .map(|b| b.seat_number)
        .collect();
    seats.sort_unstable();
    seats
}

/// Wraps [`MemoryStore`] to count calls and to inject faults.
#[derive(Default)]
pub struct SpyStore {
    pub inner: MemoryStore,
    /// Seats added to `total_seats` by the catalog read only; the locked row
    /// keeps the real capacity.
    pub catalog_extra_seats: i32,
    /// Makes the locked seat check report every seat as free.
    pub blind_seat_check: bool,
    pub get_show_calls: AtomicUsize,
    pub lock_calls: AtomicUsize,
}

impl SpyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn touched(&self) -> (usize, usize) {
        (
            self.get_show_calls.load(Ordering::SeqCst),
            self.lock_calls.load(Ordering::SeqCst),
        )
    }
}

pub struct SpyLocked {
    inner: MemoryLockedShow,
    blind: bool,
}

impl BookingStore for SpyStore {
    type Locked = SpyLocked;

    async fn get_show(&self, show_id: i64) -> Result<Option<Show>, StoreError> {
        self.get_show_calls.fetch_add(1, Ordering::SeqCst);
        let show = self.inner.get_show(show_id).await?;
        Ok(show.map(|mut show| {
            show.total_seats += self.catalog_extra_seats;
            show
        }))
    }

    async fn lock_show(&self, show_id: i64) -> Result<Option<SpyLocked>, StoreError> {
        self.lock_calls.fetch_add(1, Ordering::SeqCst);
        let locked = self.inner.lock_show(show_id).await?;
        Ok(locked.map(|inner| SpyLocked {
            inner,
            blind: self.blind_seat_check,
        }))
    }

    async fn get_booking(&self, booking_id: i64) -> Result<Option<Booking>, StoreError> {
        self.inner.get_booking(booking_id).await
    }

    async fn update_booking_status(
        &self,
        booking_id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool, StoreError> {
        self.inner.update_booking_status(booking_id, from, to).await
    }

    async fn list_bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, StoreError> {
        self.inner.list_bookings_for_user(user_id).await
    }
}

impl LockedShow for SpyLocked {
    fn show(&self) -> &Show {
        self.inner.show()
    }

    async fn booked_seat_exists(&mut self, seat_number: i32) -> Result<bool, StoreError> {
        if self.blind {
            return Ok(false);
        }
        self.inner.booked_seat_exists(seat_number).await
    }

    async fn count_booked_seats(&mut self) -> Result<i64, StoreError> {
        self.inner.count_booked_seats().await
    }

    async fn insert_booking(&mut self, seat_number: i32, user_id: i64) -> Result<Booking, InsertError> {
        self.inner.insert_booking(seat_number, user_id).await
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.inner.commit().await
    }
}
