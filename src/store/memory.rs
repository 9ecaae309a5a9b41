//! In-process [`BookingStore`] used by tests and benchmarks.
//!
//! Each show gets its own `tokio::sync::Mutex`, so waiting for a busy show
//! suspends the task instead of spinning. Writes made through a
//! [`MemoryLockedShow`] stay private to it until commit, mirroring a database
//! transaction.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::{BookingStore, InsertError, LockedShow, StoreError};
use crate::models::{Booking, BookingStatus, Show};

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    shows: RwLock<HashMap<i64, Show>>,
    show_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
    bookings: Mutex<BTreeMap<i64, Booking>>,
    next_show_id: AtomicI64,
    next_booking_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a show and returns it with its assigned id.
    pub async fn add_show(&self, movie_id: i64, total_seats: i32, starts_at: DateTime<Utc>) -> Show {
        let id = self.inner.next_show_id.fetch_add(1, Ordering::Relaxed) + 1;
        let show = Show {
            id,
            movie_id,
            screen_name: format!("Screen {id}"),
            starts_at,
            total_seats,
        };
        self.inner.shows.write().await.insert(id, show.clone());
        show
    }

    /// Writes a booking row directly, skipping the reservation protocol.
    ///
    /// Models rows that already exist in the ledger, e.g. imported data.
    pub async fn insert_raw_booking(
        &self,
        show_id: i64,
        seat_number: i32,
        user_id: i64,
        status: BookingStatus,
    ) -> Booking {
        let booking = self.inner.new_booking(show_id, seat_number, user_id, status);
        self.inner
            .bookings
            .lock()
            .await
            .insert(booking.id, booking.clone());
        booking
    }

    /// Committed bookings of one show, in insertion order.
    pub async fn bookings_for_show(&self, show_id: i64) -> Vec<Booking> {
        self.inner
            .bookings
            .lock()
            .await
            .values()
            .filter(|b| b.show_id == show_id)
            .cloned()
            .collect()
    }
}

impl Inner {
    fn new_booking(&self, show_id: i64, seat_number: i32, user_id: i64, status: BookingStatus) -> Booking {
        Booking {
            id: self.next_booking_id.fetch_add(1, Ordering::Relaxed) + 1,
            show_id,
            user_id,
            seat_number,
            status,
            created_at: Utc::now(),
        }
    }

    async fn show_lock(&self, show_id: i64) -> Arc<Mutex<()>> {
        self.show_locks
            .lock()
            .await
            .entry(show_id)
            .or_default()
            .clone()
    }
}

impl BookingStore for MemoryStore {
    type Locked = MemoryLockedShow;

    async fn get_show(&self, show_id: i64) -> Result<Option<Show>, StoreError> {
        Ok(self.inner.shows.read().await.get(&show_id).cloned())
    }

    async fn lock_show(&self, show_id: i64) -> Result<Option<MemoryLockedShow>, StoreError> {
        if !self.inner.shows.read().await.contains_key(&show_id) {
            return Ok(None);
        }

        let guard = self.inner.show_lock(show_id).await.lock_owned().await;

        // Строку сеанса читаем уже под блокировкой
        let Some(show) = self.inner.shows.read().await.get(&show_id).cloned() else {
            return Ok(None);
        };

        Ok(Some(MemoryLockedShow {
            store: self.inner.clone(),
            show,
            pending: Vec::new(),
            _guard: guard,
        }))
    }

    async fn get_booking(&self, booking_id: i64) -> Result<Option<Booking>, StoreError> {
        Ok(self.inner.bookings.lock().await.get(&booking_id).cloned())
    }

    async fn update_booking_status(
        &self,
        booking_id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool, StoreError> {
        let mut bookings = self.inner.bookings.lock().await;
        match bookings.get_mut(&booking_id) {
            Some(booking) if booking.status == from => {
                booking.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, StoreError> {
        let mut mine: Vec<Booking> = self
            .inner
            .bookings
            .lock()
            .await
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(mine)
    }
}

pub struct MemoryLockedShow {
    store: Arc<Inner>,
    show: Show,
    pending: Vec<Booking>,
    _guard: OwnedMutexGuard<()>,
}

impl MemoryLockedShow {
    fn is_booked_seat(&self, booking: &Booking, seat_number: i32) -> bool {
        booking.show_id == self.show.id && booking.seat_number == seat_number && booking.is_booked()
    }
}

impl LockedShow for MemoryLockedShow {
    fn show(&self) -> &Show {
        &self.show
    }

    async fn booked_seat_exists(&mut self, seat_number: i32) -> Result<bool, StoreError> {
        if self.pending.iter().any(|b| self.is_booked_seat(b, seat_number)) {
            return Ok(true);
        }
        let bookings = self.store.bookings.lock().await;
        Ok(bookings.values().any(|b| self.is_booked_seat(b, seat_number)))
    }

    async fn count_booked_seats(&mut self) -> Result<i64, StoreError> {
        let show_id = self.show.id;
        let committed = self
            .store
            .bookings
            .lock()
            .await
            .values()
            .filter(|b| b.show_id == show_id && b.is_booked())
            .count();
        Ok((committed + self.pending.len()) as i64)
    }

    async fn insert_booking(&mut self, seat_number: i32, user_id: i64) -> Result<Booking, InsertError> {
        let taken = {
            let bookings = self.store.bookings.lock().await;
            bookings.values().any(|b| self.is_booked_seat(b, seat_number))
        };
        if taken || self.pending.iter().any(|b| self.is_booked_seat(b, seat_number)) {
            return Err(InsertError::UniqueViolation);
        }

        let booking = self
            .store
            .new_booking(self.show.id, seat_number, user_id, BookingStatus::Booked);
        self.pending.push(booking.clone());
        Ok(booking)
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut bookings = self.store.bookings.lock().await;
        for booking in self.pending {
            bookings.insert(booking.id, booking);
        }
        Ok(())
    }
}
