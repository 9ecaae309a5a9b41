//! Persistence seam for the seat ledger.
//!
//! [`BookingStore`] covers catalog reads and single-row booking operations.
//! [`LockedShow`] is the handle returned by [`BookingStore::lock_show`]: it
//! holds the show's exclusive lock and an open transaction until it is
//! committed or dropped. Dropping without commit discards every write made
//! through the handle.

use std::future::Future;

use thiserror::Error;

use crate::models::{Booking, BookingStatus, Show};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgBookingStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Failure of [`LockedShow::insert_booking`].
#[derive(Debug, Error)]
pub enum InsertError {
    /// The one-booked-row-per-seat constraint rejected the insert.
    #[error("seat already has a booked row")]
    UniqueViolation,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub trait BookingStore: Send + Sync {
    type Locked: LockedShow;

    /// Catalog read, outside any reservation transaction.
    fn get_show(
        &self,
        show_id: i64,
    ) -> impl Future<Output = Result<Option<Show>, StoreError>> + Send + '_;

    /// Opens a transaction and takes the exclusive lock of one show.
    ///
    /// Waits while another transaction holds the same show. Locks of
    /// different shows are independent. Returns `None` if the show does not
    /// exist.
    fn lock_show(
        &self,
        show_id: i64,
    ) -> impl Future<Output = Result<Option<Self::Locked>, StoreError>> + Send + '_;

    fn get_booking(
        &self,
        booking_id: i64,
    ) -> impl Future<Output = Result<Option<Booking>, StoreError>> + Send + '_;

    /// Single-row status change, applied only while the row is still in
    /// `from`. Returns whether the row was changed.
    fn update_booking_status(
        &self,
        booking_id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send + '_;

    /// All bookings of a user, newest `created_at` first, ties by id descending.
    fn list_bookings_for_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<Booking>, StoreError>> + Send + '_;
}

pub trait LockedShow: Send {
    /// The show row as read under the lock.
    fn show(&self) -> &Show;

    fn booked_seat_exists(
        &mut self,
        seat_number: i32,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send + '_;

    fn count_booked_seats(&mut self) -> impl Future<Output = Result<i64, StoreError>> + Send + '_;

    fn insert_booking(
        &mut self,
        seat_number: i32,
        user_id: i64,
    ) -> impl Future<Output = Result<Booking, InsertError>> + Send + '_;

    /// Makes the inserted rows visible and releases the lock.
    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
