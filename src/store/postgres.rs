use sqlx::{Postgres, Transaction};
use tracing::debug;

use super::{BookingStore, InsertError, LockedShow, StoreError};
use crate::database::Database;
use crate::models::{Booking, BookingStatus, Show};

const SHOW_COLUMNS: &str = "id, movie_id, screen_name, starts_at, total_seats";
const BOOKING_COLUMNS: &str = "id, show_id, user_id, seat_number, status, created_at";

/// Name of the partial unique index guarding one booked row per seat.
const ONE_BOOKED_PER_SEAT: &str = "bookings_one_booked_per_seat";

#[derive(Clone)]
pub struct PgBookingStore {
    db: Database,
}

impl PgBookingStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl BookingStore for PgBookingStore {
    type Locked = PgLockedShow;

    async fn get_show(&self, show_id: i64) -> Result<Option<Show>, StoreError> {
        let show = sqlx::query_as::<_, Show>(&format!("SELECT {SHOW_COLUMNS} FROM shows WHERE id = $1"))
            .bind(show_id)
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(show)
    }

    async fn lock_show(&self, show_id: i64) -> Result<Option<PgLockedShow>, StoreError> {
        let mut tx = self.db.pool.begin().await?;

        // Блокировка строки сеанса: конкурирующие брони на тот же сеанс ждут здесь
        let show = sqlx::query_as::<_, Show>(&format!(
            "SELECT {SHOW_COLUMNS} FROM shows WHERE id = $1 FOR UPDATE"
        ))
        .bind(show_id)
        .fetch_optional(&mut *tx)
        .await?;

        match show {
            Some(show) => Ok(Some(PgLockedShow { tx, show })),
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }

    async fn get_booking(&self, booking_id: i64) -> Result<Option<Booking>, StoreError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(booking)
    }

    async fn update_booking_status(
        &self,
        booking_id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE bookings SET status = $3 WHERE id = $1 AND status = $2")
            .bind(booking_id)
            .bind(from)
            .bind(to)
            .execute(&self.db.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, StoreError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(bookings)
    }
}

/// Open transaction holding `FOR UPDATE` on one `shows` row.
///
/// Dropping it without [`LockedShow::commit`] rolls the transaction back.
pub struct PgLockedShow {
    tx: Transaction<'static, Postgres>,
    show: Show,
}

impl LockedShow for PgLockedShow {
    fn show(&self) -> &Show {
        &self.show
    }

    async fn booked_seat_exists(&mut self, seat_number: i32) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
              SELECT 1 FROM bookings
              WHERE show_id = $1 AND seat_number = $2 AND status = 'booked'
            )
            "#,
        )
        .bind(self.show.id)
        .bind(seat_number)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn count_booked_seats(&mut self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookings WHERE show_id = $1 AND status = 'booked'",
        )
        .bind(self.show.id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count)
    }

    async fn insert_booking(&mut self, seat_number: i32, user_id: i64) -> Result<Booking, InsertError> {
        let inserted = sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings (show_id, user_id, seat_number, status)
            VALUES ($1, $2, $3, 'booked')
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(self.show.id)
        .bind(user_id)
        .bind(seat_number)
        .fetch_one(&mut *self.tx)
        .await;

        match inserted {
            Ok(booking) => Ok(booking),
            Err(sqlx::Error::Database(e))
                if e.is_unique_violation() && e.constraint() == Some(ONE_BOOKED_PER_SEAT) =>
            {
                debug!(show_id = self.show.id, seat_number, "unique index rejected booking insert");
                Err(InsertError::UniqueViolation)
            }
            Err(e) => Err(StoreError::from(e).into()),
        }
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
