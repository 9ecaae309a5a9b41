use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Movie;

/// A scheduled screening. Seat capacity is fixed once the show exists.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Show {
    pub id: i64,
    pub movie_id: i64,
    pub screen_name: String,
    pub starts_at: DateTime<Utc>,
    pub total_seats: i32,
}

impl Show {
    /// Whether `seat_number` names a seat in this show's hall.
    pub fn has_seat(&self, seat_number: i32) -> bool {
        (1..=self.total_seats).contains(&seat_number)
    }
}

/// Show with its movie inlined, as returned by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowWithMovie {
    pub id: i64,
    pub movie: Movie,
    pub screen_name: String,
    pub starts_at: DateTime<Utc>,
    pub total_seats: i32,
}

#[derive(FromRow)]
struct ShowMovieRow {
    id: i64,
    screen_name: String,
    starts_at: DateTime<Utc>,
    total_seats: i32,
    movie_id: i64,
    title: String,
    duration_minutes: i32,
}

impl From<ShowMovieRow> for ShowWithMovie {
    fn from(row: ShowMovieRow) -> Self {
        ShowWithMovie {
            id: row.id,
            movie: Movie {
                id: row.movie_id,
                title: row.title,
                duration_minutes: row.duration_minutes,
            },
            screen_name: row.screen_name,
            starts_at: row.starts_at,
            total_seats: row.total_seats,
        }
    }
}

impl ShowWithMovie {
    pub async fn list_for_movie(
        db: &crate::database::Database,
        movie_id: i64,
    ) -> Result<Vec<ShowWithMovie>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ShowMovieRow>(
            r#"
            SELECT s.id, s.screen_name, s.starts_at, s.total_seats,
                   m.id AS movie_id, m.title, m.duration_minutes
            FROM shows s
            JOIN movies m ON m.id = s.movie_id
            WHERE s.movie_id = $1
            ORDER BY s.starts_at, s.id
            "#,
        )
        .bind(movie_id)
        .fetch_all(&db.pool)
        .await?;

        Ok(rows.into_iter().map(ShowWithMovie::from).collect())
    }

    /// Shows with the given ids, in no particular order. Unknown ids are skipped.
    pub async fn find_by_ids(
        db: &crate::database::Database,
        show_ids: &[i64],
    ) -> Result<Vec<ShowWithMovie>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ShowMovieRow>(
            r#"
            SELECT s.id, s.screen_name, s.starts_at, s.total_seats,
                   m.id AS movie_id, m.title, m.duration_minutes
            FROM shows s
            JOIN movies m ON m.id = s.movie_id
            WHERE s.id = ANY($1)
            "#,
        )
        .bind(show_ids)
        .fetch_all(&db.pool)
        .await?;

        Ok(rows.into_iter().map(ShowWithMovie::from).collect())
    }
}
