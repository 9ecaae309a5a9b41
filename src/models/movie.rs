use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub duration_minutes: i32,
}

impl Movie {
    pub async fn list(db: &crate::database::Database) -> Result<Vec<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>("SELECT id, title, duration_minutes FROM movies ORDER BY id")
            .fetch_all(&db.pool)
            .await
    }

    pub async fn exists(db: &crate::database::Database, movie_id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM movies WHERE id = $1)")
            .bind(movie_id)
            .fetch_one(&db.pool)
            .await
    }
}
