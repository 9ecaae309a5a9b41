use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    // Найти пользователя по имени
    pub async fn find_by_username(
        username: &str,
        db: &crate::database::Database,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, date_joined FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&db.pool)
        .await
    }

    /// Inserts a new user. Returns `None` when the username is already taken.
    pub async fn create(
        username: &str,
        email: &str,
        password_hash: &str,
        db: &crate::database::Database,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, email, password_hash, date_joined
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&db.pool)
        .await
    }

    // Проверить пароль по bcrypt-хешу
    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}
