use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::cache::CacheService;
use crate::models::{Movie, ShowWithMovie};

const MOVIES_KEY: &str = "catalog:movies";

fn shows_key(movie_id: i64) -> String {
    format!("catalog:movie:{}:shows", movie_id)
}

impl CacheService {
    /// Все фильмы: сначала кеш, потом БД.
    pub async fn get_movies(&self) -> Result<Vec<Movie>, sqlx::Error> {
        if let Some(movies) = self.read::<Vec<Movie>>(MOVIES_KEY).await {
            return Ok(movies);
        }

        let movies = Movie::list(&self.db).await?;
        self.write(MOVIES_KEY, &movies).await;
        Ok(movies)
    }

    /// Сеансы фильма. `None` если фильма нет.
    pub async fn get_shows_for_movie(&self, movie_id: i64) -> Result<Option<Vec<ShowWithMovie>>, sqlx::Error> {
        let key = shows_key(movie_id);
        if let Some(shows) = self.read::<Vec<ShowWithMovie>>(&key).await {
            return Ok(Some(shows));
        }

        if !Movie::exists(&self.db, movie_id).await? {
            return Ok(None);
        }

        let shows = ShowWithMovie::list_for_movie(&self.db, movie_id).await?;
        self.write(&key, &shows).await;
        Ok(Some(shows))
    }

    // === Работа с кешем ===
    // Ошибки Redis не пробрасываем - просто идём в БД

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = match conn.get(key).await {
            Ok(data) => data,
            Err(e) => {
                warn!("cache read {} failed: {:?}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&data?) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("cache entry {} is corrupt: {:?}", key, e);
                None
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) {
        let data = match serde_json::to_string(value) {
            Ok(data) => data,
            Err(e) => {
                warn!("cache serialize {} failed: {:?}", key, e);
                return;
            }
        };

        let mut conn = self.redis.conn.clone();
        let result: Result<(), redis::RedisError> = conn.set_ex(key, data, self.ttl_seconds).await;
        if let Err(e) = result {
            warn!("cache write {} failed: {:?}", key, e);
        }
    }
}
