use crate::{database::Database, models::ShowWithMovie, redis_client::RedisClient};
use tracing::{info, warn};

pub mod catalog;

#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    db: Database,
    ttl_seconds: u64,
}

impl CacheService {
    pub fn new(redis: RedisClient, db: Database, ttl_seconds: u64) -> Self {
        Self { redis, db, ttl_seconds }
    }

    // Прогрев кеша при старте
    pub async fn warmup_cache(&self) {
        info!("Starting cache warmup...");

        let movies = match self.get_movies().await {
            Ok(movies) => movies,
            Err(e) => {
                warn!("cache warmup: movie list failed: {:?}", e);
                return;
            }
        };
        let results = futures::future::join_all(
            movies.iter().map(|movie| self.get_shows_for_movie(movie.id)),
        )
        .await;

        let shows = count_warmed_shows(movies.iter().map(|m| m.id).zip(results));
        info!(movies = movies.len(), shows, "Cache warmup done");
    }
}

/// Sums the warmed show lists, logging every movie whose lookup failed.
fn count_warmed_shows<E: std::fmt::Debug>(
    results: impl IntoIterator<Item = (i64, Result<Option<Vec<ShowWithMovie>>, E>)>,
) -> usize {
    results
        .into_iter()
        .map(|(movie_id, result)| match result {
            Ok(shows) => shows.map_or(0, |s| s.len()),
            Err(e) => {
                warn!("cache warmup: shows of movie {} failed: {:?}", movie_id, e);
                0
            }
        })
        .sum()
}
