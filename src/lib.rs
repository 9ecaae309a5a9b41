pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod services;
pub mod store;

use anyhow::Context;
use std::sync::Arc;

use crate::services::{ReservationService, TokenService};
use crate::store::PgBookingStore;

// Shared state для всего приложения
pub struct AppState {
    pub db: database::Database,
    pub cache: cache::CacheService,
    pub config: config::Config,
    pub tokens: TokenService,
    pub reservations: ReservationService<PgBookingStore>,
}

impl AppState {
    /// Connects to Postgres and Redis and applies pending migrations.
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        tracing::info!("Database connected");

        db.run_migrations()
            .await
            .context("failed to run migrations")?;

        let redis = redis_client::RedisClient::connect(&config.redis.url)
            .await
            .context("failed to connect to Redis")?;
        tracing::info!("Redis connected");

        let cache = cache::CacheService::new(redis, db.clone(), config.cache.catalog_ttl_seconds);
        let tokens = TokenService::from_config(&config.jwt);
        let reservations = ReservationService::new(PgBookingStore::new(db.clone()));

        Ok(Arc::new(Self {
            db,
            cache,
            config,
            tokens,
            reservations,
        }))
    }
}
