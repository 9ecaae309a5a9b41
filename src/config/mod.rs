use ::config::{ConfigError, Environment, Map};
use serde::Deserialize;
use std::env;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub cache: CacheConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// `text` or `json`
    pub log_format: String,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

// Настройки JWT
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

// TTL кеша каталога
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub catalog_ttl_seconds: u64,
}

/// Flat environment variables kept for compatibility with existing deployments.
const LEGACY_VARS: &[(&str, &str)] = &[
    ("HOST", "app.host"),
    ("PORT", "app.port"),
    ("ENVIRONMENT", "app.environment"),
    ("RUST_LOG", "app.rust_log"),
    ("LOG_FORMAT", "app.log_format"),
    ("DATABASE_URL", "database.url"),
    ("DB_POOL_SIZE", "database.pool_size"),
    ("REDIS_URL", "redis.url"),
    ("JWT_SECRET", "jwt.secret"),
    ("JWT_ACCESS_TTL_MINUTES", "jwt.access_ttl_minutes"),
    ("JWT_REFRESH_TTL_HOURS", "jwt.refresh_ttl_hours"),
    ("BCRYPT_COST", "jwt.bcrypt_cost"),
    ("CATALOG_CACHE_TTL_SECONDS", "cache.catalog_ttl_seconds"),
];

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::vars().collect())
    }

    /// Layers, lowest precedence first: defaults, the flat variables above,
    /// then `CINEMA__SECTION__KEY` variables.
    ///
    /// `DATABASE_URL`, `REDIS_URL` and `JWT_SECRET` have no defaults.
    pub fn from_vars(vars: Map<String, String>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder()
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 8000)?
            .set_default("app.environment", "development")?
            .set_default("app.rust_log", "cinema_booking=debug,tower_http=debug")?
            .set_default("app.log_format", "text")?
            .set_default("database.pool_size", 20)?
            .set_default("jwt.access_ttl_minutes", 60)?
            .set_default("jwt.refresh_ttl_hours", 24)?
            .set_default("jwt.bcrypt_cost", i64::from(bcrypt::DEFAULT_COST))?
            .set_default("cache.catalog_ttl_seconds", 3600)?;

        // Плоские переменные замещают значения по умолчанию, но не CINEMA__*
        for (var, key) in LEGACY_VARS {
            if let Some(value) = vars.get(*var) {
                builder = builder.set_default(*key, value.clone())?;
            }
        }

        builder
            .add_source(
                Environment::with_prefix("CINEMA")
                    .prefix_separator("__")
                    .separator("__")
                    .source(Some(vars)),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        let mut vars: Map<String, String> = [
            ("DATABASE_URL", "postgres://localhost/cinema"),
            ("REDIS_URL", "redis://localhost"),
            ("JWT_SECRET", "secret"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        vars.extend(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        vars
    }

    #[test]
    fn defaults_fill_unset_keys() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.app.port, 8000);
        assert_eq!(config.database.pool_size, 20);
        assert_eq!(config.jwt.access_ttl_minutes, 60);
        assert_eq!(config.database.url, "postgres://localhost/cinema");
    }

    #[test]
    fn flat_variables_replace_defaults() {
        let config = Config::from_vars(vars(&[("PORT", "9000"), ("DB_POOL_SIZE", "5")])).unwrap();
        assert_eq!(config.app.port, 9000);
        assert_eq!(config.database.pool_size, 5);
    }

    #[test]
    fn prefixed_variables_win_over_flat_ones() {
        let config = Config::from_vars(vars(&[
            ("PORT", "9000"),
            ("CINEMA__APP__PORT", "9100"),
            ("CINEMA__JWT__SECRET", "rotated"),
        ]))
        .unwrap();
        assert_eq!(config.app.port, 9100);
        assert_eq!(config.jwt.secret, "rotated");
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let mut vars = vars(&[]);
        vars.remove("DATABASE_URL");
        assert!(Config::from_vars(vars).is_err());
    }
}
