//! auth.rs
//!
//! Выдача и проверка JWT-токенов (access + refresh) и хеширование паролей.
//!
//! Токены подписываются HS256 общим секретом из `JwtConfig`. Тип токена
//! хранится в claims, поэтому refresh-токен нельзя использовать как access.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("expected a {expected:?} token")]
    WrongTokenType { expected: TokenType },

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub username: String,
    pub token_type: TokenType,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn from_config(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_ttl_minutes),
            refresh_ttl: Duration::hours(config.refresh_ttl_hours),
        }
    }

    pub fn issue_pair(&self, user_id: i64, username: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(user_id, username, TokenType::Access)?,
            refresh: self.issue(user_id, username, TokenType::Refresh)?,
        })
    }

    pub fn issue(&self, user_id: i64, username: &str, token_type: TokenType) -> Result<String, AuthError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            token_type,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Decodes `token`, checking signature, expiry and token type.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        if data.claims.token_type != expected {
            return Err(AuthError::WrongTokenType { expected });
        }
        Ok(data.claims)
    }

    /// Exchanges a refresh token for a fresh access token.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.verify(refresh_token, TokenType::Refresh)?;
        self.issue(claims.sub, &claims.username, TokenType::Access)
    }
}

// bcrypt намеренно медленный - вызывать через spawn_blocking
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, cost)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> TokenService {
        TokenService::from_config(&JwtConfig {
            secret: "test-secret".to_string(),
            access_ttl_minutes: 5,
            refresh_ttl_hours: 1,
            bcrypt_cost: 4,
        })
    }

    #[test]
    fn access_token_verifies_as_access() {
        let svc = tokens();
        let pair = svc.issue_pair(42, "alice").unwrap();

        let claims = svc.verify(&pair.access, TokenType::Access).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let svc = tokens();
        let pair = svc.issue_pair(42, "alice").unwrap();

        let err = svc.verify(&pair.refresh, TokenType::Access).unwrap_err();
        assert!(matches!(err, AuthError::WrongTokenType { expected: TokenType::Access }));
        assert!(svc.refresh(&pair.access).is_err());
    }

    #[test]
    fn refresh_issues_access_for_same_user() {
        let svc = tokens();
        let pair = svc.issue_pair(7, "bob").unwrap();

        let access = svc.refresh(&pair.refresh).unwrap();
        let claims = svc.verify(&access, TokenType::Access).unwrap();
        assert_eq!(claims.sub, 7);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = TokenService::from_config(&JwtConfig {
            secret: "another-secret".to_string(),
            access_ttl_minutes: 5,
            refresh_ttl_hours: 1,
            bcrypt_cost: 4,
        });
        let token = other.issue(1, "mallory", TokenType::Access).unwrap();

        assert!(matches!(
            tokens().verify(&token, TokenType::Access),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = TokenService {
            access_ttl: Duration::minutes(-10),
            ..tokens()
        };
        let token = svc.issue(1, "alice", TokenType::Access).unwrap();

        assert!(matches!(
            svc.verify(&token, TokenType::Access),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("correct horse", 4).unwrap();
        assert!(bcrypt::verify("correct horse", &hash).unwrap());
        assert!(!bcrypt::verify("wrong horse", &hash).unwrap());
    }
}
