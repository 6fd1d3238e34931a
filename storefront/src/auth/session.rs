use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    errors::{Error, Result},
    types::UserId,
};

/// Claims carried in a session bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: UserId,
    pub email: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

fn secret(config: &Config) -> Result<&[u8]> {
    config.secret_key.as_deref().map(str::as_bytes).ok_or_else(|| Error::Internal {
        operation: "sign session token: no secret_key configured".to_string(),
    })
}

pub fn create_session_token(user_id: UserId, email: &str, is_admin: bool, config: &Config) -> Result<String> {
    let now = Utc::now();
    let timeout = chrono::Duration::from_std(config.auth.session.timeout).map_err(|_| Error::Internal {
        operation: "compute session expiry".to_string(),
    })?;

    let claims = SessionClaims {
        sub: user_id,
        email: email.to_string(),
        is_admin,
        iat: now.timestamp(),
        exp: (now + timeout).timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret(config)?)).map_err(|e| {
        tracing::error!("Failed to encode session token: {e}");
        Error::Internal {
            operation: "create session token".to_string(),
        }
    })
}

pub fn verify_session_token(token: &str, config: &Config) -> Result<SessionClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<SessionClaims>(token, &DecodingKey::from_secret(secret(config)?), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Rejected session token: {e}");
            Error::Unauthenticated
        })
}
