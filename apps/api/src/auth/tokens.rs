use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    AccessToken,
    RefreshToken,
    EmailVerification,
    PasswordReset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub scope: TokenScope,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("token scope {found:?} where {expected:?} was required")]
    WrongScope {
        expected: TokenScope,
        found: TokenScope,
    },

    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Signing(inner) => {
                AppError::Internal(anyhow::anyhow!("JWT signing failed: {inner}"))
            }
            other => {
                tracing::debug!("Rejected token: {other}");
                AppError::unauthorized("Could not validate credentials")
            }
        }
    }
}

/// Issues and verifies every JWT the service hands out: the access/refresh
/// pair plus the single-purpose email verification and password reset tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
    verification_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            algorithm: config.jwt_algorithm,
            access_ttl: config.access_token_ttl()?,
            refresh_ttl: config.refresh_token_ttl()?,
            verification_ttl: config.verification_token_ttl()?,
            reset_ttl: config.reset_token_ttl()?,
        })
    }

    pub fn issue(&self, user_id: Uuid, email: &str, scope: TokenScope) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match scope {
            TokenScope::AccessToken => self.access_ttl,
            TokenScope::RefreshToken => self.refresh_ttl,
            TokenScope::EmailVerification => self.verification_ttl,
            TokenScope::PasswordReset => self.reset_ttl,
        };
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            scope,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn issue_pair(&self, user_id: Uuid, email: &str) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(user_id, email, TokenScope::AccessToken)?,
            refresh_token: self.issue(user_id, email, TokenScope::RefreshToken)?,
            token_type: "bearer",
        })
    }

    /// Decodes `token`, checking signature, expiry and that it carries `expected` scope.
    pub fn verify(&self, token: &str, expected: TokenScope) -> Result<Claims, TokenError> {
        let validation = Validation::new(self.algorithm);
        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(TokenError::Invalid)?
            .claims;

        if claims.scope != expected {
            return Err(TokenError::WrongScope {
                expected,
                found: claims.scope,
            });
        }
        Ok(claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding).map_err(TokenError::Signing)
    }
}
