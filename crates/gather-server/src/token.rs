//! Token service: issues and verifies signed, time-bound identity tokens.
//!
//! Tokens are HS256 JWTs carrying the user id and role. Verification needs
//! only the signing secret, never the store.

use chrono::{DateTime, Duration, Utc};
use gather_core::user::{Identity, Role};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default token lifetime.
pub const DEFAULT_TTL_HOURS: i64 = 24;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// The service cannot be built from the given configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("token signing secret is not configured (set GATHER_JWT_SECRET)")]
  MissingSecret,
  #[error("token lifetime must be positive")]
  InvalidTtl,
}

/// Why a token was rejected. Logged, never shown to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidTokenReason {
  Malformed,
  Expired,
  SignatureMismatch,
}

/// A token failed verification.
#[derive(Debug, Error)]
#[error("invalid token ({reason:?})")]
pub struct InvalidToken {
  pub reason: InvalidTokenReason,
}

#[derive(Debug, Error)]
#[error("failed to sign token: {0}")]
pub struct TokenError(#[from] jsonwebtoken::errors::Error);

// ─── Claims ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub:  Uuid,
  role: Role,
  iat:  i64,
  exp:  i64,
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct TokenService {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  ttl:        Duration,
}

impl TokenService {
  /// Build a service signing with `secret`. A blank secret is refused; there
  /// is no fallback secret.
  pub fn new(secret: &str, ttl: Duration) -> Result<Self, ConfigError> {
    if secret.trim().is_empty() {
      return Err(ConfigError::MissingSecret);
    }
    if ttl <= Duration::zero() {
      return Err(ConfigError::InvalidTtl);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    Ok(Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      validation,
      ttl,
    })
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  /// Sign a token for `identity`, valid for the configured lifetime.
  pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
    self.issue_at(identity, Utc::now())
  }

  fn issue_at(
    &self,
    identity: &Identity,
    issued_at: DateTime<Utc>,
  ) -> Result<String, TokenError> {
    let claims = Claims {
      sub:  identity.user_id,
      role: identity.role,
      iat:  issued_at.timestamp(),
      exp:  (issued_at + self.ttl).timestamp(),
    };
    Ok(jsonwebtoken::encode(
      &Header::new(Algorithm::HS256),
      &claims,
      &self.encoding,
    )?)
  }

  /// Check signature and expiry and recover the identity.
  pub fn verify(&self, token: &str) -> Result<Identity, InvalidToken> {
    let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
      .map_err(|e| {
        let reason = match e.kind() {
          ErrorKind::ExpiredSignature => InvalidTokenReason::Expired,
          ErrorKind::InvalidSignature => InvalidTokenReason::SignatureMismatch,
          _ => InvalidTokenReason::Malformed,
        };
        tracing::debug!(?reason, error = %e, "rejected token");
        InvalidToken { reason }
      })?;

    Ok(Identity { user_id: data.claims.sub, role: data.claims.role })
  }
}
