//! Single-use expiring-token lifecycle, shared by account approval and
//! password reset.
//!
//! Issued → {Redeemed | Expired | AlreadyUsed}; terminal states are detected
//! lazily at redemption, there is no background sweep, and token rows are
//! never deleted.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

pub use crate::entities::account_tokens::TokenPurpose;

/// Errors specific to token operations. Redemption failures are specific
/// (expired vs. used vs. not-found): the token carries no further secrecy
/// requirement once delivered out-of-band.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token not found")]
    NotFound,

    #[error("Token has expired")]
    Expired,

    #[error("Token has already been used")]
    AlreadyUsed,

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Retryable storage failure (pool/acquire timeout).
    #[error("Storage temporarily unavailable: {0}")]
    Transient(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// A freshly issued token, handed to the delivery boundary (mailer).
/// Never logged.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Domain service trait for the token lifecycle.
#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    /// Issue a fresh single-use token for an account. Multiple outstanding
    /// tokens per account are allowed.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::NotFound`] when the account does not exist.
    async fn issue(
        &self,
        account_id: i32,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError>;

    /// Redeem an approval token, flipping the bound account to approved.
    /// The approval flip and the token's `used` flag commit atomically.
    async fn redeem_approval(&self, token: &str) -> Result<(), TokenError>;

    /// Redeem a password-reset token, replacing the bound account's password
    /// hash. The hash overwrite and the token's `used` flag commit atomically.
    async fn redeem_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), TokenError>;
}
