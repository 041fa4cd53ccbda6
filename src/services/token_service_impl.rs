//! `SeaORM` implementation of the `TokenService` trait.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::{DatabaseTransaction, DbErr, TransactionTrait};
use tokio::task;

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::db::repositories::account::{approve_in, hash_password, set_password_hash_in};
use crate::db::repositories::token::{self, generate_token};
use crate::entities::account_tokens;
use crate::services::token_service::{IssuedToken, TokenError, TokenPurpose, TokenService};

pub struct SeaOrmTokenService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmTokenService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    /// Shared redemption state machine: look up, expiry-check, then claim the
    /// token with a `used = false` guarded update inside a fresh transaction.
    /// The caller applies the purpose-specific side effect on the returned
    /// transaction and commits; dropping the transaction rolls the claim back.
    async fn claim_token(
        &self,
        token_str: &str,
        purpose: TokenPurpose,
    ) -> Result<(DatabaseTransaction, account_tokens::Model), TokenError> {
        let txn = self.store.conn.begin().await.map_err(map_db_err)?;

        let row = token::find_by_token(&txn, token_str, purpose)
            .await
            .map_err(map_storage_err)?
            .ok_or(TokenError::NotFound)?;

        let now = Utc::now();
        if now > row.expires_at {
            return Err(TokenError::Expired);
        }

        // The storage layer enforces single use: zero affected rows means a
        // concurrent redeemer (or an earlier one) won.
        let claimed = token::claim(&txn, row.id, now)
            .await
            .map_err(map_storage_err)?;
        if claimed == 0 {
            return Err(TokenError::AlreadyUsed);
        }

        Ok((txn, row))
    }
}

#[async_trait]
impl TokenService for SeaOrmTokenService {
    async fn issue(
        &self,
        account_id: i32,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let account = self
            .store
            .accounts()
            .find_by_id(account_id)
            .await
            .map_err(map_storage_err)?
            .ok_or(TokenError::NotFound)?;

        let token = generate_token();
        let expires_at = Utc::now() + ttl;

        let row = self
            .store
            .tokens()
            .insert(account_id, purpose, &account.email, &token, expires_at)
            .await
            .map_err(map_storage_err)?;

        Ok(IssuedToken {
            token: row.token,
            expires_at: row.expires_at,
        })
    }

    async fn redeem_approval(&self, token_str: &str) -> Result<(), TokenError> {
        let (txn, row) = self.claim_token(token_str, TokenPurpose::Approval).await?;

        // Approval-by-token records the account itself as the approver.
        // Zero rows here means the account was already approved; the token is
        // still consumed.
        approve_in(&txn, row.account_id, row.account_id)
            .await
            .map_err(map_storage_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(())
    }

    async fn redeem_password_reset(
        &self,
        token_str: &str,
        new_password: &str,
    ) -> Result<(), TokenError> {
        if new_password.len() < 8 {
            return Err(TokenError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let password = new_password.to_string();
        let config = self.security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .map_err(|e| TokenError::Database(format!("Hashing task panicked: {e}")))?
            .map_err(|e| TokenError::Database(e.to_string()))?;

        let (txn, row) = self
            .claim_token(token_str, TokenPurpose::PasswordReset)
            .await?;

        let rows = set_password_hash_in(&txn, row.account_id, &password_hash)
            .await
            .map_err(map_storage_err)?;
        if rows == 0 {
            // Accounts are never hard-deleted, so a missing row is corruption.
            return Err(TokenError::Database(format!(
                "Account {} missing during reset",
                row.account_id
            )));
        }

        txn.commit().await.map_err(map_db_err)?;
        Ok(())
    }
}

fn map_db_err(err: DbErr) -> TokenError {
    match err {
        DbErr::ConnectionAcquire(_) => TokenError::Transient(err.to_string()),
        _ => TokenError::Database(err.to_string()),
    }
}

fn map_storage_err(err: anyhow::Error) -> TokenError {
    match err.downcast_ref::<DbErr>() {
        Some(DbErr::ConnectionAcquire(_)) => TokenError::Transient(err.to_string()),
        _ => TokenError::Database(err.to_string()),
    }
}
