//! `SeaORM` implementation of the `AccountService` trait.

use std::sync::OnceLock;

use async_trait::async_trait;
use sea_orm::{DbErr, SqlErr};
use tokio::task;

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::db::repositories::account::{NewAccount, hash_password, verify_password};
use crate::entities::accounts::Role;
use crate::services::account_service::{
    Account, AccountError, AccountService, Candidate, NewRootAccount, NewSubAccount,
};

pub struct SeaOrmAccountService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn hash(&self, password: &str) -> Result<String, AccountError> {
        let password = password.to_string();
        let config = self.security.clone();

        task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .map_err(|e| AccountError::Database(format!("Hashing task panicked: {e}")))?
            .map_err(|e| AccountError::Database(e.to_string()))
    }

    async fn load_account(&self, account_id: i32) -> Result<Account, AccountError> {
        self.store
            .accounts()
            .find_by_id(account_id)
            .await
            .map_err(map_storage_err)?
            .map(Account::from)
            .ok_or(AccountError::NotFound)
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn create_root_account(&self, new: NewRootAccount) -> Result<Account, AccountError> {
        validate_signup(&new.email, &new.username, &new.password)?;

        let password_hash = self.hash(&new.password).await?;

        // Takenness is decided by the unique indexes at insert time, not by a
        // prior read; a losing racer gets Conflict.
        let model = self
            .store
            .accounts()
            .insert(NewAccount {
                company_name: new.company_name,
                email: new.email,
                username: new.username,
                password_hash,
                role: Role::Admin,
                parent_account_id: None,
                created_by: None,
                is_approved: false,
                approved_by: None,
            })
            .await
            .map_err(map_storage_err)?;

        Ok(model.into())
    }

    async fn create_sub_account(
        &self,
        creator_id: i32,
        new: NewSubAccount,
    ) -> Result<Account, AccountError> {
        if matches!(new.role, Role::Admin) {
            return Err(AccountError::Validation(
                "Sub-accounts must be recruiters or partners".to_string(),
            ));
        }
        validate_signup(&new.email, &new.username, &new.password)?;

        let creator = self.load_account(creator_id).await?;
        if !matches!(creator.role, Role::Admin) {
            return Err(AccountError::Forbidden(
                "Only admins may create sub-accounts".to_string(),
            ));
        }

        let tenant_root = creator.tenant_root_id();
        let password_hash = self.hash(&new.password).await?;

        // Provisioned under an already-trusted tenant admin, so approved at
        // creation; only root signups go through the token flow.
        let model = self
            .store
            .accounts()
            .insert(NewAccount {
                company_name: creator.company_name,
                email: new.email,
                username: new.username,
                password_hash,
                role: new.role,
                parent_account_id: Some(tenant_root),
                created_by: Some(creator_id),
                is_approved: true,
                approved_by: Some(creator_id),
            })
            .await
            .map_err(map_storage_err)?;

        Ok(model.into())
    }

    async fn approve(&self, account_id: i32, approver_id: i32) -> Result<(), AccountError> {
        let rows = self
            .store
            .accounts()
            .approve(account_id, approver_id)
            .await
            .map_err(map_storage_err)?;

        if rows > 0 {
            return Ok(());
        }

        // Zero rows: either already approved (no-op) or no such account.
        match self.load_account(account_id).await {
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Account, AccountError> {
        let account = self
            .store
            .accounts()
            .find_by_identifier(identifier)
            .await
            .map_err(map_storage_err)?;

        let Some(account) = account else {
            // Burn a verification on a throwaway hash so an unknown
            // identifier takes as long as a wrong password.
            let _ = verify_password(password, dummy_hash()).await;
            return Err(AccountError::Unauthorized);
        };

        let is_valid = verify_password(password, &account.password_hash)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;

        if !is_valid {
            return Err(AccountError::Unauthorized);
        }

        if !account.is_approved {
            return Err(AccountError::Forbidden(
                "Account is awaiting approval".to_string(),
            ));
        }

        Ok(account.into())
    }

    async fn get_account(&self, account_id: i32) -> Result<Account, AccountError> {
        self.load_account(account_id).await
    }

    async fn add_candidate(
        &self,
        actor_id: i32,
        full_name: &str,
        email: &str,
    ) -> Result<Candidate, AccountError> {
        let actor = self.load_account(actor_id).await?;
        let tenant_id = actor.tenant_root_id();

        let model = self
            .store
            .candidates()
            .insert(tenant_id, actor_id, full_name, email)
            .await
            .map_err(map_storage_err)?;

        Ok(model.into())
    }

    async fn list_candidates(&self, actor_id: i32) -> Result<Vec<Candidate>, AccountError> {
        let actor = self.load_account(actor_id).await?;

        let rows = self
            .store
            .candidates()
            .list_for_tenant(actor.tenant_root_id())
            .await
            .map_err(map_storage_err)?;

        Ok(rows.into_iter().map(Candidate::from).collect())
    }
}

fn validate_signup(email: &str, username: &str, password: &str) -> Result<(), AccountError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(AccountError::Validation(
            "A valid email address is required".to_string(),
        ));
    }
    if username.trim().is_empty() {
        return Err(AccountError::Validation("Username is required".to_string()));
    }
    if password.len() < 8 {
        return Err(AccountError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

/// Classify a repository error: unique-constraint violations become Conflict,
/// pool-acquire timeouts become the retryable Transient variant.
fn map_storage_err(err: anyhow::Error) -> AccountError {
    match err.downcast_ref::<DbErr>() {
        Some(db_err) => {
            if matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AccountError::Conflict
            } else if matches!(db_err, DbErr::ConnectionAcquire(_)) {
                AccountError::Transient(db_err.to_string())
            } else {
                AccountError::Database(err.to_string())
            }
        }
        None => AccountError::Database(err.to_string()),
    }
}

/// A throwaway Argon2 hash for anti-enumeration, computed once.
fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("not-a-real-password", None).unwrap_or_default())
}
