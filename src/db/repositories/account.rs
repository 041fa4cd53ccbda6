use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::accounts::{self, Role};

/// Field set for a new account row. Password arrives already hashed; the
/// repository never sees plaintext except through [`hash_password`].
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub company_name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub parent_account_id: Option<i32>,
    pub created_by: Option<i32>,
    pub is_approved: bool,
    pub approved_by: Option<i32>,
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new account. Email/username takenness is enforced by the
    /// unique indexes, so a losing racer surfaces as a unique-constraint
    /// `DbErr` rather than a read-then-write gap.
    pub async fn insert(&self, new: NewAccount) -> Result<accounts::Model> {
        let now = Utc::now();

        let active = accounts::ActiveModel {
            company_name: Set(new.company_name),
            email: Set(new.email.to_lowercase()),
            username: Set(new.username),
            password_hash: Set(new.password_hash),
            role: Set(new.role),
            parent_account_id: Set(new.parent_account_id),
            created_by: Set(new.created_by),
            is_approved: Set(new.is_approved),
            approved_at: Set(new.is_approved.then_some(now)),
            approved_by: Set(new.approved_by),
            created_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        Ok(model)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<accounts::Model>> {
        let account = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by id")?;

        Ok(account)
    }

    /// Look up an account by its (case-insensitive) email only. Usernames
    /// never match here.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<accounts::Model>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query account by email")?;

        Ok(account)
    }

    /// Resolve a login identifier, matching either the (case-insensitive)
    /// email or the username.
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<accounts::Model>> {
        let account = accounts::Entity::find()
            .filter(
                Condition::any()
                    .add(accounts::Column::Email.eq(identifier.to_lowercase()))
                    .add(accounts::Column::Username.eq(identifier)),
            )
            .one(&self.conn)
            .await
            .context("Failed to query account by identifier")?;

        Ok(account)
    }

    /// Mark an account approved. Guarded on `is_approved = false` so the
    /// update is a single atomic operation; returns the number of rows
    /// changed (0 means the account was absent or already approved).
    pub async fn approve(&self, account_id: i32, approver_id: i32) -> Result<u64> {
        approve_in(&self.conn, account_id, approver_id).await
    }

    /// Overwrite the stored password hash.
    pub async fn set_password_hash(&self, account_id: i32, password_hash: &str) -> Result<()> {
        let account = accounts::Entity::find_by_id(account_id)
            .one(&self.conn)
            .await
            .context("Failed to query account for password update")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {account_id}"))?;

        let mut active: accounts::ActiveModel = account.into();
        active.password_hash = Set(password_hash.to_string());
        active.update(&self.conn).await?;

        Ok(())
    }
}

/// Approval update usable inside a caller-owned transaction (token
/// redemption flips approval and the token's `used` flag atomically).
pub async fn approve_in<C: ConnectionTrait>(
    conn: &C,
    account_id: i32,
    approver_id: i32,
) -> Result<u64> {
    let result = accounts::Entity::update_many()
        .col_expr(accounts::Column::IsApproved, Expr::value(true))
        .col_expr(accounts::Column::ApprovedAt, Expr::value(Utc::now()))
        .col_expr(accounts::Column::ApprovedBy, Expr::value(approver_id))
        .filter(accounts::Column::Id.eq(account_id))
        .filter(accounts::Column::IsApproved.eq(false))
        .exec(conn)
        .await
        .context("Failed to update account approval")?;

    Ok(result.rows_affected)
}

/// Password-hash update usable inside a caller-owned transaction.
pub async fn set_password_hash_in<C: ConnectionTrait>(
    conn: &C,
    account_id: i32,
    password_hash: &str,
) -> Result<u64> {
    let result = accounts::Entity::update_many()
        .col_expr(accounts::Column::PasswordHash, Expr::value(password_hash))
        .filter(accounts::Column::Id.eq(account_id))
        .exec(conn)
        .await
        .context("Failed to update password hash")?;

    Ok(result.rows_affected)
}

/// Hash a password with Argon2id.
/// Callers run this under `spawn_blocking`; hashing is CPU-bound.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash off the async runtime.
/// Argon2's comparison is constant-time; a malformed stored hash verifies
/// as a mismatch rather than an error, keeping failure paths uniform.
pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();

    let is_valid = task::spawn_blocking(move || {
        PasswordHash::new(&password_hash).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    })
    .await
    .context("Password verification task panicked")?;

    Ok(is_valid)
}
