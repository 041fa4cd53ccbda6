//! Domain service for accounts and tenancy.
//!
//! Covers root (tenant) signup, sub-account provisioning, approval,
//! authentication, and tenant-attributed resource creation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::entities::accounts::{self, Role};
use crate::entities::candidates;

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Email or username already taken.
    #[error("Email or username is already in use")]
    Conflict,

    #[error("Account not found")]
    NotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Deliberately generic: does not distinguish an unknown account from a
    /// wrong password.
    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Retryable storage failure (pool/acquire timeout).
    #[error("Storage temporarily unavailable: {0}")]
    Transient(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Account DTO without the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i32,
    pub company_name: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub parent_account_id: Option<i32>,
    pub created_by: Option<i32>,
    pub is_approved: bool,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// The derived super-admin predicate: an admin with no parent account is
    /// the tenant root. Computed here and nowhere else.
    #[must_use]
    pub const fn is_tenant_root(&self) -> bool {
        matches!(self.role, Role::Admin) && self.parent_account_id.is_none()
    }

    /// The tenant root's account id: the account itself when it is the root,
    /// otherwise its parent. Every owned resource is attributed to this id.
    #[must_use]
    pub fn tenant_root_id(&self) -> i32 {
        self.parent_account_id.unwrap_or(self.id)
    }
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            company_name: model.company_name,
            email: model.email,
            username: model.username,
            role: model.role,
            parent_account_id: model.parent_account_id,
            created_by: model.created_by,
            is_approved: model.is_approved,
            approved_at: model.approved_at,
            approved_by: model.approved_by,
            created_at: model.created_at,
        }
    }
}

/// Candidate DTO, attributed to its tenant root.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub id: i32,
    pub tenant_id: i32,
    pub created_by: i32,
    pub full_name: String,
    pub email: String,
}

impl From<candidates::Model> for Candidate {
    fn from(model: candidates::Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            created_by: model.created_by,
            full_name: model.full_name,
            email: model.email,
        }
    }
}

/// Input for a tenant-root signup.
#[derive(Debug, Clone)]
pub struct NewRootAccount {
    pub company_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Input for sub-account provisioning by a tenant admin.
#[derive(Debug, Clone)]
pub struct NewSubAccount {
    pub role: Role,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Domain service trait for accounts and tenancy.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Create an unapproved tenant-root admin account.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Conflict`] when the email (case-insensitive)
    /// or username is taken.
    async fn create_root_account(&self, new: NewRootAccount) -> Result<Account, AccountError>;

    /// Create a recruiter or partner under the creator's tenant root.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Forbidden`] when the creator is not an admin.
    async fn create_sub_account(
        &self,
        creator_id: i32,
        new: NewSubAccount,
    ) -> Result<Account, AccountError>;

    /// Mark an account approved. No-op when already approved.
    async fn approve(&self, account_id: i32, approver_id: i32) -> Result<(), AccountError>;

    /// Verify credentials for an email-or-username identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Unauthorized`] on any credential mismatch and
    /// [`AccountError::Forbidden`] for valid credentials on an unapproved
    /// account.
    async fn authenticate(&self, identifier: &str, password: &str)
    -> Result<Account, AccountError>;

    /// Fetch one account by id.
    async fn get_account(&self, account_id: i32) -> Result<Account, AccountError>;

    /// Create a candidate attributed to the acting account's tenant root.
    async fn add_candidate(
        &self,
        actor_id: i32,
        full_name: &str,
        email: &str,
    ) -> Result<Candidate, AccountError>;

    /// List the candidates visible to the acting account (its tenant's only).
    async fn list_candidates(&self, actor_id: i32) -> Result<Vec<Candidate>, AccountError>;
}
