use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of an account within its tenant.
///
/// An `Admin` with no parent account is the tenant root; recruiters and
/// partners always hang off a tenant root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,

    #[sea_orm(string_value = "recruiter")]
    Recruiter,

    #[sea_orm(string_value = "partner")]
    Partner,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub company_name: String,

    /// Stored lowercased; uniqueness is case-insensitive.
    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub role: Role,

    /// The owning tenant root for sub-accounts; `None` marks a tenant root.
    pub parent_account_id: Option<i32>,

    pub created_by: Option<i32>,

    pub is_approved: bool,

    pub approved_at: Option<DateTimeUtc>,

    pub approved_by: Option<i32>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_tokens::Entity")]
    AccountTokens,
}

impl Related<super::account_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
