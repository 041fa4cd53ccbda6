use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What redeeming a token does: flip the account to approved, or accept a
/// replacement password. One table serves both purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    #[sea_orm(string_value = "approval")]
    Approval,

    #[sea_orm(string_value = "password_reset")]
    PasswordReset,
}

/// Single-use expiring token row. Append-only: redeemed and expired rows are
/// kept as the audit trail, never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "account_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub account_id: i32,

    pub purpose: TokenPurpose,

    /// Random 64-char hex string
    #[sea_orm(unique)]
    pub token: String,

    /// Email the token was delivered to, captured at issuance.
    pub email: String,

    pub expires_at: DateTimeUtc,

    pub used: bool,

    pub used_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Account,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
