use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};

use crate::entities::account_tokens::{self, TokenPurpose};

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a freshly issued token row. Multiple outstanding tokens per
    /// account are allowed; rows are append-only.
    pub async fn insert(
        &self,
        account_id: i32,
        purpose: TokenPurpose,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<account_tokens::Model> {
        let active = account_tokens::ActiveModel {
            account_id: Set(account_id),
            purpose: Set(purpose),
            token: Set(token.to_string()),
            email: Set(email.to_string()),
            expires_at: Set(expires_at),
            used: Set(false),
            used_at: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert token")?;

        Ok(model)
    }
}

/// Look up a token row by its opaque string, scoped to a purpose so an
/// approval token cannot drive a password reset or vice versa.
pub async fn find_by_token<C: ConnectionTrait>(
    conn: &C,
    token: &str,
    purpose: TokenPurpose,
) -> Result<Option<account_tokens::Model>> {
    let row = account_tokens::Entity::find()
        .filter(account_tokens::Column::Token.eq(token))
        .filter(account_tokens::Column::Purpose.eq(purpose))
        .one(conn)
        .await
        .context("Failed to query token")?;

    Ok(row)
}

/// Flip `used` on a token, guarded on `used = false`. Returns the affected
/// row count: under two concurrent redemptions exactly one caller sees 1 and
/// the other sees 0. Run inside the same transaction as the bound side
/// effect so both commit or neither does.
pub async fn claim<C: ConnectionTrait>(conn: &C, token_id: i32, now: DateTime<Utc>) -> Result<u64> {
    let result = account_tokens::Entity::update_many()
        .col_expr(account_tokens::Column::Used, Expr::value(true))
        .col_expr(account_tokens::Column::UsedAt, Expr::value(now))
        .filter(account_tokens::Column::Id.eq(token_id))
        .filter(account_tokens::Column::Used.eq(false))
        .exec(conn)
        .await
        .context("Failed to claim token")?;

    Ok(result.rows_affected)
}

/// Generate an opaque single-use token: 32 random bytes, hex encoded.
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
