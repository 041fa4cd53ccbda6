use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::candidates;

pub struct CandidateRepository {
    conn: DatabaseConnection,
}

impl CandidateRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a candidate attributed to `tenant_id` (always the tenant
    /// root's account id, never the acting sub-account's).
    pub async fn insert(
        &self,
        tenant_id: i32,
        created_by: i32,
        full_name: &str,
        email: &str,
    ) -> Result<candidates::Model> {
        let active = candidates::ActiveModel {
            tenant_id: Set(tenant_id),
            created_by: Set(created_by),
            full_name: Set(full_name.to_string()),
            email: Set(email.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert candidate")?;

        Ok(model)
    }

    /// List candidates belonging to one tenant. No cross-tenant view exists.
    pub async fn list_for_tenant(&self, tenant_id: i32) -> Result<Vec<candidates::Model>> {
        let rows = candidates::Entity::find()
            .filter(candidates::Column::TenantId.eq(tenant_id))
            .order_by_asc(candidates::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list candidates")?;

        Ok(rows)
    }
}
