use sea_orm::entity::prelude::*;

/// Candidate record. `tenant_id` is always the tenant root's account id, even
/// when a recruiter or partner created the row; that attribution is the tenant
/// isolation boundary.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "candidates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub tenant_id: i32,

    pub created_by: i32,

    pub full_name: String,

    pub email: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
