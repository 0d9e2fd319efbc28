//! User entity for Sea-ORM
//!
//! Read-only view of the `User` table; only the columns the dispatch core
//! consumes are mapped.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "User")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    #[sea_orm(column_name = "userType")]
    pub user_type: Option<String>,
    #[sea_orm(column_name = "isApproved")]
    pub is_approved: Option<bool>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
