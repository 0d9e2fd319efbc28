//! DriverInfo entity for Sea-ORM
//!
//! Read-only view of the `DriverInfo` registration table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "DriverInfo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "userId")]
    pub user_id: i64,
    #[sea_orm(column_name = "phoneNumber")]
    pub phone_number: Option<String>,
    #[sea_orm(column_name = "vehicleNumber")]
    pub vehicle_number: Option<String>,
    #[sea_orm(column_name = "regionCity")]
    pub region_city: Option<String>,
    #[sea_orm(column_name = "regionDistrict")]
    pub region_district: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
