//! Parcel entity for Sea-ORM
//!
//! Maps the legacy camelCase `Parcel` table.

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;
use sea_orm::FromQueryResult;

use crate::domain::model::parcel::{Parcel, ParcelStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "Parcel")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "ownerId")]
    pub owner_id: i64,
    pub size: String,
    #[sea_orm(column_name = "recipientAddr")]
    pub recipient_addr: String,
    #[sea_orm(column_name = "recipientName")]
    pub recipient_name: Option<String>,
    #[sea_orm(column_name = "recipientPhone")]
    pub recipient_phone: Option<String>,
    #[sea_orm(column_name = "productName")]
    pub product_name: String,
    pub status: String,
    #[sea_orm(column_name = "isDeleted")]
    pub is_deleted: bool,
    #[sea_orm(column_name = "pickupDriverId")]
    pub pickup_driver_id: Option<i64>,
    #[sea_orm(column_name = "deliveryDriverId")]
    pub delivery_driver_id: Option<i64>,
    #[sea_orm(column_name = "pickupScheduledDate")]
    pub pickup_scheduled_date: Option<NaiveDate>,
    #[sea_orm(column_name = "pickupCompletedAt")]
    pub pickup_completed_at: Option<NaiveDateTime>,
    #[sea_orm(column_name = "deliveryCompletedAt")]
    pub delivery_completed_at: Option<NaiveDateTime>,
    #[sea_orm(column_name = "isNextPickupTarget")]
    pub is_next_pickup_target: bool,
    #[sea_orm(column_name = "isNextDeliveryTarget")]
    pub is_next_delivery_target: bool,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::PickupDriverId",
        to = "super::user::Column::Id"
    )]
    PickupDriver,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DeliveryDriverId",
        to = "super::user::Column::Id"
    )]
    DeliveryDriver,
}

impl ActiveModelBehavior for ActiveModel {}

/// Parcel row with the joined display names.
#[derive(Debug, FromQueryResult)]
pub struct ParcelRow {
    pub id: i64,
    pub owner_id: i64,
    pub size: String,
    pub recipient_addr: String,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub product_name: String,
    pub status: String,
    pub pickup_driver_id: Option<i64>,
    pub delivery_driver_id: Option<i64>,
    pub pickup_scheduled_date: Option<NaiveDate>,
    pub pickup_completed_at: Option<NaiveDateTime>,
    pub delivery_completed_at: Option<NaiveDateTime>,
    pub is_next_pickup_target: bool,
    pub is_next_delivery_target: bool,
    pub created_at: NaiveDateTime,
    pub owner_name: Option<String>,
    pub pickup_driver_name: Option<String>,
    pub delivery_driver_name: Option<String>,
}

impl TryFrom<ParcelRow> for Parcel {
    type Error = String;

    fn try_from(row: ParcelRow) -> Result<Self, Self::Error> {
        let status = ParcelStatus::parse(&row.status)
            .ok_or_else(|| format!("unknown parcel status '{}'", row.status))?;

        Ok(Parcel {
            id: row.id,
            owner_id: row.owner_id,
            owner_name: row.owner_name,
            size: row.size,
            recipient_addr: row.recipient_addr,
            recipient_name: row.recipient_name,
            recipient_phone: row.recipient_phone,
            product_name: row.product_name,
            status,
            pickup_driver_id: row.pickup_driver_id,
            pickup_driver_name: row.pickup_driver_name,
            delivery_driver_id: row.delivery_driver_id,
            delivery_driver_name: row.delivery_driver_name,
            pickup_scheduled_date: row.pickup_scheduled_date,
            pickup_completed_at: row.pickup_completed_at,
            delivery_completed_at: row.delivery_completed_at,
            is_next_pickup_target: row.is_next_pickup_target,
            is_next_delivery_target: row.is_next_delivery_target,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> ParcelRow {
        ParcelRow {
            id: 1,
            owner_id: 2,
            size: "M".to_string(),
            recipient_addr: "서울 중구 명동 1".to_string(),
            recipient_name: None,
            recipient_phone: None,
            product_name: "책".to_string(),
            status: status.to_string(),
            pickup_driver_id: Some(3),
            delivery_driver_id: None,
            pickup_scheduled_date: None,
            pickup_completed_at: None,
            delivery_completed_at: None,
            is_next_pickup_target: false,
            is_next_delivery_target: false,
            created_at: chrono::NaiveDate::from_ymd_opt(2025, 6, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            owner_name: Some("가게".to_string()),
            pickup_driver_name: Some("기사".to_string()),
            delivery_driver_name: None,
        }
    }

    #[test]
    fn test_row_maps_to_domain() {
        let parcel = Parcel::try_from(row("PICKUP_PENDING")).unwrap();
        assert_eq!(parcel.status, ParcelStatus::PickupPending);
        assert_eq!(parcel.owner_name.as_deref(), Some("가게"));
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(Parcel::try_from(row("PENDING")).is_err());
    }
}
