//! MySQL implementation of ParcelRepository
//!
//! Uses Sea-ORM for database operations. Every operation is a single
//! statement; guarded updates filter on the expected current status and
//! report `rows_affected`.

use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveDateTime};
use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};

use crate::boundary::ports::{DailyStatusCounts, ParcelRepository, RepositoryError};
use crate::domain::model::parcel::{Parcel, ParcelStatus};
use crate::infrastructure::repository::entities::parcel::{self, ParcelRow};
use crate::infrastructure::repository::entities::user;

/// MySQL implementation of ParcelRepository using Sea-ORM
pub struct ParcelMysqlRepository {
    db: DatabaseConnection,
}

impl ParcelMysqlRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Base select with the owner and driver names joined in and every
    /// column aliased for [`ParcelRow`].
    fn select_with_names() -> Select<parcel::Entity> {
        parcel::Entity::find()
            .select_only()
            .column_as(parcel::Column::Id, "id")
            .column_as(parcel::Column::OwnerId, "owner_id")
            .column_as(parcel::Column::Size, "size")
            .column_as(parcel::Column::RecipientAddr, "recipient_addr")
            .column_as(parcel::Column::RecipientName, "recipient_name")
            .column_as(parcel::Column::RecipientPhone, "recipient_phone")
            .column_as(parcel::Column::ProductName, "product_name")
            .column_as(parcel::Column::Status, "status")
            .column_as(parcel::Column::PickupDriverId, "pickup_driver_id")
            .column_as(parcel::Column::DeliveryDriverId, "delivery_driver_id")
            .column_as(parcel::Column::PickupScheduledDate, "pickup_scheduled_date")
            .column_as(parcel::Column::PickupCompletedAt, "pickup_completed_at")
            .column_as(parcel::Column::DeliveryCompletedAt, "delivery_completed_at")
            .column_as(parcel::Column::IsNextPickupTarget, "is_next_pickup_target")
            .column_as(parcel::Column::IsNextDeliveryTarget, "is_next_delivery_target")
            .column_as(parcel::Column::CreatedAt, "created_at")
            .join_as(JoinType::LeftJoin, parcel::Relation::Owner.def(), Alias::new("owner"))
            .join_as(
                JoinType::LeftJoin,
                parcel::Relation::PickupDriver.def(),
                Alias::new("pickup_driver"),
            )
            .join_as(
                JoinType::LeftJoin,
                parcel::Relation::DeliveryDriver.def(),
                Alias::new("delivery_driver"),
            )
            .column_as(Expr::col((Alias::new("owner"), user::Column::Name)), "owner_name")
            .column_as(
                Expr::col((Alias::new("pickup_driver"), user::Column::Name)),
                "pickup_driver_name",
            )
            .column_as(
                Expr::col((Alias::new("delivery_driver"), user::Column::Name)),
                "delivery_driver_name",
            )
    }

    fn rows_to_parcels(rows: Vec<ParcelRow>) -> Result<Vec<Parcel>, RepositoryError> {
        rows.into_iter()
            .map(|row| Parcel::try_from(row).map_err(RepositoryError::CorruptRecord))
            .collect()
    }
}

fn map_db_err(e: DbErr) -> RepositoryError {
    match e {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
            RepositoryError::ConnectionError(e.to_string())
        }
        other => RepositoryError::QueryError(other.to_string()),
    }
}

/// Half-open datetime range covering one calendar day.
fn day_range(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = day.and_hms_opt(0, 0, 0).expect("valid midnight");
    let end = day
        .checked_add_days(Days::new(1))
        .expect("in-range date")
        .and_hms_opt(0, 0, 0)
        .expect("valid midnight");
    (start, end)
}

#[async_trait]
impl ParcelRepository for ParcelMysqlRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Parcel>, RepositoryError> {
        let row = Self::select_with_names()
            .filter(parcel::Column::Id.eq(id))
            .filter(parcel::Column::IsDeleted.eq(false))
            .into_model::<ParcelRow>()
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        row.map(|r| Parcel::try_from(r).map_err(RepositoryError::CorruptRecord))
            .transpose()
    }

    async fn pending_pickups(
        &self,
        driver_id: i64,
        today: NaiveDate,
    ) -> Result<Vec<Parcel>, RepositoryError> {
        let rows = Self::select_with_names()
            .filter(parcel::Column::PickupDriverId.eq(driver_id))
            .filter(parcel::Column::Status.eq(ParcelStatus::PickupPending.as_str()))
            .filter(parcel::Column::IsDeleted.eq(false))
            .filter(
                Condition::any()
                    .add(parcel::Column::PickupScheduledDate.is_null())
                    .add(parcel::Column::PickupScheduledDate.lte(today)),
            )
            .order_by_desc(parcel::Column::CreatedAt)
            .into_model::<ParcelRow>()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Self::rows_to_parcels(rows)
    }

    async fn pending_deliveries(&self, driver_id: i64) -> Result<Vec<Parcel>, RepositoryError> {
        let rows = Self::select_with_names()
            .filter(parcel::Column::DeliveryDriverId.eq(driver_id))
            .filter(parcel::Column::Status.eq(ParcelStatus::DeliveryPending.as_str()))
            .filter(parcel::Column::IsDeleted.eq(false))
            .order_by_desc(parcel::Column::CreatedAt)
            .into_model::<ParcelRow>()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Self::rows_to_parcels(rows)
    }

    async fn last_completed_pickup_addr(
        &self,
        driver_id: i64,
        today: NaiveDate,
    ) -> Result<Option<String>, RepositoryError> {
        let (start, end) = day_range(today);
        let addr: Option<String> = parcel::Entity::find()
            .select_only()
            .column(parcel::Column::RecipientAddr)
            .filter(parcel::Column::PickupDriverId.eq(driver_id))
            .filter(parcel::Column::Status.eq(ParcelStatus::PickupCompleted.as_str()))
            .filter(parcel::Column::PickupCompletedAt.gte(start))
            .filter(parcel::Column::PickupCompletedAt.lt(end))
            .filter(parcel::Column::IsDeleted.eq(false))
            .order_by_desc(parcel::Column::PickupCompletedAt)
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(addr)
    }

    async fn last_completed_delivery_addr(
        &self,
        driver_id: i64,
        today: NaiveDate,
    ) -> Result<Option<String>, RepositoryError> {
        let (start, end) = day_range(today);
        let addr: Option<String> = parcel::Entity::find()
            .select_only()
            .column(parcel::Column::RecipientAddr)
            .filter(parcel::Column::DeliveryDriverId.eq(driver_id))
            .filter(parcel::Column::Status.eq(ParcelStatus::DeliveryCompleted.as_str()))
            .filter(parcel::Column::DeliveryCompletedAt.gte(start))
            .filter(parcel::Column::DeliveryCompletedAt.lt(end))
            .filter(parcel::Column::IsDeleted.eq(false))
            .order_by_desc(parcel::Column::DeliveryCompletedAt)
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(addr)
    }

    async fn assign_pickup(
        &self,
        parcel_id: i64,
        driver_id: i64,
        scheduled: NaiveDate,
        next_target: bool,
    ) -> Result<bool, RepositoryError> {
        let result = parcel::Entity::update_many()
            .col_expr(parcel::Column::PickupDriverId, Expr::value(driver_id))
            .col_expr(
                parcel::Column::Status,
                Expr::value(ParcelStatus::PickupPending.as_str()),
            )
            .col_expr(parcel::Column::PickupScheduledDate, Expr::value(scheduled))
            .col_expr(parcel::Column::IsNextPickupTarget, Expr::value(next_target))
            .filter(parcel::Column::Id.eq(parcel_id))
            .filter(parcel::Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn assign_delivery(
        &self,
        parcel_id: i64,
        driver_id: i64,
    ) -> Result<bool, RepositoryError> {
        let result = parcel::Entity::update_many()
            .col_expr(parcel::Column::DeliveryDriverId, Expr::value(driver_id))
            .col_expr(parcel::Column::IsNextDeliveryTarget, Expr::value(true))
            .filter(parcel::Column::Id.eq(parcel_id))
            .filter(parcel::Column::Status.eq(ParcelStatus::DeliveryPending.as_str()))
            .filter(parcel::Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn complete_pickup(
        &self,
        parcel_id: i64,
        completed_at: NaiveDateTime,
    ) -> Result<bool, RepositoryError> {
        let result = parcel::Entity::update_many()
            .col_expr(
                parcel::Column::Status,
                Expr::value(ParcelStatus::PickupCompleted.as_str()),
            )
            .col_expr(parcel::Column::IsNextPickupTarget, Expr::value(false))
            .col_expr(parcel::Column::PickupCompletedAt, Expr::value(completed_at))
            .filter(parcel::Column::Id.eq(parcel_id))
            .filter(parcel::Column::Status.eq(ParcelStatus::PickupPending.as_str()))
            .filter(parcel::Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn complete_delivery(
        &self,
        parcel_id: i64,
        completed_at: NaiveDateTime,
    ) -> Result<bool, RepositoryError> {
        let result = parcel::Entity::update_many()
            .col_expr(
                parcel::Column::Status,
                Expr::value(ParcelStatus::DeliveryCompleted.as_str()),
            )
            .col_expr(parcel::Column::IsNextDeliveryTarget, Expr::value(false))
            .col_expr(parcel::Column::DeliveryCompletedAt, Expr::value(completed_at))
            .filter(parcel::Column::Id.eq(parcel_id))
            .filter(parcel::Column::Status.eq(ParcelStatus::DeliveryPending.as_str()))
            .filter(parcel::Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn convert_pickup_to_delivery(&self, parcel_id: i64) -> Result<bool, RepositoryError> {
        let result = parcel::Entity::update_many()
            .col_expr(
                parcel::Column::Status,
                Expr::value(ParcelStatus::DeliveryPending.as_str()),
            )
            .filter(parcel::Column::Id.eq(parcel_id))
            .filter(parcel::Column::Status.eq(ParcelStatus::PickupCompleted.as_str()))
            .filter(parcel::Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn pending_pickup_counts(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<(i64, i64)>, RepositoryError> {
        let rows: Vec<(Option<i64>, i64)> = parcel::Entity::find()
            .select_only()
            .column(parcel::Column::PickupDriverId)
            .column_as(parcel::Column::Id.count(), "pending_count")
            .filter(parcel::Column::Status.eq(ParcelStatus::PickupPending.as_str()))
            .filter(parcel::Column::IsDeleted.eq(false))
            .filter(
                Condition::any()
                    .add(parcel::Column::PickupScheduledDate.is_null())
                    .add(parcel::Column::PickupScheduledDate.lte(today)),
            )
            .group_by(parcel::Column::PickupDriverId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        // unassigned pending parcels are grouped under driver 0
        Ok(rows
            .into_iter()
            .map(|(driver_id, count)| (driver_id.unwrap_or(0), count))
            .collect())
    }

    async fn completed_pickup_count_today(
        &self,
        today: NaiveDate,
    ) -> Result<i64, RepositoryError> {
        let (start, end) = day_range(today);
        let count = parcel::Entity::find()
            .filter(parcel::Column::Status.eq(ParcelStatus::PickupCompleted.as_str()))
            .filter(parcel::Column::PickupCompletedAt.gte(start))
            .filter(parcel::Column::PickupCompletedAt.lt(end))
            .filter(parcel::Column::IsDeleted.eq(false))
            .count(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(count as i64)
    }

    async fn completed_pickups_unclaimed_today(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<Parcel>, RepositoryError> {
        let (start, end) = day_range(today);
        let rows = Self::select_with_names()
            .filter(parcel::Column::Status.eq(ParcelStatus::PickupCompleted.as_str()))
            .filter(parcel::Column::PickupCompletedAt.gte(start))
            .filter(parcel::Column::PickupCompletedAt.lt(end))
            .filter(parcel::Column::DeliveryDriverId.is_null())
            .filter(parcel::Column::IsDeleted.eq(false))
            .into_model::<ParcelRow>()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Self::rows_to_parcels(rows)
    }

    async fn unassigned_deliveries_today(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<Parcel>, RepositoryError> {
        let (start, end) = day_range(today);
        let rows = Self::select_with_names()
            .filter(parcel::Column::Status.eq(ParcelStatus::DeliveryPending.as_str()))
            .filter(parcel::Column::DeliveryDriverId.is_null())
            .filter(parcel::Column::PickupCompletedAt.gte(start))
            .filter(parcel::Column::PickupCompletedAt.lt(end))
            .filter(parcel::Column::IsDeleted.eq(false))
            .into_model::<ParcelRow>()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Self::rows_to_parcels(rows)
    }

    async fn daily_status_counts(
        &self,
        today: NaiveDate,
    ) -> Result<DailyStatusCounts, RepositoryError> {
        let by_status: Vec<(String, i64)> = parcel::Entity::find()
            .select_only()
            .column(parcel::Column::Status)
            .column_as(parcel::Column::Id.count(), "count")
            .filter(parcel::Column::IsDeleted.eq(false))
            .group_by(parcel::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        let pickups_completed_today = self.completed_pickup_count_today(today).await?;

        let (start, end) = day_range(today);
        let deliveries_completed_today = parcel::Entity::find()
            .filter(parcel::Column::Status.eq(ParcelStatus::DeliveryCompleted.as_str()))
            .filter(parcel::Column::DeliveryCompletedAt.gte(start))
            .filter(parcel::Column::DeliveryCompletedAt.lt(end))
            .filter(parcel::Column::IsDeleted.eq(false))
            .count(&self.db)
            .await
            .map_err(map_db_err)? as i64;

        Ok(DailyStatusCounts {
            by_status,
            pickups_completed_today,
            deliveries_completed_today,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_range_is_half_open() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let (start, end) = day_range(day);
        assert_eq!(start, day.and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 6, 3).unwrap().and_hms_opt(0, 0, 0).unwrap());
    }
}
