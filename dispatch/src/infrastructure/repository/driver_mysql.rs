//! MySQL implementation of DriverRepository
//!
//! Joins the `User` account with its `DriverInfo` registration and derives
//! the coarse zone from the registered district.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::boundary::ports::{DriverRepository, RepositoryError};
use crate::domain::model::driver::DriverProfile;
use crate::domain::services::district::zone_for_district;
use crate::infrastructure::repository::entities::{driver_info, user};

/// MySQL implementation of DriverRepository using Sea-ORM
pub struct DriverMysqlRepository {
    db: DatabaseConnection,
}

impl DriverMysqlRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DriverRepository for DriverMysqlRepository {
    async fn find_by_user_id(
        &self,
        user_id: i64,
    ) -> Result<Option<DriverProfile>, RepositoryError> {
        let Some(account) = user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| RepositoryError::QueryError(e.to_string()))?
        else {
            return Ok(None);
        };

        let Some(registration) = driver_info::Entity::find()
            .filter(driver_info::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| RepositoryError::QueryError(e.to_string()))?
        else {
            return Ok(None);
        };

        let district = registration.region_district.unwrap_or_default();
        let zone = zone_for_district(&district).to_string();

        Ok(Some(DriverProfile {
            user_id,
            name: account.name,
            district,
            zone,
            phone_number: registration.phone_number,
            vehicle_number: registration.vehicle_number,
        }))
    }
}
