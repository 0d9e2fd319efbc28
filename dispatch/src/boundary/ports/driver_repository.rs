//! Driver Repository Port
//!
//! Drivers are looked up from the user store, never created or mutated here.

use async_trait::async_trait;

use crate::domain::model::driver::DriverProfile;

use super::parcel_repository::RepositoryError;

/// Driver Repository Port
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DriverRepository: Send + Sync {
    /// Load the driver profile for an authenticated user id, joining the
    /// user record with its driver registration.
    async fn find_by_user_id(&self, user_id: i64)
        -> Result<Option<DriverProfile>, RepositoryError>;
}
