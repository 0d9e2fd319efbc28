//! Parcel Repository Port
//!
//! The explicit query surface over the parcels store. Every operation is a
//! single statement; guarded updates report whether a row was affected and
//! callers must not treat a zero-row update as success.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::domain::model::parcel::Parcel;

/// Repository failure taxonomy. Failures are surfaced, never swallowed.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Query execution error
    #[error("Query error: {0}")]
    QueryError(String),

    /// A stored row could not be mapped into the domain model
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

/// Per-status counts for the daily monitoring aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyStatusCounts {
    pub by_status: Vec<(String, i64)>,
    pub pickups_completed_today: i64,
    pub deliveries_completed_today: i64,
}

/// Parcel Repository Port
///
/// Implemented by the MySQL adapter. All reads respect the soft-delete flag.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParcelRepository: Send + Sync {
    /// Load one parcel with owner and driver names joined in.
    async fn find_by_id(&self, id: i64) -> Result<Option<Parcel>, RepositoryError>;

    /// Outstanding pickups for a driver: `PICKUP_PENDING`, scheduled for
    /// `today` or earlier (or unscheduled), newest first.
    async fn pending_pickups(
        &self,
        driver_id: i64,
        today: NaiveDate,
    ) -> Result<Vec<Parcel>, RepositoryError>;

    /// Outstanding deliveries for a driver: `DELIVERY_PENDING`, newest first.
    async fn pending_deliveries(&self, driver_id: i64) -> Result<Vec<Parcel>, RepositoryError>;

    /// Address of the driver's most recent completed stop today for the
    /// given phase, if any.
    async fn last_completed_pickup_addr(
        &self,
        driver_id: i64,
        today: NaiveDate,
    ) -> Result<Option<String>, RepositoryError>;

    /// Delivery-phase counterpart of [`Self::last_completed_pickup_addr`].
    async fn last_completed_delivery_addr(
        &self,
        driver_id: i64,
        today: NaiveDate,
    ) -> Result<Option<String>, RepositoryError>;

    /// Assign a pickup driver and scheduled date. `next_target` marks the
    /// parcel as the driver's next pickup (same-day ingest only). Returns
    /// whether a row changed.
    async fn assign_pickup(
        &self,
        parcel_id: i64,
        driver_id: i64,
        scheduled: NaiveDate,
        next_target: bool,
    ) -> Result<bool, RepositoryError>;

    /// Assign a delivery driver; requires current status `DELIVERY_PENDING`.
    async fn assign_delivery(&self, parcel_id: i64, driver_id: i64)
        -> Result<bool, RepositoryError>;

    /// Guarded `PICKUP_PENDING -> PICKUP_COMPLETED` with completion stamp.
    async fn complete_pickup(
        &self,
        parcel_id: i64,
        completed_at: NaiveDateTime,
    ) -> Result<bool, RepositoryError>;

    /// Guarded `DELIVERY_PENDING -> DELIVERY_COMPLETED` with completion stamp.
    async fn complete_delivery(
        &self,
        parcel_id: i64,
        completed_at: NaiveDateTime,
    ) -> Result<bool, RepositoryError>;

    /// Guarded `PICKUP_COMPLETED -> DELIVERY_PENDING`.
    async fn convert_pickup_to_delivery(&self, parcel_id: i64) -> Result<bool, RepositoryError>;

    /// Outstanding pickup counts per driver across the fleet, for the
    /// phase-transition sweep.
    async fn pending_pickup_counts(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<(i64, i64)>, RepositoryError>;

    /// Number of pickups completed today across the fleet.
    async fn completed_pickup_count_today(&self, today: NaiveDate)
        -> Result<i64, RepositoryError>;

    /// Today's completed pickups not yet claimed for delivery.
    async fn completed_pickups_unclaimed_today(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<Parcel>, RepositoryError>;

    /// Today's converted deliveries with no delivery driver yet.
    async fn unassigned_deliveries_today(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<Parcel>, RepositoryError>;

    /// Monitoring aggregate: live status counts plus today's completions.
    async fn daily_status_counts(
        &self,
        today: NaiveDate,
    ) -> Result<DailyStatusCounts, RepositoryError>;
}
