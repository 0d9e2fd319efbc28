//! Stop completion for both phases.
//!
//! Verifies the calling driver owns the parcel for the phase, advances the
//! state machine through a guarded update, and reports how many stops
//! remain for the driver.

use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use thiserror::Error;
use tracing::info;

use crate::boundary::ports::{ParcelRepository, RepositoryError};
use crate::domain::model::driver::Phase;

#[derive(Debug, Error)]
pub enum CompleteError {
    #[error("Parcel not found: {0}")]
    ParcelNotFound(i64),

    #[error("Parcel {0} is not owned by driver {1}")]
    NotOwner(i64, i64),

    #[error("Completion changed no rows for parcel {0}")]
    StaleState(i64),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, PartialEq)]
pub struct CompleteOutcome {
    pub remaining: usize,
    pub completed_at: String,
}

/// Completion handler, phase-parameterized.
pub struct CompleteHandler<P>
where
    P: ParcelRepository,
{
    parcels: Arc<P>,
}

impl<P> CompleteHandler<P>
where
    P: ParcelRepository,
{
    pub fn new(parcels: Arc<P>) -> Self {
        Self { parcels }
    }

    pub async fn handle(
        &self,
        phase: Phase,
        driver_id: i64,
        parcel_id: i64,
        now: DateTime<Tz>,
    ) -> Result<CompleteOutcome, CompleteError> {
        let parcel = self
            .parcels
            .find_by_id(parcel_id)
            .await?
            .ok_or(CompleteError::ParcelNotFound(parcel_id))?;

        let owned = match phase {
            Phase::Pickup => parcel.is_pickup_owner(driver_id),
            Phase::Delivery => parcel.is_delivery_owner(driver_id),
        };
        if !owned {
            return Err(CompleteError::NotOwner(parcel_id, driver_id));
        }

        let stamp = now.naive_local();
        let changed = match phase {
            Phase::Pickup => self.parcels.complete_pickup(parcel_id, stamp).await?,
            Phase::Delivery => self.parcels.complete_delivery(parcel_id, stamp).await?,
        };
        if !changed {
            return Err(CompleteError::StaleState(parcel_id));
        }

        let today = now.date_naive();
        let remaining = match phase {
            Phase::Pickup => self.parcels.pending_pickups(driver_id, today).await?.len(),
            Phase::Delivery => self.parcels.pending_deliveries(driver_id).await?.len(),
        };

        info!(driver_id, parcel_id, remaining, "stop completed");
        Ok(CompleteOutcome { remaining, completed_at: now.to_rfc3339() })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::Asia::Seoul;

    use super::*;
    use crate::boundary::ports::parcel_repository::MockParcelRepository;
    use crate::domain::model::parcel::{Parcel, ParcelStatus};

    fn parcel_for(driver_id: i64, phase: Phase) -> Parcel {
        Parcel {
            id: 42,
            owner_id: 100,
            owner_name: None,
            size: "M".to_string(),
            recipient_addr: "서울 종로구 종로 1".to_string(),
            recipient_name: None,
            recipient_phone: None,
            product_name: "책".to_string(),
            status: match phase {
                Phase::Pickup => ParcelStatus::PickupPending,
                Phase::Delivery => ParcelStatus::DeliveryPending,
            },
            pickup_driver_id: (phase == Phase::Pickup).then_some(driver_id),
            pickup_driver_name: None,
            delivery_driver_id: (phase == Phase::Delivery).then_some(driver_id),
            delivery_driver_name: None,
            pickup_scheduled_date: None,
            pickup_completed_at: None,
            delivery_completed_at: None,
            is_next_pickup_target: false,
            is_next_delivery_target: false,
            created_at: NaiveDate::from_ymd_opt(2025, 6, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_complete_pickup_reports_remaining() {
        let mut parcels = MockParcelRepository::new();
        parcels
            .expect_find_by_id()
            .returning(|_| Ok(Some(parcel_for(3, Phase::Pickup))));
        parcels.expect_complete_pickup().returning(|_, _| Ok(true));
        parcels
            .expect_pending_pickups()
            .returning(|_, _| Ok(vec![parcel_for(3, Phase::Pickup), parcel_for(3, Phase::Pickup)]));

        let h = CompleteHandler::new(Arc::new(parcels));
        let now = Seoul.with_ymd_and_hms(2025, 6, 2, 9, 30, 0).unwrap();
        let outcome = h.handle(Phase::Pickup, 3, 42, now).await.unwrap();
        assert_eq!(outcome.remaining, 2);
    }

    #[tokio::test]
    async fn test_wrong_driver_is_rejected() {
        let mut parcels = MockParcelRepository::new();
        parcels
            .expect_find_by_id()
            .returning(|_| Ok(Some(parcel_for(3, Phase::Delivery))));

        let h = CompleteHandler::new(Arc::new(parcels));
        let now = Seoul.with_ymd_and_hms(2025, 6, 2, 16, 0, 0).unwrap();
        let result = h.handle(Phase::Delivery, 8, 42, now).await;
        assert!(matches!(result, Err(CompleteError::NotOwner(42, 8))));
    }

    #[tokio::test]
    async fn test_zero_row_update_is_stale_state() {
        let mut parcels = MockParcelRepository::new();
        parcels
            .expect_find_by_id()
            .returning(|_| Ok(Some(parcel_for(3, Phase::Pickup))));
        parcels.expect_complete_pickup().returning(|_, _| Ok(false));

        let h = CompleteHandler::new(Arc::new(parcels));
        let now = Seoul.with_ymd_and_hms(2025, 6, 2, 9, 30, 0).unwrap();
        let result = h.handle(Phase::Pickup, 3, 42, now).await;
        assert!(matches!(result, Err(CompleteError::StaleState(42))));
    }
}
