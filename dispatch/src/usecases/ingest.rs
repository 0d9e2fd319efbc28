//! Pickup announcement ingest.
//!
//! ## Flow
//! 1. At or after the 12:00 cut-off, resolve the district from the address
//!    and schedule the parcel for tomorrow's round
//! 2. Before the cut-off, load the parcel (idempotent when already
//!    assigned), resolve the district, and assign today's round with the
//!    next-target flag set

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::info;

use crate::boundary::ports::{Geocoder, ParcelRepository, RepositoryError};
use crate::domain::model::driver::pickup_cutoff;
use crate::domain::model::location::GeoPoint;
use crate::domain::services::district::{extract_district, DistrictMap};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Parcel not found: {0}")]
    ParcelNotFound(i64),

    #[error("Could not determine district from address")]
    NoDistrict,

    #[error("No driver for district {0}")]
    NoDriverForDistrict(String),

    #[error("Assignment changed no rows for parcel {0}")]
    StaleState(i64),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, PartialEq)]
pub enum IngestOutcome {
    /// Ingested after the cut-off; scheduled for tomorrow's round.
    ScheduledTomorrow { scheduled_date: NaiveDate, current_time: String },
    /// Parcel already carries a pickup driver.
    AlreadyProcessed,
    /// Assigned to today's round.
    Assigned { district: String, driver_id: i64, coordinates: GeoPoint },
}

/// Ingest handler for new pickup announcements.
pub struct IngestHandler<P, G>
where
    P: ParcelRepository,
    G: Geocoder,
{
    parcels: Arc<P>,
    geocoder: Arc<G>,
    districts: DistrictMap,
}

impl<P, G> IngestHandler<P, G>
where
    P: ParcelRepository,
    G: Geocoder,
{
    pub fn new(parcels: Arc<P>, geocoder: Arc<G>, districts: DistrictMap) -> Self {
        Self { parcels, geocoder, districts }
    }

    pub async fn handle(
        &self,
        parcel_id: i64,
        now: DateTime<Tz>,
    ) -> Result<IngestOutcome, IngestError> {
        if now.time() >= pickup_cutoff() {
            return self.schedule_for_tomorrow(parcel_id, now).await;
        }

        let parcel = self
            .parcels
            .find_by_id(parcel_id)
            .await?
            .ok_or(IngestError::ParcelNotFound(parcel_id))?;

        if parcel.pickup_driver_id.is_some() {
            return Ok(IngestOutcome::AlreadyProcessed);
        }

        let coordinates = self.geocoder.geocode(&parcel.recipient_addr).await.point;
        let district = self
            .geocoder
            .resolve_district(&parcel.recipient_addr)
            .await
            .ok_or(IngestError::NoDistrict)?;

        let driver_id = self
            .districts
            .driver_for(&district)
            .ok_or_else(|| IngestError::NoDriverForDistrict(district.clone()))?;

        let assigned = self
            .parcels
            .assign_pickup(parcel_id, driver_id, now.date_naive(), true)
            .await?;
        if !assigned {
            return Err(IngestError::StaleState(parcel_id));
        }

        info!(parcel_id, driver_id, district = %district, "parcel assigned for today's round");
        Ok(IngestOutcome::Assigned { district, driver_id, coordinates })
    }

    /// Cut-off branch: district comes from the address text alone and the
    /// next-target flag stays clear until tomorrow's planning.
    async fn schedule_for_tomorrow(
        &self,
        parcel_id: i64,
        now: DateTime<Tz>,
    ) -> Result<IngestOutcome, IngestError> {
        let parcel = self
            .parcels
            .find_by_id(parcel_id)
            .await?
            .ok_or(IngestError::ParcelNotFound(parcel_id))?;

        let district = extract_district(&parcel.recipient_addr)
            .ok_or(IngestError::NoDistrict)?
            .to_string();
        let driver_id = self
            .districts
            .driver_for(&district)
            .ok_or_else(|| IngestError::NoDriverForDistrict(district.clone()))?;

        let tomorrow = now.date_naive() + Duration::days(1);
        let assigned = self.parcels.assign_pickup(parcel_id, driver_id, tomorrow, false).await?;
        if !assigned {
            return Err(IngestError::StaleState(parcel_id));
        }

        info!(parcel_id, driver_id, %tomorrow, "post-cutoff parcel scheduled for tomorrow");
        Ok(IngestOutcome::ScheduledTomorrow {
            scheduled_date: tomorrow,
            current_time: now.format("%H:%M").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Asia::Seoul;

    use super::*;
    use crate::boundary::ports::geocoder::{Geocoded, MockGeocoder};
    use crate::boundary::ports::parcel_repository::MockParcelRepository;
    use crate::domain::model::driver::Phase;
    use crate::domain::model::parcel::{Parcel, ParcelStatus};

    fn unassigned_parcel(id: i64, addr: &str) -> Parcel {
        Parcel {
            id,
            owner_id: 100,
            owner_name: None,
            size: "S".to_string(),
            recipient_addr: addr.to_string(),
            recipient_name: None,
            recipient_phone: None,
            product_name: "화장품".to_string(),
            status: ParcelStatus::PickupPending,
            pickup_driver_id: None,
            pickup_driver_name: None,
            delivery_driver_id: None,
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

    fn handler(
        parcels: MockParcelRepository,
        geocoder: MockGeocoder,
    ) -> IngestHandler<MockParcelRepository, MockGeocoder> {
        IngestHandler::new(
            Arc::new(parcels),
            Arc::new(geocoder),
            DistrictMap::with_defaults(Phase::Pickup),
        )
    }

    #[tokio::test]
    async fn test_post_cutoff_schedules_tomorrow() {
        let mut parcels = MockParcelRepository::new();
        parcels
            .expect_find_by_id()
            .returning(|id| Ok(Some(unassigned_parcel(id, "서울 강남구 테헤란로 1"))));
        parcels
            .expect_assign_pickup()
            .withf(|parcel_id, driver_id, scheduled, next_target| {
                *parcel_id == 777
                    && *driver_id == 5
                    && *scheduled == NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()
                    && !*next_target
            })
            .returning(|_, _, _, _| Ok(true));

        let h = handler(parcels, MockGeocoder::new());
        let now = Seoul.with_ymd_and_hms(2025, 6, 2, 13, 15, 0).unwrap();
        let outcome = h.handle(777, now).await.unwrap();

        match outcome {
            IngestOutcome::ScheduledTomorrow { scheduled_date, current_time } => {
                assert_eq!(scheduled_date, NaiveDate::from_ymd_opt(2025, 6, 3).unwrap());
                assert_eq!(current_time, "13:15");
            }
            other => panic!("expected ScheduledTomorrow, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_before_cutoff_assigns_today_with_next_target() {
        let mut parcels = MockParcelRepository::new();
        parcels
            .expect_find_by_id()
            .returning(|id| Ok(Some(unassigned_parcel(id, "서울 마포구 공덕동 10"))));
        parcels
            .expect_assign_pickup()
            .withf(|_, driver_id, scheduled, next_target| {
                *driver_id == 1
                    && *scheduled == NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
                    && *next_target
            })
            .returning(|_, _, _, _| Ok(true));

        let mut geocoder = MockGeocoder::new();
        geocoder.expect_geocode().returning(|_| Geocoded {
            point: GeoPoint::new(37.5638, 126.9084),
            label: "마포구 공덕동".to_string(),
            confidence: 0.95,
        });
        geocoder
            .expect_resolve_district()
            .returning(|_| Some("마포구".to_string()));

        let h = handler(parcels, geocoder);
        let now = Seoul.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        let outcome = h.handle(55, now).await.unwrap();

        match outcome {
            IngestOutcome::Assigned { district, driver_id, .. } => {
                assert_eq!(district, "마포구");
                assert_eq!(driver_id, 1);
            }
            other => panic!("expected Assigned, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_already_assigned_is_idempotent() {
        let mut parcels = MockParcelRepository::new();
        parcels.expect_find_by_id().returning(|id| {
            let mut p = unassigned_parcel(id, "서울 중구 명동 1");
            p.pickup_driver_id = Some(3);
            Ok(Some(p))
        });

        let h = handler(parcels, MockGeocoder::new());
        let now = Seoul.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        assert_eq!(h.handle(9, now).await.unwrap(), IngestOutcome::AlreadyProcessed);
    }

    #[tokio::test]
    async fn test_unknown_district_rejected() {
        let mut parcels = MockParcelRepository::new();
        parcels
            .expect_find_by_id()
            .returning(|id| Ok(Some(unassigned_parcel(id, "제주도 서귀포시 1"))));

        let mut geocoder = MockGeocoder::new();
        geocoder.expect_geocode().returning(|_| Geocoded {
            point: GeoPoint::new(37.5665, 126.978),
            label: "서울시청".to_string(),
            confidence: 0.1,
        });
        geocoder.expect_resolve_district().returning(|_| None);

        let h = handler(parcels, geocoder);
        let now = Seoul.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        assert!(matches!(h.handle(9, now).await, Err(IngestError::NoDistrict)));
    }

    #[tokio::test]
    async fn test_missing_parcel_not_found() {
        let mut parcels = MockParcelRepository::new();
        parcels.expect_find_by_id().returning(|_| Ok(None));

        let h = handler(parcels, MockGeocoder::new());
        let now = Seoul.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        assert!(matches!(h.handle(404, now).await, Err(IngestError::ParcelNotFound(404))));
    }
}
