//! Hub-arrival reporting.
//!
//! Accepted only when the driver has no outstanding stops for their phase;
//! the resulting flag makes the hub the driver's current position until the
//! planner hands out a new stop.

use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use thiserror::Error;
use tracing::info;

use crate::boundary::ports::{ParcelRepository, RepositoryError};
use crate::domain::model::driver::Phase;
use crate::domain::model::location::{GeoPoint, HUB_NAME, HUB_POINT};
use crate::domain::services::hub_status::HubStatusRegistry;

#[derive(Debug, Error)]
pub enum HubArrivalError {
    /// The driver still has outstanding stops; carries the count.
    #[error("{0} stops still outstanding")]
    StopsOutstanding(usize),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, PartialEq)]
pub struct HubArrivalOutcome {
    pub location: GeoPoint,
    pub location_name: &'static str,
    pub arrival_time: String,
}

/// Hub-arrival handler, phase-parameterized.
pub struct HubArrivalHandler<P>
where
    P: ParcelRepository,
{
    parcels: Arc<P>,
    hub_status: Arc<HubStatusRegistry>,
}

impl<P> HubArrivalHandler<P>
where
    P: ParcelRepository,
{
    pub fn new(parcels: Arc<P>, hub_status: Arc<HubStatusRegistry>) -> Self {
        Self { parcels, hub_status }
    }

    pub async fn handle(
        &self,
        phase: Phase,
        driver_id: i64,
        now: DateTime<Tz>,
    ) -> Result<HubArrivalOutcome, HubArrivalError> {
        let today = now.date_naive();
        let outstanding = match phase {
            Phase::Pickup => self.parcels.pending_pickups(driver_id, today).await?,
            Phase::Delivery => self.parcels.pending_deliveries(driver_id).await?,
        };
        if !outstanding.is_empty() {
            return Err(HubArrivalError::StopsOutstanding(outstanding.len()));
        }

        self.hub_status.mark_arrived(driver_id);
        info!(driver_id, "hub arrival recorded");

        Ok(HubArrivalOutcome {
            location: HUB_POINT,
            location_name: HUB_NAME,
            arrival_time: now.format("%H:%M").to_string(),
        })
    }
}
