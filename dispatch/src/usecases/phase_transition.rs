//! Pickup → delivery phase transition.
//!
//! Three operations share this module: the all-completed sweep that checks
//! whether any driver still has outstanding pickups, the import step that
//! converts today's completed pickups into pending deliveries, and the
//! assignment step that hands each converted delivery to the driver owning
//! its district.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use crate::boundary::ports::{Geocoder, ParcelRepository, RepositoryError};
use crate::domain::services::district::{extract_district, DistrictMap};

#[derive(Debug, Error)]
pub enum PhaseTransitionError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result of the import step: conversions grouped by district.
#[derive(Debug, Default, PartialEq)]
pub struct ImportSummary {
    pub converted: usize,
    pub by_district: HashMap<String, usize>,
}

/// Result of the assignment step, per district.
#[derive(Debug, Default, PartialEq)]
pub struct AssignSummary {
    pub assignments: HashMap<String, DistrictAssignment>,
}

#[derive(Debug, PartialEq)]
pub struct DistrictAssignment {
    pub driver_id: i64,
    pub count: usize,
}

/// Result of the all-completed sweep.
#[derive(Debug, PartialEq)]
pub enum SweepOutcome {
    /// Some driver still has outstanding pickups.
    NotYet {
        remaining: i64,
        completed_count: i64,
        first_pending_driver: i64,
        first_pending_count: i64,
    },
    /// Everything picked up; conversion and assignment have run.
    Converted { total_converted: i64, import: ImportSummary, assign: AssignSummary },
    /// Nothing was picked up today at all.
    NoPickupsToday,
}

/// Phase-transition handler.
pub struct PhaseTransitionHandler<P, G>
where
    P: ParcelRepository,
    G: Geocoder,
{
    parcels: Arc<P>,
    geocoder: Arc<G>,
    delivery_districts: DistrictMap,
}

impl<P, G> PhaseTransitionHandler<P, G>
where
    P: ParcelRepository,
    G: Geocoder,
{
    pub fn new(parcels: Arc<P>, geocoder: Arc<G>, delivery_districts: DistrictMap) -> Self {
        Self { parcels, geocoder, delivery_districts }
    }

    /// Convert today's completed, unclaimed pickups into pending deliveries.
    pub async fn import_today(&self, today: NaiveDate) -> Result<ImportSummary, PhaseTransitionError> {
        let completed = self.parcels.completed_pickups_unclaimed_today(today).await?;

        let mut summary = ImportSummary::default();
        for pickup in &completed {
            if self.parcels.convert_pickup_to_delivery(pickup.id).await? {
                summary.converted += 1;
                if let Some(district) = self.district_of(&pickup.recipient_addr).await {
                    *summary.by_district.entry(district).or_insert(0) += 1;
                }
            }
        }

        info!(converted = summary.converted, "completed pickups imported for delivery");
        Ok(summary)
    }

    /// Assign today's unassigned deliveries to their district owners.
    pub async fn assign_today(&self, today: NaiveDate) -> Result<AssignSummary, PhaseTransitionError> {
        let unassigned = self.parcels.unassigned_deliveries_today(today).await?;

        let mut by_district: HashMap<String, Vec<i64>> = HashMap::new();
        for delivery in &unassigned {
            match self.district_of(&delivery.recipient_addr).await {
                Some(district) => by_district.entry(district).or_default().push(delivery.id),
                None => warn!(parcel_id = delivery.id, addr = %delivery.recipient_addr,
                              "district could not be determined, delivery left unassigned"),
            }
        }

        let mut summary = AssignSummary::default();
        for (district, parcel_ids) in by_district {
            let Some(driver_id) = self.delivery_districts.driver_for(&district) else {
                warn!(%district, "no delivery driver for district");
                continue;
            };

            let mut count = 0;
            for parcel_id in parcel_ids {
                if self.parcels.assign_delivery(parcel_id, driver_id).await? {
                    count += 1;
                }
            }
            summary.assignments.insert(district, DistrictAssignment { driver_id, count });
        }

        info!(districts = summary.assignments.len(), "deliveries assigned by district");
        Ok(summary)
    }

    /// The all-completed sweep: report outstanding pickups, or convert and
    /// assign once none remain.
    pub async fn sweep(&self, today: NaiveDate) -> Result<SweepOutcome, PhaseTransitionError> {
        let pending = self.parcels.pending_pickup_counts(today).await?;
        let completed_count = self.parcels.completed_pickup_count_today(today).await?;

        let total_pending: i64 = pending.iter().map(|(_, count)| count).sum();
        if total_pending > 0 {
            let (first_driver, first_count) = pending
                .iter()
                .find(|(_, count)| *count > 0)
                .copied()
                .unwrap_or((0, 0));
            return Ok(SweepOutcome::NotYet {
                remaining: total_pending,
                completed_count,
                first_pending_driver: first_driver,
                first_pending_count: first_count,
            });
        }

        if completed_count == 0 {
            return Ok(SweepOutcome::NoPickupsToday);
        }

        let import = self.import_today(today).await?;
        let assign = self.assign_today(today).await?;
        Ok(SweepOutcome::Converted { total_converted: completed_count, import, assign })
    }

    /// Structured district resolution with a plain token-scan fallback.
    async fn district_of(&self, address: &str) -> Option<String> {
        match self.geocoder.resolve_district(address).await {
            Some(district) => Some(district),
            None => extract_district(address).map(|d| d.to_string()),
        }
    }
}
