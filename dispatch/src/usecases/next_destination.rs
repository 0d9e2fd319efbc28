//! Next-destination planner.
//!
//! One phase-parameterized planner serves both the pickup and the delivery
//! sides: the phase decides which outstanding-stops query runs, when the
//! working window opens, and which district map gates the driver role.
//!
//! ## Flow
//! 1. Reject requests before the phase window opens
//! 2. Load outstanding stops and infer the current position
//! 3. Empty pool: at-hub / waiting-for-orders / return-to-hub
//! 4. Otherwise: geocode stops, fetch the live-traffic time matrix, solve
//!    the tour, pick the next stop, fetch guidance for it
//!
//! Optimizer and matrix failures degrade to nearest-neighbor; a failed
//! guidance fetch downgrades further to a routeless fallback. The request
//! itself never fails for external-service reasons.

use std::sync::Arc;

use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::{info, warn};

use crate::boundary::ports::{
    Geocoder, ParcelRepository, RepositoryError, RoutingEngine, TourOptimizer,
};
use crate::domain::model::driver::{pickup_cutoff, Phase};
use crate::domain::model::location::{GeoPoint, StopLocation, HUB_NAME, HUB_POINT};
use crate::domain::model::parcel::Parcel;
use crate::domain::model::route::RoutePayload;
use crate::domain::services::hub_status::HubStatusRegistry;
use crate::domain::services::waypoints::enrich_route;

/// How the next stop was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerAlgorithm {
    LkhTsp,
    Nearest,
    Fallback,
}

impl PlannerAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlannerAlgorithm::LkhTsp => "LKH_TSP",
            PlannerAlgorithm::Nearest => "nearest",
            PlannerAlgorithm::Fallback => "fallback",
        }
    }
}

/// Planner result, rendered into the per-phase wire shape by the HTTP layer.
#[derive(Debug)]
pub enum PlannerOutcome {
    /// The phase window has not opened yet.
    Waiting {
        current_time: String,
        hours_left: u32,
        minutes_left: u32,
    },
    /// Driver already reported hub arrival and nothing is outstanding.
    AtHub { current_location: GeoPoint },
    /// Pickup pool is empty but the cut-off has not passed.
    WaitingForOrders {
        current_time: String,
        current_location: GeoPoint,
    },
    /// Nothing outstanding; guide the driver back to the hub.
    ReturnToHub {
        route: Option<RoutePayload>,
        current_location: GeoPoint,
        distance_to_hub: f64,
    },
    /// The next stop, with guidance when the engine cooperated.
    Next {
        destination: StopLocation,
        route: Option<RoutePayload>,
        remaining: usize,
        current_location: GeoPoint,
        algorithm: PlannerAlgorithm,
    },
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Next-destination planner over the external ports.
pub struct NextDestinationPlanner<P, G, R, O>
where
    P: ParcelRepository,
    G: Geocoder,
    R: RoutingEngine,
    O: TourOptimizer,
{
    parcels: Arc<P>,
    geocoder: Arc<G>,
    routing: Arc<R>,
    optimizer: Arc<O>,
    hub_status: Arc<HubStatusRegistry>,
}

impl<P, G, R, O> NextDestinationPlanner<P, G, R, O>
where
    P: ParcelRepository,
    G: Geocoder,
    R: RoutingEngine,
    O: TourOptimizer,
{
    pub fn new(
        parcels: Arc<P>,
        geocoder: Arc<G>,
        routing: Arc<R>,
        optimizer: Arc<O>,
        hub_status: Arc<HubStatusRegistry>,
    ) -> Self {
        Self { parcels, geocoder, routing, optimizer, hub_status }
    }

    pub async fn handle(
        &self,
        phase: Phase,
        driver_id: i64,
        now: DateTime<Tz>,
    ) -> Result<PlannerOutcome, PlannerError> {
        let current_time = now.time();
        let window_open = phase.window_open();

        if current_time < window_open {
            let mut hours_left = window_open.hour() as i32 - current_time.hour() as i32;
            let mut minutes_left = window_open.minute() as i32 - current_time.minute() as i32;
            if minutes_left < 0 {
                hours_left -= 1;
                minutes_left += 60;
            }
            return Ok(PlannerOutcome::Waiting {
                current_time: now.format("%H:%M").to_string(),
                hours_left: hours_left.max(0) as u32,
                minutes_left: minutes_left.max(0) as u32,
            });
        }

        let today = now.date_naive();
        let outstanding = match phase {
            Phase::Pickup => self.parcels.pending_pickups(driver_id, today).await?,
            Phase::Delivery => self.parcels.pending_deliveries(driver_id).await?,
        };

        let current_location = self.current_location(phase, driver_id, today).await?;

        if outstanding.is_empty() {
            if self.hub_status.is_at_hub(driver_id) {
                return Ok(PlannerOutcome::AtHub { current_location });
            }

            if phase == Phase::Pickup && current_time < pickup_cutoff() {
                return Ok(PlannerOutcome::WaitingForOrders {
                    current_time: now.format("%H:%M").to_string(),
                    current_location,
                });
            }

            let route = self.hub_return_route(current_location).await;
            let distance_to_hub = route.as_ref().map(|r| r.summary_length()).unwrap_or(0.0);
            return Ok(PlannerOutcome::ReturnToHub { route, current_location, distance_to_hub });
        }

        if self.hub_status.clear(driver_id) {
            info!(driver_id, "hub state reset, new cycle started");
        }

        let mut stops = Vec::with_capacity(outstanding.len());
        for parcel in &outstanding {
            stops.push(self.geocode_stop(parcel).await);
        }

        let mut points = Vec::with_capacity(stops.len() + 1);
        points.push(current_location);
        points.extend(stops.iter().map(|s| s.point()));

        let (next_index, mut algorithm) = self.choose_next_stop(&points).await;
        // next_index is an index into `points`; stops are offset by one
        let destination = stops[next_index - 1].clone();

        let route = match self.routing.turn_by_turn(current_location, destination.point()).await {
            Ok(mut payload) => {
                enrich_route(
                    &mut payload,
                    current_location,
                    phase_start_instruction(phase),
                    destination.point(),
                    &destination.name,
                    "목적지 도착",
                );
                Some(payload)
            }
            Err(e) => {
                warn!(error = %e, "guidance fetch failed for chosen stop");
                if algorithm == PlannerAlgorithm::Nearest {
                    algorithm = PlannerAlgorithm::Fallback;
                }
                None
            }
        };

        Ok(PlannerOutcome::Next {
            destination,
            route,
            remaining: outstanding.len(),
            current_location,
            algorithm,
        })
    }

    /// Current position: hub when the driver has checked in, otherwise the
    /// geocoded address of today's last completed stop, otherwise the hub.
    async fn current_location(
        &self,
        phase: Phase,
        driver_id: i64,
        today: chrono::NaiveDate,
    ) -> Result<GeoPoint, PlannerError> {
        if self.hub_status.is_at_hub(driver_id) {
            return Ok(HUB_POINT);
        }

        let last_addr = match phase {
            Phase::Pickup => self.parcels.last_completed_pickup_addr(driver_id, today).await?,
            Phase::Delivery => {
                self.parcels.last_completed_delivery_addr(driver_id, today).await?
            }
        };

        match last_addr {
            Some(addr) => Ok(self.geocoder.geocode(&addr).await.point),
            None => Ok(HUB_POINT),
        }
    }

    async fn geocode_stop(&self, parcel: &Parcel) -> StopLocation {
        let geocoded = self.geocoder.geocode(&parcel.recipient_addr).await;
        StopLocation {
            lat: geocoded.point.lat,
            lon: geocoded.point.lon,
            parcel_id: parcel.id,
            name: parcel.product_name.clone(),
            address: parcel.recipient_addr.clone(),
            location_name: Some(geocoded.label),
            recipient_name: parcel.recipient_name.clone(),
            recipient_phone: parcel.recipient_phone.clone(),
        }
    }

    /// Pick the index (into the full point list) of the next stop.
    ///
    /// The tour starts at node 0, the current position. The next stop is the
    /// first non-zero entry of the remainder, guarding against degenerate
    /// tours that revisit the origin; index 1 is the fallback. Matrix or
    /// solver failures degrade to nearest-neighbor, which is simply the
    /// first outstanding stop.
    async fn choose_next_stop(&self, points: &[GeoPoint]) -> (usize, PlannerAlgorithm) {
        let matrix = match self.routing.time_matrix(points).await {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "matrix request failed, using nearest stop");
                return (1, PlannerAlgorithm::Nearest);
            }
        };

        match self.optimizer.solve(&matrix).await {
            Ok(tour) if tour.order.len() > 1 => {
                let next = tour.order[1..].iter().copied().find(|&idx| idx != 0);
                match next {
                    Some(idx) if idx < points.len() => (idx, PlannerAlgorithm::LkhTsp),
                    _ => (1, PlannerAlgorithm::LkhTsp),
                }
            }
            Ok(_) => (1, PlannerAlgorithm::Nearest),
            Err(e) => {
                warn!(error = %e, "optimizer unavailable, using nearest stop");
                (1, PlannerAlgorithm::Nearest)
            }
        }
    }

    async fn hub_return_route(&self, current_location: GeoPoint) -> Option<RoutePayload> {
        match self.routing.turn_by_turn(current_location, HUB_POINT).await {
            Ok(mut payload) => {
                enrich_route(
                    &mut payload,
                    current_location,
                    "허브로 복귀 시작",
                    HUB_POINT,
                    HUB_NAME,
                    "허브 도착",
                );
                Some(payload)
            }
            Err(e) => {
                warn!(error = %e, "hub-return guidance fetch failed");
                None
            }
        }
    }
}

fn phase_start_instruction(phase: Phase) -> &'static str {
    match phase {
        Phase::Pickup => "수거 시작",
        Phase::Delivery => "배달 시작",
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::Asia::Seoul;
    use serde_json::Map;

    use super::*;
    use crate::boundary::ports::geocoder::{Geocoded, MockGeocoder};
    use crate::boundary::ports::optimizer::{MockTourOptimizer, OptimizerError, Tour};
    use crate::boundary::ports::parcel_repository::MockParcelRepository;
    use crate::boundary::ports::routing::{MockRoutingEngine, RoutingError, TimeMatrix};
    use crate::domain::model::parcel::ParcelStatus;
    use crate::domain::model::route::{Leg, Trip, TripSummary};

    fn seoul(h: u32, m: u32) -> DateTime<Tz> {
        Seoul.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
    }

    fn pending_parcel(id: i64, addr: &str) -> Parcel {
        Parcel {
            id,
            owner_id: 100,
            owner_name: Some("보내는이".to_string()),
            size: "M".to_string(),
            recipient_addr: addr.to_string(),
            recipient_name: Some("받는이".to_string()),
            recipient_phone: Some("010-0000-0000".to_string()),
            product_name: format!("상품{}", id),
            status: ParcelStatus::PickupPending,
            pickup_driver_id: Some(1),
            pickup_driver_name: None,
            delivery_driver_id: None,
            delivery_driver_name: None,
            pickup_scheduled_date: Some(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()),
            pickup_completed_at: None,
            delivery_completed_at: None,
            is_next_pickup_target: false,
            is_next_delivery_target: false,
            created_at: NaiveDate::from_ymd_opt(2025, 6, 2)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    fn geocoded(lat: f64, lon: f64) -> Geocoded {
        Geocoded {
            point: GeoPoint::new(lat, lon),
            label: "어딘가".to_string(),
            confidence: 0.95,
        }
    }

    fn trip_payload() -> RoutePayload {
        RoutePayload {
            trip: Some(Trip {
                legs: vec![Leg { maneuvers: vec![], shape: None, extra: Map::new() }],
                summary: Some(TripSummary {
                    length: Some(4.2),
                    time: Some(600.0),
                    extra: Map::new(),
                }),
                extra: Map::new(),
            }),
            waypoints: None,
            coordinates: None,
            extra: Map::new(),
        }
    }

    fn planner(
        parcels: MockParcelRepository,
        geocoder: MockGeocoder,
        routing: MockRoutingEngine,
        optimizer: MockTourOptimizer,
        hub: Arc<HubStatusRegistry>,
    ) -> NextDestinationPlanner<MockParcelRepository, MockGeocoder, MockRoutingEngine, MockTourOptimizer>
    {
        NextDestinationPlanner::new(
            Arc::new(parcels),
            Arc::new(geocoder),
            Arc::new(routing),
            Arc::new(optimizer),
            hub,
        )
    }

    fn three_pending() -> Vec<Parcel> {
        vec![
            pending_parcel(11, "서울 마포구 공덕동 1"),
            pending_parcel(12, "서울 마포구 성산동 2"),
            pending_parcel(13, "서울 서대문구 신촌동 3"),
        ]
    }

    #[tokio::test]
    async fn test_blocks_before_window() {
        let p = planner(
            MockParcelRepository::new(),
            MockGeocoder::new(),
            MockRoutingEngine::new(),
            MockTourOptimizer::new(),
            Arc::new(HubStatusRegistry::new()),
        );

        let outcome = p.handle(Phase::Pickup, 1, seoul(6, 30)).await.unwrap();
        match outcome {
            PlannerOutcome::Waiting { current_time, hours_left, minutes_left } => {
                assert_eq!(current_time, "06:30");
                assert_eq!(hours_left, 0);
                assert_eq!(minutes_left, 30);
            }
            other => panic!("expected Waiting, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tour_picks_first_non_origin_stop() {
        let mut parcels = MockParcelRepository::new();
        parcels.expect_pending_pickups().returning(|_, _| Ok(three_pending()));
        parcels.expect_last_completed_pickup_addr().returning(|_, _| Ok(None));

        let mut geocoder = MockGeocoder::new();
        geocoder.expect_geocode().returning(|_| geocoded(37.55, 126.95));

        let mut routing = MockRoutingEngine::new();
        routing
            .expect_time_matrix()
            .returning(|points| Ok(TimeMatrix { seconds: vec![vec![60.0; points.len()]; points.len()] }));
        routing.expect_turn_by_turn().returning(|_, _| Ok(trip_payload()));

        let mut optimizer = MockTourOptimizer::new();
        optimizer
            .expect_solve()
            .returning(|_| Ok(Tour { order: vec![0, 2, 1, 3], cost: 240.0 }));

        let p = planner(parcels, geocoder, routing, optimizer, Arc::new(HubStatusRegistry::new()));
        let outcome = p.handle(Phase::Pickup, 1, seoul(9, 0)).await.unwrap();

        match outcome {
            PlannerOutcome::Next { destination, remaining, algorithm, route, .. } => {
                // tour [0, 2, 1, 3] -> matrix node 2 -> second outstanding parcel
                assert_eq!(destination.parcel_id, 12);
                assert_eq!(remaining, 3);
                assert_eq!(algorithm, PlannerAlgorithm::LkhTsp);
                assert!(route.unwrap().waypoints.unwrap().len() >= 2);
            }
            other => panic!("expected Next, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_degenerate_tour_never_selects_origin() {
        let mut parcels = MockParcelRepository::new();
        parcels.expect_pending_pickups().returning(|_, _| Ok(three_pending()));
        parcels.expect_last_completed_pickup_addr().returning(|_, _| Ok(None));

        let mut geocoder = MockGeocoder::new();
        geocoder.expect_geocode().returning(|_| geocoded(37.55, 126.95));

        let mut routing = MockRoutingEngine::new();
        routing
            .expect_time_matrix()
            .returning(|points| Ok(TimeMatrix { seconds: vec![vec![60.0; points.len()]; points.len()] }));
        routing.expect_turn_by_turn().returning(|_, _| Ok(trip_payload()));

        let mut optimizer = MockTourOptimizer::new();
        optimizer
            .expect_solve()
            .returning(|_| Ok(Tour { order: vec![0, 0, 1, 2], cost: 180.0 }));

        let p = planner(parcels, geocoder, routing, optimizer, Arc::new(HubStatusRegistry::new()));
        let outcome = p.handle(Phase::Pickup, 1, seoul(9, 0)).await.unwrap();

        match outcome {
            PlannerOutcome::Next { destination, .. } => {
                // first non-zero entry is matrix node 1, the first stop
                assert_eq!(destination.parcel_id, 11);
            }
            other => panic!("expected Next, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_optimizer_failure_degrades_to_nearest() {
        let mut parcels = MockParcelRepository::new();
        parcels.expect_pending_pickups().returning(|_, _| Ok(three_pending()));
        parcels.expect_last_completed_pickup_addr().returning(|_, _| Ok(None));

        let mut geocoder = MockGeocoder::new();
        geocoder.expect_geocode().returning(|_| geocoded(37.55, 126.95));

        let mut routing = MockRoutingEngine::new();
        routing
            .expect_time_matrix()
            .returning(|points| Ok(TimeMatrix { seconds: vec![vec![60.0; points.len()]; points.len()] }));
        routing.expect_turn_by_turn().returning(|_, _| Ok(trip_payload()));

        let mut optimizer = MockTourOptimizer::new();
        optimizer
            .expect_solve()
            .returning(|_| Err(OptimizerError::Unavailable("HTTP 500".to_string())));

        let p = planner(parcels, geocoder, routing, optimizer, Arc::new(HubStatusRegistry::new()));
        let outcome = p.handle(Phase::Pickup, 1, seoul(9, 0)).await.unwrap();

        match outcome {
            PlannerOutcome::Next { destination, algorithm, .. } => {
                assert_eq!(algorithm, PlannerAlgorithm::Nearest);
                assert_eq!(destination.parcel_id, 11);
            }
            other => panic!("expected Next, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_route_failure_after_nearest_is_fallback() {
        let mut parcels = MockParcelRepository::new();
        parcels.expect_pending_pickups().returning(|_, _| Ok(three_pending()));
        parcels.expect_last_completed_pickup_addr().returning(|_, _| Ok(None));

        let mut geocoder = MockGeocoder::new();
        geocoder.expect_geocode().returning(|_| geocoded(37.55, 126.95));

        let mut routing = MockRoutingEngine::new();
        routing
            .expect_time_matrix()
            .returning(|_| Err(RoutingError::Transport("timeout".to_string())));
        routing
            .expect_turn_by_turn()
            .returning(|_, _| Err(RoutingError::Transport("timeout".to_string())));

        let p = planner(
            parcels,
            geocoder,
            routing,
            MockTourOptimizer::new(),
            Arc::new(HubStatusRegistry::new()),
        );
        let outcome = p.handle(Phase::Pickup, 1, seoul(9, 0)).await.unwrap();

        match outcome {
            PlannerOutcome::Next { destination, algorithm, route, .. } => {
                assert_eq!(algorithm, PlannerAlgorithm::Fallback);
                assert_eq!(destination.parcel_id, 11);
                assert!(route.is_none());
            }
            other => panic!("expected Next, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_pool_after_cutoff_returns_to_hub() {
        let mut parcels = MockParcelRepository::new();
        parcels.expect_pending_pickups().returning(|_, _| Ok(vec![]));
        parcels.expect_last_completed_pickup_addr().returning(|_, _| Ok(None));

        let mut routing = MockRoutingEngine::new();
        routing.expect_turn_by_turn().returning(|_, _| Ok(trip_payload()));

        let p = planner(
            parcels,
            MockGeocoder::new(),
            routing,
            MockTourOptimizer::new(),
            Arc::new(HubStatusRegistry::new()),
        );
        let outcome = p.handle(Phase::Pickup, 2, seoul(14, 0)).await.unwrap();

        match outcome {
            PlannerOutcome::ReturnToHub { route, current_location, distance_to_hub } => {
                assert_eq!(current_location, HUB_POINT);
                assert_eq!(distance_to_hub, 4.2);
                let route = route.unwrap();
                assert!(!route.waypoints.unwrap().is_empty());
            }
            other => panic!("expected ReturnToHub, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_pool_before_cutoff_waits_for_orders() {
        let mut parcels = MockParcelRepository::new();
        parcels.expect_pending_pickups().returning(|_, _| Ok(vec![]));
        parcels.expect_last_completed_pickup_addr().returning(|_, _| Ok(None));

        let p = planner(
            parcels,
            MockGeocoder::new(),
            MockRoutingEngine::new(),
            MockTourOptimizer::new(),
            Arc::new(HubStatusRegistry::new()),
        );
        let outcome = p.handle(Phase::Pickup, 2, seoul(10, 30)).await.unwrap();
        assert!(matches!(outcome, PlannerOutcome::WaitingForOrders { .. }));
    }

    #[tokio::test]
    async fn test_at_hub_short_circuit() {
        let mut parcels = MockParcelRepository::new();
        parcels.expect_pending_deliveries().returning(|_| Ok(vec![]));

        let hub = Arc::new(HubStatusRegistry::new());
        hub.mark_arrived(7);

        let p = planner(
            parcels,
            MockGeocoder::new(),
            MockRoutingEngine::new(),
            MockTourOptimizer::new(),
            hub,
        );
        let outcome = p.handle(Phase::Delivery, 7, seoul(16, 0)).await.unwrap();
        match outcome {
            PlannerOutcome::AtHub { current_location } => {
                assert_eq!(current_location, HUB_POINT);
            }
            other => panic!("expected AtHub, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_new_stops_clear_hub_flag() {
        let mut parcels = MockParcelRepository::new();
        parcels
            .expect_pending_pickups()
            .returning(|_, _| Ok(vec![pending_parcel(21, "서울 용산구 한강로 1")]));
        parcels.expect_last_completed_pickup_addr().returning(|_, _| Ok(None));

        let mut geocoder = MockGeocoder::new();
        geocoder.expect_geocode().returning(|_| geocoded(37.53, 126.98));

        let mut routing = MockRoutingEngine::new();
        routing
            .expect_time_matrix()
            .returning(|points| Ok(TimeMatrix { seconds: vec![vec![30.0; points.len()]; points.len()] }));
        routing.expect_turn_by_turn().returning(|_, _| Ok(trip_payload()));

        let mut optimizer = MockTourOptimizer::new();
        optimizer.expect_solve().returning(|_| Ok(Tour { order: vec![0, 1], cost: 30.0 }));

        let hub = Arc::new(HubStatusRegistry::new());
        hub.mark_arrived(3);

        let p = planner(parcels, geocoder, routing, optimizer, hub.clone());
        let outcome = p.handle(Phase::Pickup, 3, seoul(9, 0)).await.unwrap();

        assert!(matches!(outcome, PlannerOutcome::Next { .. }));
        assert!(!hub.is_at_hub(3));
    }
}
