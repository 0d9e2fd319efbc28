//! Dependency Injection Module
//!
//! Provides application state and dependency wiring.

use std::sync::Arc;

use sea_orm::{Database, DatabaseConnection};
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::domain::model::driver::Phase;
use crate::domain::services::district::DistrictMap;
use crate::domain::services::hub_status::HubStatusRegistry;
use crate::infrastructure::geocoding::KakaoGeocoder;
use crate::infrastructure::optimizer::LkhHttpClient;
use crate::infrastructure::repository::{DriverMysqlRepository, ParcelMysqlRepository};
use crate::infrastructure::routing::ValhallaClient;
use crate::usecases::complete::CompleteHandler;
use crate::usecases::hub_arrival::HubArrivalHandler;
use crate::usecases::ingest::IngestHandler;
use crate::usecases::next_destination::NextDestinationPlanner;
use crate::usecases::phase_transition::PhaseTransitionHandler;

/// DI initialization errors
#[derive(Debug, Error)]
pub enum DiError {
    #[error("Database connection failed: {0}")]
    DatabaseError(String),
}

/// Planner wired to the concrete adapters.
pub type Planner =
    NextDestinationPlanner<ParcelMysqlRepository, KakaoGeocoder, ValhallaClient, LkhHttpClient>;

/// Application state containing all dependencies
pub struct AppState {
    /// HS256 secret for bearer tokens
    pub jwt_secret: String,

    /// Whether a Kakao API key was configured
    pub kakao_configured: bool,

    /// MySQL parcel repository
    pub parcel_repo: Arc<ParcelMysqlRepository>,

    /// MySQL driver repository
    pub driver_repo: Arc<DriverMysqlRepository>,

    /// Per-driver hub-arrival registry
    pub hub_status: Arc<HubStatusRegistry>,

    /// District ownership per phase
    pub pickup_districts: DistrictMap,
    pub delivery_districts: DistrictMap,

    /// Use case handlers
    pub planner: Planner,
    pub ingest: IngestHandler<ParcelMysqlRepository, KakaoGeocoder>,
    pub complete: CompleteHandler<ParcelMysqlRepository>,
    pub hub_arrival: HubArrivalHandler<ParcelMysqlRepository>,
    pub phase_transition: PhaseTransitionHandler<ParcelMysqlRepository, KakaoGeocoder>,

    /// Database connection
    pub db: DatabaseConnection,
}

impl AppState {
    /// Create a new AppState with all dependencies initialized
    pub async fn new(config: &Config) -> Result<Self, DiError> {
        info!("Initializing application state...");

        info!("Connecting to MySQL...");
        let db = Database::connect(config.database_url())
            .await
            .map_err(|e| DiError::DatabaseError(e.to_string()))?;
        info!("MySQL connected");

        let parcel_repo = Arc::new(ParcelMysqlRepository::new(db.clone()));
        let driver_repo = Arc::new(DriverMysqlRepository::new(db.clone()));
        let geocoder = Arc::new(KakaoGeocoder::new(config.kakao_api_key.clone()));
        let routing = Arc::new(ValhallaClient::new(config.routing_base_url()));
        let optimizer = Arc::new(LkhHttpClient::new(config.lkh_service_url.clone()));
        let hub_status = Arc::new(HubStatusRegistry::new());

        let pickup_districts = DistrictMap::with_defaults(Phase::Pickup);
        let delivery_districts = DistrictMap::with_defaults(Phase::Delivery);

        let planner = NextDestinationPlanner::new(
            parcel_repo.clone(),
            geocoder.clone(),
            routing.clone(),
            optimizer.clone(),
            hub_status.clone(),
        );
        let ingest =
            IngestHandler::new(parcel_repo.clone(), geocoder.clone(), pickup_districts.clone());
        let complete = CompleteHandler::new(parcel_repo.clone());
        let hub_arrival = HubArrivalHandler::new(parcel_repo.clone(), hub_status.clone());
        let phase_transition = PhaseTransitionHandler::new(
            parcel_repo.clone(),
            geocoder.clone(),
            delivery_districts.clone(),
        );

        info!("Application state initialized");

        Ok(Self {
            jwt_secret: config.jwt_secret.clone(),
            kakao_configured: !config.kakao_api_key.is_empty(),
            parcel_repo,
            driver_repo,
            hub_status,
            pickup_districts,
            delivery_districts,
            planner,
            ingest,
            complete,
            hub_arrival,
            phase_transition,
            db,
        })
    }
}
