//! Kakao geocoder adapter.
//!
//! Strategy ladder: structured address search, keyword search, the offline
//! district table, and finally the city-hall coordinate. Provider failures
//! are logged and downgrade to the next rung; callers always get an answer.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::boundary::ports::{Geocoded, Geocoder};
use crate::domain::model::location::GeoPoint;
use crate::domain::services::district::{
    extract_district, offline_lookup, CITY_HALL, CITY_HALL_NAME, DISTRICT_SUFFIX,
};

const ADDRESS_API: &str = "https://dapi.kakao.com/v2/local/search/address.json";
const KEYWORD_API: &str = "https://dapi.kakao.com/v2/local/search/keyword.json";

const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);

/// Confidence assigned per strategy rung.
const CONFIDENCE_ADDRESS: f64 = 0.95;
const CONFIDENCE_KEYWORD: f64 = 0.85;
const CONFIDENCE_OFFLINE: f64 = 0.5;
const CONFIDENCE_FALLBACK: f64 = 0.1;

#[derive(Debug, Deserialize)]
struct AddressSearchResponse {
    #[serde(default)]
    documents: Vec<AddressDocument>,
}

#[derive(Debug, Deserialize)]
struct AddressDocument {
    y: String,
    x: String,
    address_name: Option<String>,
    address: Option<RegionInfo>,
    road_address: Option<RegionInfo>,
}

#[derive(Debug, Deserialize)]
struct RegionInfo {
    region_2depth_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeywordSearchResponse {
    #[serde(default)]
    documents: Vec<KeywordDocument>,
}

#[derive(Debug, Deserialize)]
struct KeywordDocument {
    y: String,
    x: String,
    place_name: Option<String>,
}

/// Kakao-backed geocoder with the built-in offline ladder.
pub struct KakaoGeocoder {
    client: Client,
    api_key: String,
    address_url: String,
    keyword_url: String,
}

impl KakaoGeocoder {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(GEOCODE_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key,
            address_url: ADDRESS_API.to_string(),
            keyword_url: KEYWORD_API.to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("KakaoAK {}", self.api_key)
    }

    async fn address_search(&self, query: &str) -> Option<AddressSearchResponse> {
        let response = self
            .client
            .get(&self.address_url)
            .header("Authorization", self.auth_header())
            .query(&[("query", query)])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json().await.ok()
    }

    async fn keyword_search(&self, query: &str) -> Option<KeywordSearchResponse> {
        let response = self
            .client
            .get(&self.keyword_url)
            .header("Authorization", self.auth_header())
            .query(&[("query", query)])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json().await.ok()
    }
}

/// Offline rungs of the ladder: district table, then city hall.
pub fn offline_geocode(address: &str) -> Geocoded {
    if let Some(info) = offline_lookup(address) {
        info!(%address, district = info.name, "offline district coordinates used");
        return Geocoded {
            point: info.point(),
            label: info.label.to_string(),
            confidence: CONFIDENCE_OFFLINE,
        };
    }

    warn!(%address, "no district in address, using city-hall coordinates");
    Geocoded {
        point: CITY_HALL,
        label: CITY_HALL_NAME.to_string(),
        confidence: CONFIDENCE_FALLBACK,
    }
}

fn parse_point(y: &str, x: &str) -> Option<GeoPoint> {
    let lat = y.parse::<f64>().ok()?;
    let lon = x.parse::<f64>().ok()?;
    Some(GeoPoint::new(lat, lon))
}

#[async_trait]
impl Geocoder for KakaoGeocoder {
    async fn geocode(&self, address: &str) -> Geocoded {
        if let Some(response) = self.address_search(address).await {
            if let Some(doc) = response.documents.first() {
                if let Some(point) = parse_point(&doc.y, &doc.x) {
                    let label = doc.address_name.clone().unwrap_or_else(|| address.to_string());
                    info!(%address, lat = point.lat, lon = point.lon, %label,
                          "address search matched");
                    return Geocoded { point, label, confidence: CONFIDENCE_ADDRESS };
                }
            }
        }

        if let Some(response) = self.keyword_search(address).await {
            if let Some(doc) = response.documents.first() {
                if let Some(point) = parse_point(&doc.y, &doc.x) {
                    let label = doc.place_name.clone().unwrap_or_else(|| address.to_string());
                    info!(%address, lat = point.lat, lon = point.lon, %label,
                          "keyword search matched");
                    return Geocoded { point, label, confidence: CONFIDENCE_KEYWORD };
                }
            }
        }

        warn!(%address, "provider geocoding failed, falling back to offline table");
        offline_geocode(address)
    }

    async fn resolve_district(&self, address: &str) -> Option<String> {
        if let Some(response) = self.address_search(address).await {
            if let Some(doc) = response.documents.first() {
                for region in [doc.address.as_ref(), doc.road_address.as_ref()].into_iter().flatten()
                {
                    if let Some(district) = region.region_2depth_name.as_deref() {
                        if district.ends_with(DISTRICT_SUFFIX) {
                            info!(%address, %district, "district resolved from provider");
                            return Some(district.to_string());
                        }
                    }
                }
            }
        }

        extract_district(address).map(|d| d.to_string())
    }
}
