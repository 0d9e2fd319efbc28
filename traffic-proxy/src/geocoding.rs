//! Geocoding facade for the `/search` endpoint.
//!
//! Same ladder the dispatch side uses: Kakao address search, keyword
//! search, the district table, city hall. The proxy serves the result in a
//! `features` shape so callers of the old search API keep working.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

const ADDRESS_API: &str = "https://dapi.kakao.com/v2/local/search/address.json";
const KEYWORD_API: &str = "https://dapi.kakao.com/v2/local/search/keyword.json";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Representative coordinates per district, used when the provider fails.
const DISTRICT_COORDS: [(&str, f64, f64, &str); 25] = [
    ("강남구", 37.5172, 127.0473, "강남구 역삼동"),
    ("서초구", 37.4837, 127.0324, "서초구 서초동"),
    ("송파구", 37.5145, 127.1059, "송파구 잠실동"),
    ("강동구", 37.5301, 127.1238, "강동구 천호동"),
    ("성동구", 37.5634, 127.0369, "성동구 성수동"),
    ("광진구", 37.5384, 127.0822, "광진구 광장동"),
    ("동대문구", 37.5744, 127.0396, "동대문구 전농동"),
    ("중랑구", 37.6063, 127.0927, "중랑구 면목동"),
    ("종로구", 37.5735, 126.9790, "종로구 종로"),
    ("중구", 37.5641, 126.9979, "중구 명동"),
    ("용산구", 37.5311, 126.9810, "용산구 한강로"),
    ("성북구", 37.5894, 127.0167, "성북구 성북동"),
    ("강북구", 37.6396, 127.0253, "강북구 번동"),
    ("도봉구", 37.6687, 127.0472, "도봉구 방학동"),
    ("노원구", 37.6543, 127.0568, "노원구 상계동"),
    ("은평구", 37.6176, 126.9269, "은평구 불광동"),
    ("서대문구", 37.5791, 126.9368, "서대문구 신촌동"),
    ("마포구", 37.5638, 126.9084, "마포구 공덕동"),
    ("양천구", 37.5170, 126.8667, "양천구 목동"),
    ("강서구", 37.5509, 126.8496, "강서구 화곡동"),
    ("구로구", 37.4954, 126.8877, "구로구 구로동"),
    ("금천구", 37.4564, 126.8955, "금천구 가산동"),
    ("영등포구", 37.5263, 126.8966, "영등포구 영등포동"),
    ("동작구", 37.5124, 126.9393, "동작구 상도동"),
    ("관악구", 37.4784, 126.9516, "관악구 봉천동"),
];

const CITY_HALL: (f64, f64, &str) = (37.5665, 126.9780, "서울시청");

/// A search hit with its confidence tier.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    documents: Vec<SearchDocument>,
}

#[derive(Debug, Deserialize)]
struct SearchDocument {
    y: String,
    x: String,
    address_name: Option<String>,
    place_name: Option<String>,
}

/// Offline rungs of the ladder.
pub fn offline_hit(text: &str) -> SearchHit {
    for (district, lat, lon, label) in DISTRICT_COORDS.iter() {
        if text.contains(district) {
            info!(%text, district, "district table coordinates used");
            return SearchHit { lat: *lat, lon: *lon, label: label.to_string(), confidence: 0.5 };
        }
    }
    warn!(%text, "no district in query, using city-hall coordinates");
    SearchHit {
        lat: CITY_HALL.0,
        lon: CITY_HALL.1,
        label: CITY_HALL.2.to_string(),
        confidence: 0.1,
    }
}

/// Kakao-backed search client.
pub struct KakaoSearch {
    client: Client,
    api_key: String,
}

impl KakaoSearch {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder().timeout(SEARCH_TIMEOUT).build().unwrap_or_default();
        Self { client, api_key }
    }

    pub fn configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn query(&self, url: &str, text: &str) -> Option<SearchDocument> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("KakaoAK {}", self.api_key))
            .query(&[("query", text)])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let parsed: SearchResponse = response.json().await.ok()?;
        parsed.documents.into_iter().next()
    }

    /// Run the full ladder for a free-text query.
    pub async fn search(&self, text: &str) -> SearchHit {
        if let Some(doc) = self.query(ADDRESS_API, text).await {
            if let (Ok(lat), Ok(lon)) = (doc.y.parse(), doc.x.parse()) {
                let label = doc.address_name.unwrap_or_else(|| text.to_string());
                return SearchHit { lat, lon, label, confidence: 0.95 };
            }
        }

        if let Some(doc) = self.query(KEYWORD_API, text).await {
            if let (Ok(lat), Ok(lon)) = (doc.y.parse(), doc.x.parse()) {
                let label = doc.place_name.unwrap_or_else(|| text.to_string());
                return SearchHit { lat, lon, label, confidence: 0.85 };
            }
        }

        offline_hit(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_hit_finds_district() {
        let hit = offline_hit("서울 관악구 봉천로 1");
        assert_eq!(hit.lat, 37.4784);
        assert_eq!(hit.confidence, 0.5);
    }

    #[test]
    fn test_offline_hit_city_hall_fallback() {
        let hit = offline_hit("인천 어딘가");
        assert_eq!(hit.label, "서울시청");
        assert_eq!(hit.confidence, 0.1);
    }
}
