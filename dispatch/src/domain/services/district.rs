//! District handling: free-text extraction, the district → driver ownership
//! maps, the coarser zone grouping, and the offline coordinate table used
//! when geocoding is unavailable.

use std::collections::HashMap;

use crate::domain::model::driver::Phase;
use crate::domain::model::location::GeoPoint;

/// Suffix that marks an administrative district token ("구").
pub const DISTRICT_SUFFIX: char = '구';

/// Representative point and label for one district.
#[derive(Debug, Clone, Copy)]
pub struct DistrictInfo {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub label: &'static str,
}

/// The 25 districts with their representative coordinates.
pub const DISTRICTS: [DistrictInfo; 25] = [
    DistrictInfo { name: "강남구", lat: 37.5172, lon: 127.0473, label: "강남구 역삼동" },
    DistrictInfo { name: "서초구", lat: 37.4837, lon: 127.0324, label: "서초구 서초동" },
    DistrictInfo { name: "송파구", lat: 37.5145, lon: 127.1059, label: "송파구 잠실동" },
    DistrictInfo { name: "강동구", lat: 37.5301, lon: 127.1238, label: "강동구 천호동" },
    DistrictInfo { name: "성동구", lat: 37.5634, lon: 127.0369, label: "성동구 성수동" },
    DistrictInfo { name: "광진구", lat: 37.5384, lon: 127.0822, label: "광진구 광장동" },
    DistrictInfo { name: "동대문구", lat: 37.5744, lon: 127.0396, label: "동대문구 전농동" },
    DistrictInfo { name: "중랑구", lat: 37.6063, lon: 127.0927, label: "중랑구 면목동" },
    DistrictInfo { name: "종로구", lat: 37.5735, lon: 126.9790, label: "종로구 종로" },
    DistrictInfo { name: "중구", lat: 37.5641, lon: 126.9979, label: "중구 명동" },
    DistrictInfo { name: "용산구", lat: 37.5311, lon: 126.9810, label: "용산구 한강로" },
    DistrictInfo { name: "성북구", lat: 37.5894, lon: 127.0167, label: "성북구 성북동" },
    DistrictInfo { name: "강북구", lat: 37.6396, lon: 127.0253, label: "강북구 번동" },
    DistrictInfo { name: "도봉구", lat: 37.6687, lon: 127.0472, label: "도봉구 방학동" },
    DistrictInfo { name: "노원구", lat: 37.6543, lon: 127.0568, label: "노원구 상계동" },
    DistrictInfo { name: "은평구", lat: 37.6176, lon: 126.9269, label: "은평구 불광동" },
    DistrictInfo { name: "서대문구", lat: 37.5791, lon: 126.9368, label: "서대문구 신촌동" },
    DistrictInfo { name: "마포구", lat: 37.5638, lon: 126.9084, label: "마포구 공덕동" },
    DistrictInfo { name: "양천구", lat: 37.5170, lon: 126.8667, label: "양천구 목동" },
    DistrictInfo { name: "강서구", lat: 37.5509, lon: 126.8496, label: "강서구 화곡동" },
    DistrictInfo { name: "구로구", lat: 37.4954, lon: 126.8877, label: "구로구 구로동" },
    DistrictInfo { name: "금천구", lat: 37.4564, lon: 126.8955, label: "금천구 가산동" },
    DistrictInfo { name: "영등포구", lat: 37.5263, lon: 126.8966, label: "영등포구 영등포동" },
    DistrictInfo { name: "동작구", lat: 37.5124, lon: 126.9393, label: "동작구 상도동" },
    DistrictInfo { name: "관악구", lat: 37.4784, lon: 126.9516, label: "관악구 봉천동" },
];

/// Ultimate geocoding fallback: Seoul city hall.
pub const CITY_HALL: GeoPoint = GeoPoint { lat: 37.5665, lon: 126.9780 };

/// Display name of the city-hall fallback.
pub const CITY_HALL_NAME: &str = "서울시청";

impl DistrictInfo {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// First whitespace-delimited token of `address` ending in the district
/// suffix, if any.
pub fn extract_district(address: &str) -> Option<&str> {
    address
        .split_whitespace()
        .find(|part| part.ends_with(DISTRICT_SUFFIX))
}

/// Offline lookup: the first district whose name appears anywhere in the
/// address, in table order.
pub fn offline_lookup(address: &str) -> Option<&'static DistrictInfo> {
    DISTRICTS.iter().find(|d| address.contains(d.name))
}

/// Coarse zone grouping used for driver profiles and analytics.
pub fn zone_for_district(district: &str) -> &'static str {
    match district {
        "은평구" | "서대문구" | "마포구" => "강북서부",
        "도봉구" | "노원구" | "강북구" | "성북구" => "강북동부",
        "종로구" | "중구" | "용산구" => "강북중부",
        "강서구" | "양천구" | "구로구" | "영등포구" | "동작구" | "관악구" | "금천구" => "강남서부",
        "성동구" | "광진구" | "동대문구" | "중랑구" | "강동구" | "송파구" | "강남구" | "서초구" => "강남동부",
        _ => "Unknown",
    }
}

/// Immutable district → owning-driver map for one phase, built at startup.
#[derive(Debug, Clone)]
pub struct DistrictMap {
    phase: Phase,
    owners: HashMap<&'static str, i64>,
}

/// District groups that share a driver, in the order of the phase driver
/// numbering.
const OWNERSHIP_GROUPS: [&[&str]; 5] = [
    &["은평구", "서대문구", "마포구"],
    &["도봉구", "노원구", "강북구", "성북구"],
    &["종로구", "중구", "용산구"],
    &["강서구", "양천구", "구로구", "영등포구", "동작구", "관악구", "금천구"],
    &["성동구", "광진구", "동대문구", "중랑구", "강동구", "송파구", "강남구", "서초구"],
];

impl DistrictMap {
    /// Build the map for a phase. Pickup districts are owned by drivers
    /// 1..=5, delivery districts by drivers 6..=10, one group each.
    pub fn with_defaults(phase: Phase) -> Self {
        let base = match phase {
            Phase::Pickup => 1,
            Phase::Delivery => 6,
        };
        let mut owners = HashMap::new();
        for (offset, group) in OWNERSHIP_GROUPS.iter().enumerate() {
            for district in group.iter() {
                owners.insert(*district, base + offset as i64);
            }
        }
        Self { phase, owners }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Driver that owns the given district, if mapped.
    pub fn driver_for(&self, district: &str) -> Option<i64> {
        self.owners.get(district).copied()
    }

    /// Whether the given driver works this phase.
    pub fn contains_driver(&self, driver_id: i64) -> bool {
        self.owners.values().any(|&id| id == driver_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_district() {
        assert_eq!(extract_district("서울 강남구 테헤란로 123"), Some("강남구"));
        assert_eq!(extract_district("서울 마포대로 12"), None);
        // first matching token wins
        assert_eq!(extract_district("중구 을지로 관악구"), Some("중구"));
    }

    #[test]
    fn test_offline_lookup() {
        let info = offline_lookup("서울특별시 송파구 잠실로 1").unwrap();
        assert_eq!(info.name, "송파구");
        assert_eq!(info.point(), GeoPoint::new(37.5145, 127.1059));
        assert!(offline_lookup("제주도 서귀포시").is_none());
    }

    #[test]
    fn test_zone_for_district() {
        assert_eq!(zone_for_district("마포구"), "강북서부");
        assert_eq!(zone_for_district("강남구"), "강남동부");
        assert_eq!(zone_for_district("세종시"), "Unknown");
    }

    #[test]
    fn test_pickup_map_defaults() {
        let map = DistrictMap::with_defaults(Phase::Pickup);
        assert_eq!(map.driver_for("은평구"), Some(1));
        assert_eq!(map.driver_for("성북구"), Some(2));
        assert_eq!(map.driver_for("용산구"), Some(3));
        assert_eq!(map.driver_for("금천구"), Some(4));
        assert_eq!(map.driver_for("강남구"), Some(5));
        assert_eq!(map.driver_for("세종시"), None);
        assert!(map.contains_driver(3));
        assert!(!map.contains_driver(8));
    }

    #[test]
    fn test_delivery_map_defaults() {
        let map = DistrictMap::with_defaults(Phase::Delivery);
        assert_eq!(map.driver_for("마포구"), Some(6));
        assert_eq!(map.driver_for("서초구"), Some(10));
        assert!(map.contains_driver(10));
        assert!(!map.contains_driver(5));
    }

    #[test]
    fn test_every_district_is_owned() {
        let map = DistrictMap::with_defaults(Phase::Pickup);
        for info in DISTRICTS.iter() {
            assert!(map.driver_for(info.name).is_some(), "unowned: {}", info.name);
        }
    }
}
