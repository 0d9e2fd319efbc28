//! The live speed table and its lock-free snapshot handle.
//!
//! The harvester builds a complete fresh table per sweep and publishes it in
//! one atomic swap; request handlers grab the current snapshot and never see
//! a partially-updated table.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

/// Speeds considered plausible for congestion classification, km/h.
const VALID_SPEED_MIN: f64 = 10.0;
const VALID_SPEED_MAX: f64 = 80.0;

/// Below this a road counts as congested.
const SLOW_SPEED: f64 = 25.0;

/// Immutable snapshot: way-id → observed speed in km/h.
#[derive(Debug, Default)]
pub struct SpeedTable {
    speeds: HashMap<String, f64>,
}

/// Network-wide congestion classification derived from one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Congestion {
    pub slow_ratio: f64,
    pub label: &'static str,
}

impl Congestion {
    /// Multiplier applied to per-maneuver route speeds.
    pub fn route_factor(&self) -> f64 {
        if self.slow_ratio > 0.5 {
            0.7
        } else if self.slow_ratio > 0.3 {
            0.85
        } else {
            1.1
        }
    }

    /// Multiplier applied to matrix cell speeds. Free flow is neutral here;
    /// the matrix already reflects typical speeds.
    pub fn matrix_factor(&self) -> f64 {
        if self.slow_ratio > 0.5 {
            0.7
        } else if self.slow_ratio > 0.3 {
            0.85
        } else {
            1.0
        }
    }
}

/// Aggregate numbers for the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedStats {
    pub avg_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub slow_roads: usize,
    pub fast_roads: usize,
}

impl SpeedTable {
    pub fn new(speeds: HashMap<String, f64>) -> Self {
        Self { speeds }
    }

    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }

    /// Classify overall congestion from the plausible-speed subset. `None`
    /// when no plausible observation exists.
    pub fn congestion(&self) -> Option<Congestion> {
        let valid: Vec<f64> = self
            .speeds
            .values()
            .copied()
            .filter(|s| (VALID_SPEED_MIN..=VALID_SPEED_MAX).contains(s))
            .collect();
        if valid.is_empty() {
            return None;
        }

        let slow = valid.iter().filter(|&&s| s < SLOW_SPEED).count();
        let slow_ratio = slow as f64 / valid.len() as f64;
        let label = if slow_ratio > 0.5 {
            "혼잡"
        } else if slow_ratio > 0.3 {
            "보통"
        } else {
            "원활"
        };
        Some(Congestion { slow_ratio, label })
    }

    pub fn stats(&self) -> Option<SpeedStats> {
        if self.speeds.is_empty() {
            return None;
        }
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        let mut sum = 0.0;
        for &s in self.speeds.values() {
            min = min.min(s);
            max = max.max(s);
            sum += s;
        }
        Some(SpeedStats {
            avg_speed: sum / self.speeds.len() as f64,
            min_speed: min,
            max_speed: max,
            slow_roads: self.speeds.values().filter(|&&s| s < 20.0).count(),
            fast_roads: self.speeds.values().filter(|&&s| s > 50.0).count(),
        })
    }
}

/// Shared handle: readers load, the harvester publishes.
#[derive(Debug, Default)]
pub struct SpeedTableHandle {
    inner: ArcSwap<SpeedTable>,
}

impl SpeedTableHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> Arc<SpeedTable> {
        self.inner.load_full()
    }

    pub fn publish(&self, table: SpeedTable) {
        self.inner.store(Arc::new(table));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_of(speeds: &[f64]) -> SpeedTable {
        SpeedTable::new(
            speeds
                .iter()
                .enumerate()
                .map(|(i, &s)| (format!("way{}", i), s))
                .collect(),
        )
    }

    #[test]
    fn test_congestion_ignores_out_of_band_speeds() {
        // 5 and 120 fall outside the plausible band
        let table = table_of(&[5.0, 120.0, 40.0, 45.0]);
        let congestion = table.congestion().unwrap();
        assert_eq!(congestion.slow_ratio, 0.0);
        assert_eq!(congestion.label, "원활");
        assert_eq!(congestion.route_factor(), 1.1);
        assert_eq!(congestion.matrix_factor(), 1.0);
    }

    #[test]
    fn test_congested_network() {
        let table = table_of(&[12.0, 15.0, 18.0, 60.0]);
        let congestion = table.congestion().unwrap();
        assert!(congestion.slow_ratio > 0.5);
        assert_eq!(congestion.label, "혼잡");
        assert_eq!(congestion.route_factor(), 0.7);
        assert_eq!(congestion.matrix_factor(), 0.7);
    }

    #[test]
    fn test_moderate_network() {
        let table = table_of(&[20.0, 20.0, 40.0, 50.0, 55.0]);
        let congestion = table.congestion().unwrap();
        assert_eq!(congestion.label, "보통");
        assert_eq!(congestion.route_factor(), 0.85);
        assert_eq!(congestion.matrix_factor(), 0.85);
    }

    #[test]
    fn test_empty_table_has_no_congestion() {
        assert!(SpeedTable::default().congestion().is_none());
        assert!(SpeedTable::default().stats().is_none());
    }

    #[test]
    fn test_publish_swaps_snapshot() {
        let handle = SpeedTableHandle::new();
        assert!(handle.load().is_empty());

        handle.publish(table_of(&[30.0, 40.0]));
        let snapshot = handle.load();
        assert_eq!(snapshot.len(), 2);

        let stats = snapshot.stats().unwrap();
        assert_eq!(stats.avg_speed, 35.0);
        assert_eq!(stats.min_speed, 30.0);
        assert_eq!(stats.max_speed, 40.0);
    }
}
