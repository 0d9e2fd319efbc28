//! Per-driver hub-arrival state for the current session.
//!
//! Set when a driver with no outstanding stops reports hub arrival; cleared
//! the moment the planner hands that driver a new stop. The map is shared
//! across request handlers; the lock is held only for the map operation
//! itself, never across an await point.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Process-wide hub-arrival registry.
#[derive(Debug, Default)]
pub struct HubStatusRegistry {
    inner: Mutex<HashMap<i64, bool>>,
}

impl HubStatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the driver has reported hub arrival in the current session.
    pub fn is_at_hub(&self, driver_id: i64) -> bool {
        self.inner.lock().get(&driver_id).copied().unwrap_or(false)
    }

    /// Record hub arrival for the driver.
    pub fn mark_arrived(&self, driver_id: i64) {
        self.inner.lock().insert(driver_id, true);
    }

    /// Clear the hub flag; returns whether it was set.
    pub fn clear(&self, driver_id: i64) -> bool {
        self.inner.lock().insert(driver_id, false).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_not_at_hub() {
        let registry = HubStatusRegistry::new();
        assert!(!registry.is_at_hub(1));
    }

    #[test]
    fn test_mark_and_clear() {
        let registry = HubStatusRegistry::new();
        registry.mark_arrived(3);
        assert!(registry.is_at_hub(3));
        assert!(!registry.is_at_hub(4));

        assert!(registry.clear(3));
        assert!(!registry.is_at_hub(3));
        // clearing an unset driver reports false
        assert!(!registry.clear(4));
    }
}
