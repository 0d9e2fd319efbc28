//! Driver profile and the phase split of the working day.

use chrono::NaiveTime;

/// The half of the day a driver works in.
///
/// Pickup drivers collect parcels from senders in the morning; delivery
/// drivers distribute the converted parcels in the afternoon. Drivers are
/// single-phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Pickup,
    Delivery,
}

impl Phase {
    /// Local time at which this phase's window opens.
    pub fn window_open(&self) -> NaiveTime {
        match self {
            Phase::Pickup => NaiveTime::from_hms_opt(7, 0, 0).expect("valid time"),
            Phase::Delivery => NaiveTime::from_hms_opt(15, 0, 0).expect("valid time"),
        }
    }

    /// "HH:MM" form of the window-open time, for human-facing payloads.
    pub fn window_open_label(&self) -> &'static str {
        match self {
            Phase::Pickup => "07:00",
            Phase::Delivery => "15:00",
        }
    }
}

/// Daily cut-off for same-day pickup announcements. Anything ingested at or
/// after this local time is scheduled for tomorrow.
pub fn pickup_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).expect("valid time")
}

/// "HH:MM" form of the cut-off, for human-facing payloads.
pub const PICKUP_CUTOFF_LABEL: &str = "12:00";

/// A driver as looked up from the user store. Drivers are never created or
/// mutated by this service.
#[derive(Debug, Clone)]
pub struct DriverProfile {
    pub user_id: i64,
    pub name: String,
    pub district: String,
    pub zone: String,
    pub phone_number: Option<String>,
    pub vehicle_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_open_times() {
        assert_eq!(Phase::Pickup.window_open(), NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        assert_eq!(Phase::Delivery.window_open(), NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        assert_eq!(Phase::Pickup.window_open_label(), "07:00");
        assert_eq!(Phase::Delivery.window_open_label(), "15:00");
    }

    #[test]
    fn test_cutoff_is_noon() {
        assert_eq!(pickup_cutoff(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }
}
