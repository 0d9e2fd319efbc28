//! Parcel entity and its lifecycle state machine.
//!
//! A parcel moves strictly forward through pickup and delivery; soft
//! deletion is a terminal sideline handled at the query layer.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// Parcel status over the full dispatch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParcelStatus {
    /// Announced and waiting for a pickup driver to collect it
    PickupPending,
    /// Collected by the pickup driver
    PickupCompleted,
    /// Converted for delivery, waiting for the delivery driver
    DeliveryPending,
    /// Handed to the recipient
    DeliveryCompleted,
}

impl fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ParcelStatus {
    /// Canonical wire string, as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelStatus::PickupPending => "PICKUP_PENDING",
            ParcelStatus::PickupCompleted => "PICKUP_COMPLETED",
            ParcelStatus::DeliveryPending => "DELIVERY_PENDING",
            ParcelStatus::DeliveryCompleted => "DELIVERY_COMPLETED",
        }
    }

    /// Parse the canonical string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PICKUP_PENDING" => Some(ParcelStatus::PickupPending),
            "PICKUP_COMPLETED" => Some(ParcelStatus::PickupCompleted),
            "DELIVERY_PENDING" => Some(ParcelStatus::DeliveryPending),
            "DELIVERY_COMPLETED" => Some(ParcelStatus::DeliveryCompleted),
            _ => None,
        }
    }

    /// Check if a transition to another status is valid.
    ///
    /// Valid transitions:
    /// ```text
    /// PickupPending -> PickupCompleted
    /// PickupCompleted -> DeliveryPending
    /// DeliveryPending -> DeliveryCompleted
    /// ```
    pub fn can_transition_to(&self, target: ParcelStatus) -> bool {
        matches!(
            (self, target),
            (ParcelStatus::PickupPending, ParcelStatus::PickupCompleted)
                | (ParcelStatus::PickupCompleted, ParcelStatus::DeliveryPending)
                | (ParcelStatus::DeliveryPending, ParcelStatus::DeliveryCompleted)
        )
    }

    /// Transition to a new status, returning an error if invalid.
    pub fn transition_to(self, target: ParcelStatus) -> Result<ParcelStatus, InvalidTransitionError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(InvalidTransitionError { from: self, to: target })
        }
    }

    /// Whether pickup has been completed at this point of the lifecycle.
    pub fn pickup_done(&self) -> bool {
        !matches!(self, ParcelStatus::PickupPending)
    }
}

/// Error for invalid state transitions
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidTransitionError {
    pub from: ParcelStatus,
    pub to: ParcelStatus,
}

impl fmt::Display for InvalidTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid state transition from {} to {}", self.from, self.to)
    }
}

impl std::error::Error for InvalidTransitionError {}

/// A parcel row as read through the repository, with owner and driver
/// names joined in.
///
/// Mutation happens through guarded repository updates rather than on this
/// struct; the status machine above is the single source of legality.
#[derive(Debug, Clone)]
pub struct Parcel {
    pub id: i64,
    pub owner_id: i64,
    pub owner_name: Option<String>,
    pub size: String,
    pub recipient_addr: String,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub product_name: String,
    pub status: ParcelStatus,
    pub pickup_driver_id: Option<i64>,
    pub pickup_driver_name: Option<String>,
    pub delivery_driver_id: Option<i64>,
    pub delivery_driver_name: Option<String>,
    pub pickup_scheduled_date: Option<NaiveDate>,
    pub pickup_completed_at: Option<NaiveDateTime>,
    pub delivery_completed_at: Option<NaiveDateTime>,
    pub is_next_pickup_target: bool,
    pub is_next_delivery_target: bool,
    pub created_at: NaiveDateTime,
}

impl Parcel {
    /// Whether the given driver owns this parcel for its pickup leg.
    pub fn is_pickup_owner(&self, driver_id: i64) -> bool {
        self.pickup_driver_id == Some(driver_id)
    }

    /// Whether the given driver owns this parcel for its delivery leg.
    pub fn is_delivery_owner(&self, driver_id: i64) -> bool {
        self.delivery_driver_id == Some(driver_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(ParcelStatus::PickupPending.can_transition_to(ParcelStatus::PickupCompleted));
        assert!(ParcelStatus::PickupCompleted.can_transition_to(ParcelStatus::DeliveryPending));
        assert!(ParcelStatus::DeliveryPending.can_transition_to(ParcelStatus::DeliveryCompleted));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!ParcelStatus::PickupPending.can_transition_to(ParcelStatus::DeliveryPending));
        assert!(!ParcelStatus::PickupPending.can_transition_to(ParcelStatus::DeliveryCompleted));
        assert!(!ParcelStatus::DeliveryCompleted.can_transition_to(ParcelStatus::PickupPending));
        assert!(!ParcelStatus::DeliveryPending.can_transition_to(ParcelStatus::PickupCompleted));
        // no self-loops
        assert!(!ParcelStatus::PickupPending.can_transition_to(ParcelStatus::PickupPending));
    }

    #[test]
    fn test_transition_to_success() {
        let next = ParcelStatus::PickupPending.transition_to(ParcelStatus::PickupCompleted);
        assert_eq!(next, Ok(ParcelStatus::PickupCompleted));
    }

    #[test]
    fn test_transition_to_error() {
        let result = ParcelStatus::DeliveryCompleted.transition_to(ParcelStatus::PickupPending);
        assert!(result.is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ParcelStatus::PickupPending,
            ParcelStatus::PickupCompleted,
            ParcelStatus::DeliveryPending,
            ParcelStatus::DeliveryCompleted,
        ] {
            assert_eq!(ParcelStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ParcelStatus::parse("PENDING"), None);
    }
}
