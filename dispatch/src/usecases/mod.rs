//! Use Cases
//!
//! Application services over the boundary ports. The planner and the
//! completion/hub handlers are phase-parameterized; the HTTP layer picks the
//! phase per route.

pub mod complete;
pub mod hub_arrival;
pub mod ingest;
pub mod next_destination;
pub mod phase_transition;
