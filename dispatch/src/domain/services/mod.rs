pub mod district;
pub mod hub_status;
pub mod waypoints;
