//! Boundary Layer
//!
//! Contains port interfaces (traits) that define the contracts between
//! the application layer and infrastructure adapters.

pub mod ports;
