//! Port Interfaces
//!
//! Contracts implemented by the infrastructure adapters.

pub mod driver_repository;
pub mod geocoder;
pub mod optimizer;
pub mod parcel_repository;
pub mod routing;

pub use driver_repository::*;
pub use geocoder::*;
pub use optimizer::*;
pub use parcel_repository::*;
pub use routing::*;
