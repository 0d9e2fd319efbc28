//! Infrastructure Layer
//!
//! Adapters for the external collaborators: the MySQL store, the Kakao
//! geocoder, the traffic-proxied routing engine, the LKH sidecar, and the
//! HTTP surface.

pub mod geocoding;
pub mod http;
pub mod optimizer;
pub mod repository;
pub mod routing;
