pub mod config;
pub mod geocoding;
pub mod harvester;
pub mod http;
pub mod model;
pub mod rewrite;
pub mod speed_table;
