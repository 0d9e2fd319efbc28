pub mod valhalla;

pub use valhalla::ValhallaClient;
