pub mod lkh_http;

pub use lkh_http::LkhHttpClient;
