//! Repository adapters backed by the MySQL store.

pub mod driver_mysql;
pub mod entities;
pub mod parcel_mysql;

pub use driver_mysql::DriverMysqlRepository;
pub use parcel_mysql::ParcelMysqlRepository;
