pub mod driver_info;
pub mod parcel;
pub mod user;
