pub mod driver;
pub mod location;
pub mod parcel;
pub mod route;
