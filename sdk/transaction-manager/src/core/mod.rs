pub mod compression;
pub mod connection;
pub mod well_known;
