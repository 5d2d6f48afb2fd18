pub mod aggregation;
pub mod cleanup;
pub mod gazetteer;
pub mod geocoding;
pub mod models;
pub mod resolution;
pub mod utils;
