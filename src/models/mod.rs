pub mod record;
pub mod stats_models;

pub use record::{Dataset, Field, Record};
