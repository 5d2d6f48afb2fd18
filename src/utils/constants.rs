// src/utils/constants.rs

/// Value written to `organization` when no record at the same site names one.
pub const NO_ORGANIZATION_SENTINEL: &str = "No Organization Data Provided";

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_GEOCODER_USER_AGENT: &str = "earth-challenge-cleaner";
pub const DEFAULT_GEOCODER_LANGUAGE: &str = "en";
pub const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_INPUT_PATH: &str = "data/raw/earth_challenge_dataset.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "data/interim/01_data_processed.csv";
pub const DEFAULT_FEATURES_PATH: &str = "data/interim/02_data_processed.json";

/// Share of the item total kept when the top-share threshold is applied.
pub const TOP_SHARE_THRESHOLD: f64 = 0.8;
