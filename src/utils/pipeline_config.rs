// src/utils/pipeline_config.rs - Run configuration read from the environment
//
// Loaded after `.env` and optionally overridden by CLI flags.

use log::{debug, info};
use std::env;
use std::path::PathBuf;

use crate::utils::constants::{
    DEFAULT_GEOCODER_LANGUAGE, DEFAULT_GEOCODER_TIMEOUT_SECS, DEFAULT_GEOCODER_USER_AGENT,
    DEFAULT_INPUT_PATH, DEFAULT_NOMINATIM_URL, DEFAULT_OUTPUT_PATH,
};

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub enabled: bool,
    pub base_url: String,
    pub user_agent: String,
    pub language: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub coordinates_path: Option<PathBuf>,
    pub countries_path: Option<PathBuf>,
    pub subdivisions_path: Option<PathBuf>,
    pub normalization_plan_path: Option<PathBuf>,
    pub geocoder: GeocoderConfig,
    pub fill_missing_locations: bool,
    pub drop_unresolved_rows: bool,
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<bool>().ok())
        .unwrap_or(default)
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            coordinates_path: None,
            countries_path: None,
            subdivisions_path: None,
            normalization_plan_path: None,
            geocoder: GeocoderConfig {
                enabled: true,
                base_url: DEFAULT_NOMINATIM_URL.to_string(),
                user_agent: DEFAULT_GEOCODER_USER_AGENT.to_string(),
                language: DEFAULT_GEOCODER_LANGUAGE.to_string(),
                timeout_secs: DEFAULT_GEOCODER_TIMEOUT_SECS,
            },
            fill_missing_locations: true,
            drop_unresolved_rows: true,
        }
    }
}

impl PipelineConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            input_path: env_path("EC_INPUT_PATH").unwrap_or(defaults.input_path),
            output_path: env_path("EC_OUTPUT_PATH").unwrap_or(defaults.output_path),
            coordinates_path: env_path("EC_COORDINATES_PATH"),
            countries_path: env_path("EC_COUNTRIES_PATH"),
            subdivisions_path: env_path("EC_SUBDIVISIONS_PATH"),
            normalization_plan_path: env_path("EC_NORMALIZATION_PLAN_PATH"),
            geocoder: GeocoderConfig {
                enabled: env_bool("GEOCODING_ENABLED", defaults.geocoder.enabled),
                base_url: env_string("NOMINATIM_URL", DEFAULT_NOMINATIM_URL),
                user_agent: env_string("GEOCODER_USER_AGENT", DEFAULT_GEOCODER_USER_AGENT),
                language: env_string("GEOCODER_LANGUAGE", DEFAULT_GEOCODER_LANGUAGE),
                timeout_secs: env::var("GEOCODER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .filter(|v| *v > 0)
                    .unwrap_or(DEFAULT_GEOCODER_TIMEOUT_SECS),
            },
            fill_missing_locations: env_bool("FILL_MISSING_LOCATIONS", defaults.fill_missing_locations),
            drop_unresolved_rows: env_bool("DROP_UNRESOLVED_ROWS", defaults.drop_unresolved_rows),
        };
        debug!("Pipeline config: {:?}", config);
        config
    }

    /// Log the current configuration
    pub fn log_config(&self) {
        info!("⚙️  Pipeline configuration:");
        info!("   Input:  {}", self.input_path.display());
        info!("   Output: {}", self.output_path.display());
        match &self.coordinates_path {
            Some(path) => info!("   Country coordinates: {}", path.display()),
            None => info!("   Country coordinates: none (COUNTRY_Latitude/Longitude left empty)"),
        }
        if let Some(path) = &self.normalization_plan_path {
            info!("   Normalization plan: {}", path.display());
        }
        if self.geocoder.enabled {
            info!(
                "   🌐 Reverse geocoding ENABLED via {} (lang={}, timeout={}s)",
                self.geocoder.base_url, self.geocoder.language, self.geocoder.timeout_secs
            );
        } else {
            info!("   🌐 Reverse geocoding DISABLED - rows without textual clues stay unresolved");
        }
        info!(
            "   Fill missing locations: {}, drop unresolved rows: {}",
            self.fill_missing_locations, self.drop_unresolved_rows
        );
    }
}

/// Environment variable configuration example
pub fn print_env_config_example() {
    println!("# Earth Challenge pipeline configuration");
    println!("export EC_INPUT_PATH={}", DEFAULT_INPUT_PATH);
    println!("export EC_OUTPUT_PATH={}", DEFAULT_OUTPUT_PATH);
    println!("# Optional country coordinate table (name,latitude,longitude)");
    println!("export EC_COORDINATES_PATH=data/raw/countries.csv");
    println!("# Optional catalog overrides (same columns as data/iso3166_*.csv)");
    println!("export EC_COUNTRIES_PATH=");
    println!("export EC_SUBDIVISIONS_PATH=");
    println!("# Optional JSON file replacing the built-in normalization passes");
    println!("export EC_NORMALIZATION_PLAN_PATH=");
    println!();
    println!("# Reverse geocoding fallback");
    println!("export GEOCODING_ENABLED=true");
    println!("export NOMINATIM_URL={}", DEFAULT_NOMINATIM_URL);
    println!("export GEOCODER_USER_AGENT={}", DEFAULT_GEOCODER_USER_AGENT);
    println!("export GEOCODER_LANGUAGE={}", DEFAULT_GEOCODER_LANGUAGE);
    println!("export GEOCODER_TIMEOUT_SECS={}", DEFAULT_GEOCODER_TIMEOUT_SECS);
    println!();
    println!("export FILL_MISSING_LOCATIONS=true");
    println!("export DROP_UNRESOLVED_ROWS=true");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const KEYS: [&str; 8] = [
        "EC_INPUT_PATH",
        "EC_COORDINATES_PATH",
        "GEOCODING_ENABLED",
        "NOMINATIM_URL",
        "GEOCODER_LANGUAGE",
        "GEOCODER_TIMEOUT_SECS",
        "FILL_MISSING_LOCATIONS",
        "DROP_UNRESOLVED_ROWS",
    ];

    fn clear() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    // Both cases run in one test so they never race on the process environment.
    #[test]
    fn test_config_from_env() {
        clear();
        let config = PipelineConfig::from_env();
        assert_eq!(config.input_path, PathBuf::from(DEFAULT_INPUT_PATH));
        assert!(config.coordinates_path.is_none());
        assert!(config.geocoder.enabled);
        assert_eq!(config.geocoder.language, "en");
        assert_eq!(config.geocoder.timeout_secs, DEFAULT_GEOCODER_TIMEOUT_SECS);
        assert!(config.drop_unresolved_rows);

        env::set_var("EC_INPUT_PATH", "/tmp/raw.csv");
        env::set_var("EC_COORDINATES_PATH", "/tmp/countries.csv");
        env::set_var("GEOCODING_ENABLED", "false");
        env::set_var("NOMINATIM_URL", "http://localhost:8080");
        env::set_var("GEOCODER_LANGUAGE", "es");
        env::set_var("GEOCODER_TIMEOUT_SECS", "0");
        env::set_var("FILL_MISSING_LOCATIONS", "false");
        env::set_var("DROP_UNRESOLVED_ROWS", "not-a-bool");

        let config = PipelineConfig::from_env();
        assert_eq!(config.input_path, PathBuf::from("/tmp/raw.csv"));
        assert_eq!(config.coordinates_path, Some(PathBuf::from("/tmp/countries.csv")));
        assert!(!config.geocoder.enabled);
        assert_eq!(config.geocoder.base_url, "http://localhost:8080");
        assert_eq!(config.geocoder.language, "es");
        assert_eq!(config.geocoder.timeout_secs, DEFAULT_GEOCODER_TIMEOUT_SECS);
        assert!(!config.fill_missing_locations);
        assert!(config.drop_unresolved_rows);

        clear();
    }
}
