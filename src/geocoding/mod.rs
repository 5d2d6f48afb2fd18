// src/geocoding/mod.rs - Reverse geocoding capability injected into the resolvers
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod nominatim;

pub use nominatim::NominatimClient;

/// Structured address returned by a reverse lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub display_name: Option<String>,
    /// City, town or village, whichever the service reported first.
    pub locality: Option<String>,
    pub state: Option<String>,
    pub country: String,
    /// ISO alpha-2, upper-cased.
    pub country_code: Option<String>,
}

impl Address {
    /// Text adopted as a record's location: the full display name, or the
    /// locality when the service gave no display name.
    pub fn place(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.locality.as_deref())
    }
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("reverse geocoding timed out after {0}s")]
    Timeout(u64),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("service returned HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("response is missing `{0}`")]
    MissingField(&'static str),
    #[error("no result for coordinates: {0}")]
    NoResult(String),
    #[error("geocoding is disabled")]
    Disabled,
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Address, GeocodeError>;
}

/// Stand-in used when geocoding is switched off; every lookup fails, so the
/// resolvers leave the affected records unresolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeocoder;

#[async_trait]
impl ReverseGeocoder for DisabledGeocoder {
    async fn reverse_geocode(&self, _latitude: f64, _longitude: f64) -> Result<Address, GeocodeError> {
        Err(GeocodeError::Disabled)
    }
}
