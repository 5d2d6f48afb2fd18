// src/geocoding/nominatim.rs - OpenStreetMap Nominatim reverse lookups over HTTP
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use super::{Address, GeocodeError, ReverseGeocoder};

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    display_name: Option<String>,
    address: Option<NominatimAddress>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

pub struct NominatimClient {
    http: Client,
    reverse_url: Url,
    language: String,
    timeout_secs: u64,
}

impl NominatimClient {
    pub fn new(base_url: &str, user_agent: &str, language: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let reverse_url = base.join("reverse")?;
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            reverse_url,
            language: language.to_string(),
            timeout_secs,
        })
    }

    pub fn reverse_url(&self) -> &Url {
        &self.reverse_url
    }

    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<String, GeocodeError> {
        let response = self
            .http
            .get(self.reverse_url.clone())
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("accept-language", self.language.clone()),
            ])
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }
        response.text().await.map_err(|e| self.map_transport_error(e))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> GeocodeError {
        if e.is_timeout() {
            GeocodeError::Timeout(self.timeout_secs)
        } else {
            GeocodeError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Address, GeocodeError> {
        debug!("Nominatim reverse lookup for ({}, {})", latitude, longitude);
        let body = timeout(Duration::from_secs(self.timeout_secs), self.fetch(latitude, longitude))
            .await
            .map_err(|_| GeocodeError::Timeout(self.timeout_secs))??;
        parse_reverse_response(&body)
    }
}

/// Turns a `format=jsonv2` reverse response into an `Address`. A response
/// without a country is treated as a failed lookup.
pub fn parse_reverse_response(body: &str) -> Result<Address, GeocodeError> {
    let parsed: NominatimResponse =
        serde_json::from_str(body).map_err(|e| GeocodeError::Malformed(e.to_string()))?;
    if let Some(error) = parsed.error {
        return Err(GeocodeError::NoResult(error));
    }
    let address = parsed.address.ok_or(GeocodeError::MissingField("address"))?;
    let country = address.country.ok_or(GeocodeError::MissingField("country"))?;
    Ok(Address {
        display_name: parsed.display_name,
        locality: address.city.or(address.town).or(address.village),
        state: address.state,
        country,
        country_code: address.country_code.map(|c| c.to_uppercase()),
    })
}
