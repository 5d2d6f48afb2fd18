// src/resolution/country.rs - Country resolution from text clues, codes and reverse geocoding
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::gazetteer::{CountryEntry, Gazetteer};
use crate::geocoding::{Address, ReverseGeocoder};
use crate::models::stats_models::{ResolutionStage, StageStats};
use crate::models::Record;
use crate::resolution::name_matcher::fold;
use crate::update_detailed_progress;
use crate::utils::progress_bars::logging::StageLogger;
use crate::utils::progress_bars::progress_callback::ProgressCallback;

pub struct CountryResolver {
    gazetteer: Arc<Gazetteer>,
    folded_names: Vec<String>,
}

impl CountryResolver {
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        let folded_names = gazetteer.countries().iter().map(|c| fold(&c.name)).collect();
        Self { gazetteer, folded_names }
    }

    /// First catalog entry whose folded name occurs in the folded value, or
    /// whose alpha-3 / alpha-2 code occurs verbatim in the trimmed value.
    /// Codes are compared case-sensitively so ordinary words ("Sandy Bay")
    /// do not read as codes.
    pub fn match_country(&self, value: &str) -> Option<&CountryEntry> {
        let raw = value.trim();
        if raw.is_empty() {
            return None;
        }
        let folded = fold(raw);
        self.gazetteer
            .countries()
            .iter()
            .zip(self.folded_names.iter())
            .find(|(entry, folded_name)| {
                (!folded_name.is_empty() && folded.contains(folded_name.as_str()))
                    || (!entry.alpha_3.is_empty() && raw.contains(entry.alpha_3.as_str()))
                    || (!entry.alpha_2.is_empty() && raw.contains(entry.alpha_2.as_str()))
            })
            .map(|(entry, _)| entry)
    }

    /// Text pass. Distinct `location_text` values come first, then distinct
    /// `source_country_name` values, so a record's own location text always
    /// outranks the source-reported country.
    pub fn resolve_from_text(&self, records: &mut [Record]) -> StageStats {
        let logger = StageLogger::new(&ResolutionStage::CountryText);
        let mut stats = StageStats::new(ResolutionStage::CountryText);

        let unresolved: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.country.is_none())
            .map(|(i, _)| i)
            .collect();
        stats.examined = unresolved.len();
        logger.log_start(unresolved.len());

        let mut seen = HashSet::new();
        let mut distinct_values: Vec<String> = Vec::new();
        for value in unresolved
            .iter()
            .filter_map(|&i| records[i].location_text.as_ref())
            .chain(unresolved.iter().filter_map(|&i| records[i].source_country_name.as_ref()))
        {
            if seen.insert(value.as_str()) {
                distinct_values.push(value.clone());
            }
        }
        logger.log_phase("Matching distinct values", Some(&format!("{} values", distinct_values.len())));

        let matches: HashMap<&str, String> = distinct_values
            .iter()
            .filter_map(|value| {
                self.match_country(value)
                    .map(|entry| (value.as_str(), entry.name.clone()))
            })
            .collect();
        logger.log_debug(&format!("{} of {} distinct values matched a country", matches.len(), distinct_values.len()));

        for &i in &unresolved {
            let record = &mut records[i];
            let found = [record.location_text.as_deref(), record.source_country_name.as_deref()]
                .into_iter()
                .flatten()
                .find_map(|value| matches.get(value).cloned());
            if let Some(country) = found {
                record.country = Some(country);
                stats.resolved += 1;
            }
        }

        stats.duration_secs = logger.elapsed_secs();
        logger.log_completion(&stats);
        stats
    }

    /// Geocoding fallback for records still missing a country. One attempt per
    /// record; every failure is absorbed and counted.
    pub async fn resolve_by_geocoding(
        &self,
        records: &mut [Record],
        geocoder: &dyn ReverseGeocoder,
        progress_callback: Option<ProgressCallback>,
    ) -> StageStats {
        let logger = StageLogger::new(&ResolutionStage::CountryGeocode);
        let mut stats = StageStats::new(ResolutionStage::CountryGeocode);

        let unresolved: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.country.is_none())
            .map(|(i, _)| i)
            .collect();
        let total = unresolved.len();
        stats.examined = total;
        logger.log_start(total);

        for (n, &i) in unresolved.iter().enumerate() {
            let record = &mut records[i];
            let label = record
                .location_text
                .clone()
                .or_else(|| record.source_country_name.clone())
                .unwrap_or_default();

            match record.coordinates() {
                None => logger.log_debug(&format!("Record {} has no coordinates, skipping", i)),
                Some((lat, lon)) => match geocoder.reverse_geocode(lat, lon).await {
                    Ok(address) if !address.country.trim().is_empty() => {
                        adopt_address(record, address);
                        stats.resolved += 1;
                    }
                    Ok(_) => {
                        stats.failed += 1;
                        logger.log_debug(&format!("Empty country for ({}, {})", lat, lon));
                    }
                    Err(e) => {
                        stats.failed += 1;
                        logger.log_debug(&format!("Lookup failed for ({}, {}): {}", lat, lon, e));
                    }
                },
            }

            update_detailed_progress!(progress_callback, "Geocoding countries", n + 1, total, label);
            logger.log_progress_update(n + 1, total, None);
        }

        stats.duration_secs = logger.elapsed_secs();
        logger.log_completion(&stats);
        stats
    }

    /// Geocodes records that already have a country but no location text,
    /// adopting only the display name and, when missing, the state.
    pub async fn fill_missing_locations(
        &self,
        records: &mut [Record],
        geocoder: &dyn ReverseGeocoder,
        progress_callback: Option<ProgressCallback>,
    ) -> StageStats {
        let logger = StageLogger::new(&ResolutionStage::LocationGeocode);
        let mut stats = StageStats::new(ResolutionStage::LocationGeocode);

        let missing: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.location_text.is_none() && r.country.is_some())
            .map(|(i, _)| i)
            .collect();
        let total = missing.len();
        stats.examined = total;
        logger.log_start(total);

        for (n, &i) in missing.iter().enumerate() {
            let record = &mut records[i];
            let label = record.country.clone().unwrap_or_default();

            if let Some((lat, lon)) = record.coordinates() {
                match geocoder.reverse_geocode(lat, lon).await {
                    Ok(address) => {
                        if let Some(place) = address.place() {
                            record.location_text = Some(place.to_string());
                            stats.resolved += 1;
                        }
                        if record.subdivision_code.is_none() && record.subdivision_name.is_none() {
                            if let Some(state) = address.state {
                                record.subdivision_name = Some(state);
                            }
                        }
                    }
                    Err(e) => {
                        stats.failed += 1;
                        logger.log_debug(&format!("Lookup failed for ({}, {}): {}", lat, lon, e));
                    }
                }
            }

            update_detailed_progress!(progress_callback, "Geocoding locations", n + 1, total, label);
            logger.log_progress_update(n + 1, total, None);
        }

        stats.duration_secs = logger.elapsed_secs();
        logger.log_completion(&stats);
        stats
    }

    /// Alpha-2 for records that have a country name but no code.
    pub fn fill_country_codes(&self, records: &mut [Record]) -> StageStats {
        let logger = StageLogger::new(&ResolutionStage::CountryCode);
        let mut stats = StageStats::new(ResolutionStage::CountryCode);
        let mut cache: HashMap<String, Option<String>> = HashMap::new();

        for record in records.iter_mut().filter(|r| r.country_code.is_none()) {
            let Some(country) = record.country.as_deref() else {
                continue;
            };
            stats.examined += 1;
            let code = cache
                .entry(country.to_string())
                .or_insert_with(|| {
                    self.gazetteer
                        .country_by_name(country)
                        .map(|entry| entry.alpha_2.clone())
                })
                .clone();
            if let Some(code) = code {
                record.country_code = Some(code);
                stats.resolved += 1;
            }
        }

        stats.duration_secs = logger.elapsed_secs();
        logger.log_completion(&stats);
        stats
    }
}

fn adopt_address(record: &mut Record, address: Address) {
    debug!("Geocoded country {:?} for {:?}", address.country, record.unique_id);
    if let Some(place) = address.place() {
        record.location_text = Some(place.to_string());
    }
    record.country = Some(address.country);
    if record.subdivision_code.is_none() && record.subdivision_name.is_none() {
        if let Some(state) = address.state {
            record.subdivision_name = Some(state);
        }
    }
    if let Some(code) = address.country_code {
        record.country_code = Some(code.to_uppercase());
    }
}
