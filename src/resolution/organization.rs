// src/resolution/organization.rs - Organization attribution backfill by location-frequency id
use std::collections::HashMap;

use crate::models::stats_models::{ResolutionStage, StageStats};
use crate::models::Record;
use crate::utils::constants::NO_ORGANIZATION_SENTINEL;
use crate::utils::progress_bars::logging::StageLogger;

/// Null, blank and the literal placeholders `nan`/`None` all count as missing.
pub fn is_missing_organization(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None => true,
        Some(v) => v.is_empty() || v.eq_ignore_ascii_case("nan") || v == "None",
    }
}

#[derive(Default)]
pub struct OrganizationBackfiller {
    cache: HashMap<String, String>,
}

impl OrganizationBackfiller {
    pub fn new() -> Self {
        Self::default()
    }

    /// First real organization among records sharing `location_id`, in table
    /// order, or the sentinel. Cached per id.
    fn organization_for(&mut self, records: &[Record], location_id: &str) -> String {
        if let Some(cached) = self.cache.get(location_id) {
            return cached.clone();
        }
        let found = records
            .iter()
            .filter(|r| r.location_frequency_id.as_deref() == Some(location_id))
            .find_map(|r| {
                let org = r.organization.as_deref();
                (!is_missing_organization(org)).then(|| org.unwrap_or_default().to_string())
            })
            .unwrap_or_else(|| NO_ORGANIZATION_SENTINEL.to_string());
        self.cache.insert(location_id.to_string(), found.clone());
        found
    }

    /// Fills every missing organization. Values are looked up against the
    /// table as it was before this pass, so earlier fills never feed later ones.
    pub fn backfill(&mut self, records: &mut [Record]) -> StageStats {
        let logger = StageLogger::new(&ResolutionStage::Organization);
        let mut stats = StageStats::new(ResolutionStage::Organization);

        let missing: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| is_missing_organization(r.organization.as_deref()))
            .map(|(i, _)| i)
            .collect();
        stats.examined = missing.len();
        logger.log_start(missing.len());

        let table: &[Record] = records;
        let assignments: Vec<(usize, String)> = missing
            .iter()
            .map(|&i| {
                let value = match table[i].location_frequency_id.as_deref() {
                    Some(id) => self.organization_for(table, id),
                    None => NO_ORGANIZATION_SENTINEL.to_string(),
                };
                (i, value)
            })
            .collect();

        for (i, value) in assignments {
            if value != NO_ORGANIZATION_SENTINEL {
                stats.resolved += 1;
            }
            records[i].organization = Some(value);
        }

        logger.log_debug(&format!(
            "{} location ids cached, {} records received the sentinel",
            self.cache.len(),
            stats.unresolved()
        ));
        stats.duration_secs = logger.elapsed_secs();
        logger.log_completion(&stats);
        stats
    }
}
