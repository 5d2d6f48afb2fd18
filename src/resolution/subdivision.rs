// src/resolution/subdivision.rs - Subdivision (state/province) detection from location text
use anyhow::{Context, Result};
use regex::RegexSet;
use std::sync::Arc;

use crate::gazetteer::{Gazetteer, SubdivisionEntry};
use crate::models::stats_models::{ResolutionStage, StageStats};
use crate::models::Record;
use crate::resolution::name_matcher::fold;
use crate::utils::progress_bars::logging::StageLogger;

pub struct SubdivisionResolver {
    gazetteer: Arc<Gazetteer>,
    folded_names: Vec<String>,
    code_patterns: RegexSet,
}

impl SubdivisionResolver {
    /// Compiles one word-boundary pattern per catalog entry up front, as a
    /// single set indexed like the catalog.
    pub fn new(gazetteer: Arc<Gazetteer>) -> Result<Self> {
        let folded_names = gazetteer.subdivisions().iter().map(|s| fold(&s.name)).collect();
        let patterns = gazetteer
            .subdivisions()
            .iter()
            .map(|s| format!(r"\b{}\b", regex::escape(s.code_fragment())));
        let code_patterns = RegexSet::new(patterns).context("Invalid subdivision code patterns")?;
        Ok(Self {
            gazetteer,
            folded_names,
            code_patterns,
        })
    }

    /// Folded name substring first; only when no name matches, the code
    /// fragment against the unfolded text.
    pub fn match_subdivision(&self, location_text: &str) -> Option<&SubdivisionEntry> {
        let subdivisions = self.gazetteer.subdivisions();
        let folded = fold(location_text);
        let by_name = subdivisions
            .iter()
            .zip(self.folded_names.iter())
            .find(|(_, name)| !name.is_empty() && folded.contains(name.as_str()))
            .map(|(entry, _)| entry);
        if by_name.is_some() {
            return by_name;
        }
        // Set matches come back in ascending index, which is catalog order.
        self.code_patterns
            .matches(location_text)
            .into_iter()
            .map(|i| &subdivisions[i])
            .find(|entry| !entry.code_fragment().is_empty())
    }

    pub fn resolve(&self, records: &mut [Record]) -> StageStats {
        let logger = StageLogger::new(&ResolutionStage::Subdivision);
        let mut stats = StageStats::new(ResolutionStage::Subdivision);

        let unresolved: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.has_subdivision() && r.location_text.is_some())
            .map(|(i, _)| i)
            .collect();
        stats.examined = unresolved.len();
        logger.log_start(unresolved.len());

        for (n, &i) in unresolved.iter().enumerate() {
            let record = &mut records[i];
            let found = record
                .location_text
                .as_deref()
                .and_then(|text| self.match_subdivision(text));
            if let Some(entry) = found {
                if apply_match(record, entry) {
                    stats.resolved += 1;
                }
            }
            logger.log_progress_update(n + 1, unresolved.len(), None);
        }

        stats.duration_secs = logger.elapsed_secs();
        logger.log_completion(&stats);
        stats
    }
}

/// Sets all three fields when the record has no name yet. A record that
/// already carries a name keeps it; only its missing code and type are
/// filled, and only when the match names the same subdivision.
fn apply_match(record: &mut Record, entry: &SubdivisionEntry) -> bool {
    match record.subdivision_name.as_deref() {
        None => {
            record.subdivision_code = Some(entry.code.clone());
            record.subdivision_name = Some(entry.name.clone());
            record.land_type = Some(entry.subdivision_type.clone());
            true
        }
        Some(existing) if fold(existing.trim()) == fold(&entry.name) => {
            if record.subdivision_code.is_none() {
                record.subdivision_code = Some(entry.code.clone());
            }
            if record.land_type.is_none() {
                record.land_type = Some(entry.subdivision_type.clone());
            }
            true
        }
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_gazetteer() -> Arc<Gazetteer> {
        let countries = "alpha_2,alpha_3,name\nUS,USA,United States\nCA,CAN,Canada\n";
        let subdivisions = "code,name,type\n\
                            CA-BC,British Columbia,province\n\
                            US-CA,California,state\n\
                            US-OR,Oregon,state\n";
        Arc::new(Gazetteer::from_readers(countries.as_bytes(), subdivisions.as_bytes()).unwrap())
    }

    fn at(text: &str) -> Record {
        Record {
            location_text: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_code_fallback_uses_word_boundary() {
        let resolver = SubdivisionResolver::new(fixture_gazetteer()).unwrap();
        let mut records = vec![at("Anytown, CA 90210")];
        let stats = resolver.resolve(&mut records);
        assert_eq!(records[0].subdivision_name.as_deref(), Some("California"));
        assert_eq!(records[0].subdivision_code.as_deref(), Some("US-CA"));
        assert_eq!(records[0].land_type.as_deref(), Some("state"));
        assert_eq!(stats.resolved, 1);
    }

    #[test]
    fn test_name_pass_beats_earlier_code_match() {
        let resolver = SubdivisionResolver::new(fixture_gazetteer()).unwrap();
        // "BC" would hit British Columbia in the code pass, but the name pass runs first.
        let entry = resolver.match_subdivision("BC ferry terminal near oregon coast").unwrap();
        assert_eq!(entry.code, "US-OR");
    }

    #[test]
    fn test_name_pass_folds_but_code_pass_does_not() {
        let resolver = SubdivisionResolver::new(fixture_gazetteer()).unwrap();
        assert_eq!(resolver.match_subdivision("CALIFÓRNIA coast").unwrap().code, "US-CA");
        assert!(resolver.match_subdivision("anytown, ca 90210").is_none());
        assert!(resolver.match_subdivision("CAPE town").is_none());
    }

    #[test]
    fn test_complete_and_empty_records_are_skipped() {
        let resolver = SubdivisionResolver::new(fixture_gazetteer()).unwrap();
        let mut records = vec![
            Record {
                location_text: Some("Portland, Oregon".to_string()),
                subdivision_code: Some("US-CA".to_string()),
                subdivision_name: Some("California".to_string()),
                land_type: Some("state".to_string()),
                ..Default::default()
            },
            Record::default(),
            at("Middle of the ocean"),
        ];
        let stats = resolver.resolve(&mut records);
        assert_eq!(records[0].subdivision_code.as_deref(), Some("US-CA"));
        assert_eq!(records[1].subdivision_code, None);
        assert_eq!(records[2].subdivision_code, None);
        assert_eq!(records[2].subdivision_name, None);
        assert_eq!(stats.examined, 1);
        assert_eq!(stats.resolved, 0);
    }

    #[test]
    fn test_existing_name_is_never_replaced() {
        let resolver = SubdivisionResolver::new(fixture_gazetteer()).unwrap();
        let mut records = vec![Record {
            location_text: Some("Brookings, near the California line".to_string()),
            subdivision_name: Some("Oregon".to_string()),
            ..Default::default()
        }];
        let stats = resolver.resolve(&mut records);
        assert_eq!(records[0].subdivision_name.as_deref(), Some("Oregon"));
        assert_eq!(records[0].subdivision_code, None);
        assert_eq!(records[0].land_type, None);
        assert_eq!(stats.resolved, 0);
    }

    #[test]
    fn test_named_record_gets_code_when_match_agrees() {
        let resolver = SubdivisionResolver::new(fixture_gazetteer()).unwrap();
        let mut records = vec![Record {
            location_text: Some("Cannon Beach, Oregon".to_string()),
            subdivision_name: Some("oregon".to_string()),
            ..Default::default()
        }];
        let stats = resolver.resolve(&mut records);
        assert_eq!(records[0].subdivision_name.as_deref(), Some("oregon"));
        assert_eq!(records[0].subdivision_code.as_deref(), Some("US-OR"));
        assert_eq!(records[0].land_type.as_deref(), Some("state"));
        assert_eq!(stats.resolved, 1);

        let snapshot = records.clone();
        resolver.resolve(&mut records);
        assert_eq!(records, snapshot);
    }

    #[test]
    fn test_embedded_catalog_resolves_outside_north_america() {
        let resolver = SubdivisionResolver::new(Arc::new(Gazetteer::embedded().unwrap())).unwrap();
        let mut records = vec![
            at("Playa de la Concha, Gipuzkoa, Pais Vasco, Spain"),
            at("Scheveningen, Zuid-Holland"),
            at("Copacabana, Rio de Janeiro"),
        ];
        let stats = resolver.resolve(&mut records);
        let codes: Vec<Option<&str>> = records.iter().map(|r| r.subdivision_code.as_deref()).collect();
        assert_eq!(codes, vec![Some("ES-SS"), Some("NL-ZH"), Some("BR-RJ")]);
        assert_eq!(records[1].land_type.as_deref(), Some("Province"));
        assert_eq!(stats.resolved, 3);
    }
}
