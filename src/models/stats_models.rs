// src/models/stats_models.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages of the resolution pipeline, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionStage {
    CountryText,
    CountryGeocode,
    LocationGeocode,
    CountryCode,
    Subdivision,
    Normalization(String),
    Organization,
    Cleanup,
}

impl ResolutionStage {
    pub fn as_str(&self) -> &str {
        match self {
            ResolutionStage::CountryText => "country_text",
            ResolutionStage::CountryGeocode => "country_geocode",
            ResolutionStage::LocationGeocode => "location_geocode",
            ResolutionStage::CountryCode => "country_code",
            ResolutionStage::Subdivision => "subdivision",
            ResolutionStage::Normalization(name) => name.as_str(),
            ResolutionStage::Organization => "organization",
            ResolutionStage::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counters for one stage. `examined` is the snapshot of records the stage
/// considered, `resolved` how many it changed, `failed` how many external
/// lookups it absorbed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageStats {
    pub stage: ResolutionStage,
    pub examined: usize,
    pub resolved: usize,
    pub failed: usize,
    pub duration_secs: f64,
}

impl StageStats {
    pub fn new(stage: ResolutionStage) -> Self {
        Self {
            stage,
            examined: 0,
            resolved: 0,
            failed: 0,
            duration_secs: 0.0,
        }
    }

    pub fn unresolved(&self) -> usize {
        self.examined.saturating_sub(self.resolved)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStats {
    pub run_id: String,
    pub run_timestamp: NaiveDateTime,
    pub total_records: usize,
    pub stage_stats: Vec<StageStats>,
    pub total_processing_time: f64,
}

impl PipelineStats {
    pub fn stage(&self, stage: &ResolutionStage) -> Option<&StageStats> {
        self.stage_stats.iter().find(|s| &s.stage == stage)
    }
}
