// src/utils/progress_bars/logging.rs - Logging helpers for resolution stages
use log::{debug, info, warn};
use std::time::Instant;

use crate::models::stats_models::{PipelineStats, ResolutionStage, StageStats};

#[derive(Clone)]
pub struct StageLogger {
    stage_name: &'static str,
    stage_emoji: &'static str,
    start_time: Instant,
}

impl StageLogger {
    pub fn new(stage: &ResolutionStage) -> Self {
        let (stage_name, stage_emoji) = match stage {
            ResolutionStage::CountryText => ("COUNTRY", "🌍"),
            ResolutionStage::CountryGeocode => ("GEOCODE", "📡"),
            ResolutionStage::LocationGeocode => ("LOCATION", "📍"),
            ResolutionStage::CountryCode => ("CODE", "🔤"),
            ResolutionStage::Subdivision => ("SUBDIVISION", "🗺️"),
            ResolutionStage::Normalization(_) => ("NORMALIZE", "🧹"),
            ResolutionStage::Organization => ("ORGANIZATION", "🏢"),
            ResolutionStage::Cleanup => ("CLEANUP", "✂️"),
        };
        Self {
            stage_name,
            stage_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, candidates: usize) {
        info!(
            "[{}] {} 🚀 Starting {} stage with {} candidate records",
            self.stage_name,
            self.stage_emoji,
            self.stage_name.to_lowercase(),
            candidates
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        match details {
            Some(details) => info!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, details, elapsed.as_secs_f32()
            ),
            None => info!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, elapsed.as_secs_f32()
            ),
        }
    }

    /// Logs every 500th record, every 10% of larger runs, and the last one.
    pub fn log_progress_update(&self, current: usize, total: usize, additional_info: Option<&str>) {
        let should_log = current % 500 == 0
            || current == total
            || (total >= 100 && current % (total / 10) == 0);

        if should_log && current > 0 {
            let percent = (current as f64 / total as f64) * 100.0;
            let msg = match additional_info {
                Some(info) => format!("Progress: {}/{} ({:.1}%) - {}", current, total, percent, info),
                None => format!("Progress: {}/{} ({:.1}%)", current, total, percent),
            };
            info!("[{}] {} 📊 {}", self.stage_name, self.stage_emoji, msg);
        }
    }

    pub fn log_completion(&self, stats: &StageStats) {
        let duration = self.start_time.elapsed();
        info!(
            "[{}] {} ✅ COMPLETED in {:.2?}: {} resolved, {} unresolved of {} examined",
            self.stage_name,
            self.stage_emoji,
            duration,
            stats.resolved,
            stats.unresolved(),
            stats.examined
        );
        if stats.failed > 0 {
            warn!(
                "[{}] {} ⚠️  {} external lookups failed and were skipped",
                self.stage_name, self.stage_emoji, stats.failed
            );
        }
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}

pub fn log_pipeline_start(run_id: &str, total_records: usize, geocoding_enabled: bool) {
    info!("🌊 Starting geographic resolution pipeline (run ID: {})", run_id);
    info!(
        "   • {} records loaded, reverse geocoding {}",
        total_records,
        if geocoding_enabled { "enabled" } else { "disabled" }
    );
}

pub fn log_pipeline_phase(phase: &str, details: Option<&str>) {
    match details {
        Some(details) => info!("🔄 Pipeline phase: {} - {}", phase, details),
        None => info!("🔄 Pipeline phase: {}", phase),
    }
}

pub fn log_pipeline_completion(stats: &PipelineStats) {
    info!(
        "🎉 Pipeline {} finished in {:.2}s over {} records",
        stats.run_id, stats.total_processing_time, stats.total_records
    );
    for stage in &stats.stage_stats {
        info!(
            "   • {:<28} examined {:>7}  resolved {:>7}  failed {:>5}  ({:.2}s)",
            stage.stage.as_str(),
            stage.examined,
            stage.resolved,
            stage.failed,
            stage.duration_secs
        );
    }
}

pub fn log_null_report(title: &str, report: &[(String, f64)]) {
    info!("📋 {}", title);
    for (column, percent) in report {
        info!("   {:<36} {:>6.2}%", column, percent);
    }
}
