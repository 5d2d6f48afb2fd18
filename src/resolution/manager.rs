// src/resolution/manager.rs - Runs the resolution stages over one dataset in their fixed order
use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::cleanup;
use crate::gazetteer::{build_coordinate_index, load_coordinate_rows, CoordinateIndex, Gazetteer};
use crate::geocoding::{DisabledGeocoder, NominatimClient, ReverseGeocoder};
use crate::models::stats_models::{PipelineStats, ResolutionStage, StageStats};
use crate::models::Dataset;
use crate::resolution::country::CountryResolver;
use crate::resolution::normalization::NormalizationPlan;
use crate::resolution::organization::OrganizationBackfiller;
use crate::resolution::subdivision::SubdivisionResolver;
use crate::update_progress;
use crate::utils::pipeline_config::PipelineConfig;
use crate::utils::progress_bars::logging::{
    log_pipeline_completion, log_pipeline_phase, log_pipeline_start, StageLogger,
};
use crate::utils::progress_bars::progress_callback::ProgressCallback;

/// Top-level stages reported to the progress bar, in execution order.
pub const PIPELINE_STAGES: [&str; 8] = [
    "Country text matching",
    "Country geocoding",
    "Location geocoding",
    "Country codes",
    "Subdivisions",
    "Normalization",
    "Organizations",
    "Row cleanup",
];

pub struct ResolutionPipeline {
    coordinates: Arc<CoordinateIndex>,
    plan: NormalizationPlan,
    geocoder: Arc<dyn ReverseGeocoder>,
    country: CountryResolver,
    subdivision: SubdivisionResolver,
    fill_missing_locations: bool,
    geocoding_enabled: bool,
}

impl ResolutionPipeline {
    pub fn new(
        gazetteer: Arc<Gazetteer>,
        coordinates: Arc<CoordinateIndex>,
        plan: NormalizationPlan,
        geocoder: Arc<dyn ReverseGeocoder>,
    ) -> Result<Self> {
        Ok(Self {
            country: CountryResolver::new(Arc::clone(&gazetteer)),
            subdivision: SubdivisionResolver::new(gazetteer).context("Failed to build subdivision patterns")?,
            coordinates,
            plan,
            geocoder,
            fill_missing_locations: true,
            geocoding_enabled: true,
        })
    }

    pub fn with_location_backfill(mut self, enabled: bool) -> Self {
        self.fill_missing_locations = enabled;
        self
    }

    /// Loads every reference input named by the config. Any failure here is
    /// fatal for the run.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let gazetteer = Gazetteer::load(config.countries_path.as_deref(), config.subdivisions_path.as_deref())?;

        let coordinates = match &config.coordinates_path {
            Some(path) => {
                let rows = load_coordinate_rows(path)?;
                let index = build_coordinate_index(rows);
                info!("📌 Country coordinate index: {} countries from {}", index.len(), path.display());
                index
            }
            None => {
                warn!("⚠️  No country coordinate table configured; country coordinates stay empty");
                CoordinateIndex::default()
            }
        };

        let plan = match &config.normalization_plan_path {
            Some(path) => NormalizationPlan::from_json_file(path)?,
            None => NormalizationPlan::default_plan(),
        };

        let geocoder: Arc<dyn ReverseGeocoder> = if config.geocoder.enabled {
            let g = &config.geocoder;
            Arc::new(
                NominatimClient::new(&g.base_url, &g.user_agent, &g.language, g.timeout_secs)
                    .context("Failed to build the Nominatim client")?,
            )
        } else {
            Arc::new(DisabledGeocoder)
        };

        let mut pipeline = Self::new(Arc::new(gazetteer), Arc::new(coordinates), plan, geocoder)?
            .with_location_backfill(config.fill_missing_locations);
        pipeline.geocoding_enabled = config.geocoder.enabled;
        Ok(pipeline)
    }

    /// Mutates the dataset in place. Per-record misses and geocoding failures
    /// are counted in the returned stats, never raised.
    pub async fn run(&self, dataset: &mut Dataset, progress_callback: Option<ProgressCallback>) -> PipelineStats {
        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        let run_timestamp = Utc::now().naive_utc();
        log_pipeline_start(&run_id, dataset.len(), self.geocoding_enabled);

        let mut stage_stats: Vec<StageStats> = Vec::new();
        let records = &mut dataset.records;

        let hyphenated = cleanup::split_code_by_hyphen(records);
        log_pipeline_phase("Subdivision codes", Some(&format!("{} codes hyphenated", hyphenated)));

        update_progress!(progress_callback, PIPELINE_STAGES[0]);
        stage_stats.push(self.country.resolve_from_text(records));

        update_progress!(progress_callback, PIPELINE_STAGES[1]);
        stage_stats.push(
            self.country
                .resolve_by_geocoding(records, self.geocoder.as_ref(), progress_callback.clone())
                .await,
        );

        update_progress!(progress_callback, PIPELINE_STAGES[2]);
        if self.fill_missing_locations {
            stage_stats.push(
                self.country
                    .fill_missing_locations(records, self.geocoder.as_ref(), progress_callback.clone())
                    .await,
            );
        } else {
            log_pipeline_phase("Location geocoding", Some("skipped"));
        }

        update_progress!(progress_callback, PIPELINE_STAGES[3]);
        stage_stats.push(self.country.fill_country_codes(records));

        update_progress!(progress_callback, PIPELINE_STAGES[4]);
        stage_stats.push(self.subdivision.resolve(records));

        update_progress!(progress_callback, PIPELINE_STAGES[5]);
        let normalization = self.plan.apply(records);
        for stats in &normalization {
            log_pipeline_phase(
                stats.stage.as_str(),
                Some(&format!("{} of {} values rewritten", stats.resolved, stats.examined)),
            );
        }
        stage_stats.extend(normalization);
        let located = cleanup::add_country_coordinates(records, &self.coordinates);
        log_pipeline_phase("Country coordinates", Some(&format!("{} records located", located)));

        update_progress!(progress_callback, PIPELINE_STAGES[6]);
        stage_stats.push(OrganizationBackfiller::new().backfill(records));

        update_progress!(progress_callback, PIPELINE_STAGES[7]);
        stage_stats.push(self.clean_rows(dataset));

        let stats = PipelineStats {
            run_id,
            run_timestamp,
            total_records: dataset.len(),
            stage_stats,
            total_processing_time: start.elapsed().as_secs_f64(),
        };
        log_pipeline_completion(&stats);
        stats
    }

    fn clean_rows(&self, dataset: &mut Dataset) -> StageStats {
        let logger = StageLogger::new(&ResolutionStage::Cleanup);
        let mut stats = StageStats::new(ResolutionStage::Cleanup);
        stats.examined = dataset.len();
        logger.log_start(dataset.len());

        stats.resolved = cleanup::truncate_location_text(&mut dataset.records);
        logger.log_phase("Location text", Some(&format!("{} values truncated", stats.resolved)));

        let dropped = cleanup::drop_columns(dataset, cleanup::DEFAULT_DROP_COLUMNS);
        logger.log_phase("Columns", Some(&format!("{} dropped", dropped.len())));

        let filled = cleanup::fill_missing_values(dataset, cleanup::DEFAULT_FILL_COLUMNS);
        let coerced = cleanup::coerce_integer_columns(dataset, cleanup::DEFAULT_FILL_COLUMNS);
        logger.log_phase("Values", Some(&format!("{} filled, {} coerced to integers", filled, coerced)));

        stats.duration_secs = logger.elapsed_secs();
        logger.log_completion(&stats);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::CoordinateRow;
    use crate::geocoding::test_support::{address, ScriptedGeocoder};
    use crate::models::Record;
    use crate::utils::constants::NO_ORGANIZATION_SENTINEL;

    fn fixture_gazetteer() -> Arc<Gazetteer> {
        let countries = "alpha_2,alpha_3,name\n\
                         PT,PRT,Portugal\n\
                         RU,RUS,Russian Federation\n\
                         US,USA,United States\n";
        let subdivisions = "code,name,type\n\
                            PT-08,Faro,District\n\
                            US-CA,California,State\n";
        Arc::new(Gazetteer::from_readers(countries.as_bytes(), subdivisions.as_bytes()).unwrap())
    }

    fn fixture_coordinates() -> Arc<CoordinateIndex> {
        Arc::new(build_coordinate_index(vec![
            CoordinateRow {
                name: "Portugal".to_string(),
                latitude: 39.4,
                longitude: -8.2,
            },
            CoordinateRow {
                name: "Russia".to_string(),
                latitude: 61.5,
                longitude: 105.3,
            },
        ]))
    }

    fn dataset() -> Dataset {
        let mut faro = Record {
            location_frequency_id: Some("X1".to_string()),
            location_text: Some("Praia da Rocha, Faro, Portugal".to_string()),
            subdivision_code: Some("PT08".to_string()),
            ..Default::default()
        };
        faro.extra.insert("OBJECTID".to_string(), "1".to_string());
        faro.extra.insert("SUM_Soft_Bag".to_string(), "".to_string());

        let mut sibling = Record {
            location_frequency_id: Some("X1".to_string()),
            organization: Some("Ocean Conservancy".to_string()),
            country: Some("Portugal".to_string()),
            latitude: Some(37.1),
            longitude: Some(-8.5),
            ..Default::default()
        };
        sibling.extra.insert("OBJECTID".to_string(), "2".to_string());
        sibling.extra.insert("SUM_Soft_Bag".to_string(), "5.0".to_string());

        let mut anytown = Record {
            location_frequency_id: Some("Y7".to_string()),
            location_text: Some("Anytown, CA 90210".to_string()),
            latitude: Some(34.0),
            longitude: Some(-118.2),
            ..Default::default()
        };
        anytown.extra.insert("OBJECTID".to_string(), "3".to_string());
        anytown.extra.insert("SUM_Soft_Bag".to_string(), "1".to_string());

        let mut offshore = Record {
            latitude: Some(0.0),
            longitude: Some(-30.0),
            ..Default::default()
        };
        offshore.extra.insert("OBJECTID".to_string(), "4".to_string());
        offshore.extra.insert("SUM_Soft_Bag".to_string(), "nan".to_string());

        let mut russia = Record {
            source_country_name: Some("Russian Federation".to_string()),
            location_text: Some("Kaliningrad beach".to_string()),
            ..Default::default()
        };
        russia.extra.insert("OBJECTID".to_string(), "5".to_string());
        russia.extra.insert("SUM_Soft_Bag".to_string(), "2".to_string());

        Dataset::new(
            vec!["OBJECTID".to_string(), "SUM_Soft_Bag".to_string()],
            vec![faro, sibling, anytown, offshore, russia],
        )
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let geocoder = Arc::new(
            ScriptedGeocoder::default()
                .respond(34.0, -118.2, address("United States", Some("California"), "Anytown, California, United States", "us"))
                .time_out(0.0, -30.0)
                .respond(37.1, -8.5, address("Portugal", Some("Faro"), "Praia da Marinha, Faro, Portugal", "pt")),
        );
        let pipeline = ResolutionPipeline::new(
            fixture_gazetteer(),
            fixture_coordinates(),
            NormalizationPlan::default_plan(),
            geocoder.clone(),
        )
        .unwrap();

        let mut data = dataset();
        let stats = pipeline.run(&mut data, None).await;
        let r = &data.records;

        // Text match, hyphenated code, folded subdivision name.
        assert_eq!(r[0].country.as_deref(), Some("Portugal"));
        assert_eq!(r[0].country_code.as_deref(), Some("PT"));
        assert_eq!(r[0].subdivision_code.as_deref(), Some("PT-08"));
        assert_eq!(r[0].subdivision_name.as_deref(), Some("Faro"));
        assert_eq!(r[0].location_text.as_deref(), Some("Praia da Rocha"));
        assert_eq!(r[0].organization.as_deref(), Some("Ocean Conservancy"));
        assert_eq!(r[0].country_latitude, Some(39.4));

        // Location backfill keeps the country it already had.
        assert_eq!(r[1].country.as_deref(), Some("Portugal"));
        assert_eq!(r[1].location_text.as_deref(), Some("Praia da Marinha"));
        assert_eq!(r[1].subdivision_code.as_deref(), Some("PT-08"));

        // Geocoded country, then subdivision from the geocoded display name.
        assert_eq!(r[2].country.as_deref(), Some("United States"));
        assert_eq!(r[2].country_code.as_deref(), Some("US"));
        assert_eq!(r[2].subdivision_code.as_deref(), Some("US-CA"));
        assert_eq!(r[2].land_type.as_deref(), Some("State"));
        assert_eq!(r[2].organization.as_deref(), Some(NO_ORGANIZATION_SENTINEL));
        assert_eq!(r[2].country_latitude, None);

        // Timed-out lookup stays unresolved without stopping the batch.
        assert_eq!(r[3].country, None);
        assert_eq!(r[3].organization.as_deref(), Some(NO_ORGANIZATION_SENTINEL));

        // Source country name, then variant and continent normalization.
        assert_eq!(r[4].country.as_deref(), Some("Russia"));
        assert_eq!(r[4].continent.as_deref(), Some("Europe"));
        assert_eq!(r[4].country_latitude, Some(61.5));

        // Row cleanup.
        assert_eq!(data.extra_columns, vec!["SUM_Soft_Bag"]);
        assert_eq!(r[0].extra["SUM_Soft_Bag"], "0");
        assert_eq!(r[1].extra["SUM_Soft_Bag"], "5");
        assert_eq!(r[3].extra["SUM_Soft_Bag"], "0");

        let geocode = stats.stage(&ResolutionStage::CountryGeocode).unwrap();
        assert_eq!(geocode.examined, 2);
        assert_eq!(geocode.resolved, 1);
        assert_eq!(geocode.failed, 1);
        assert_eq!(geocoder.call_count(), 3);
        assert_eq!(stats.total_records, 5);
    }

    #[tokio::test]
    async fn test_second_run_changes_nothing() {
        let geocoder = Arc::new(ScriptedGeocoder::default());
        let pipeline = ResolutionPipeline::new(
            fixture_gazetteer(),
            fixture_coordinates(),
            NormalizationPlan::default_plan(),
            geocoder,
        )
        .unwrap()
        .with_location_backfill(false);

        let mut data = dataset();
        pipeline.run(&mut data, None).await;
        let snapshot = data.records.clone();
        pipeline.run(&mut data, None).await;
        assert_eq!(data.records, snapshot);
    }

    #[tokio::test]
    async fn test_progress_reports_every_stage() {
        use std::sync::Mutex;

        let phases = Arc::new(Mutex::new(Vec::new()));
        let phases_clone = Arc::clone(&phases);
        let callback: ProgressCallback = Arc::new(move |phase: String, details: Option<String>| {
            if details.is_none() {
                phases_clone.lock().unwrap().push(phase);
            }
        });
        let pipeline = ResolutionPipeline::new(
            fixture_gazetteer(),
            fixture_coordinates(),
            NormalizationPlan::default_plan(),
            Arc::new(DisabledGeocoder),
        )
        .unwrap();
        let mut data = dataset();
        pipeline.run(&mut data, Some(callback)).await;
        assert_eq!(*phases.lock().unwrap(), PIPELINE_STAGES.to_vec());
    }
}
