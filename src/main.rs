use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use earth_challenge_lib::cleanup::{drop_unresolved, null_percentage_report};
use earth_challenge_lib::resolution::manager::PIPELINE_STAGES;
use earth_challenge_lib::resolution::ResolutionPipeline;
use earth_challenge_lib::utils::csv_io::{read_dataset, write_dataset};
use earth_challenge_lib::utils::env::load_env;
use earth_challenge_lib::utils::get_memory_usage;
use earth_challenge_lib::utils::pipeline_config::{self, PipelineConfig};
use earth_challenge_lib::utils::progress_bars::logging::log_null_report;
use earth_challenge_lib::utils::progress_bars::progress_callback::ProgressCallback;
use earth_challenge_lib::utils::progress_bars::progress_config::{self, ProgressConfig};

#[derive(Parser)]
#[command(author, version, about = "Resolve and normalize the Earth Challenge beach-litter dataset", long_about = None)]
struct Args {
    /// Raw survey CSV
    #[arg(long)]
    input: Option<PathBuf>,

    /// Cleaned CSV destination
    #[arg(long)]
    output: Option<PathBuf>,

    /// Country coordinate table (name,latitude,longitude)
    #[arg(long)]
    coordinates: Option<PathBuf>,

    /// JSON file replacing the built-in normalization passes
    #[arg(long)]
    normalization_plan: Option<PathBuf>,

    /// Skip the reverse geocoding fallback
    #[arg(long)]
    no_geocoding: bool,

    /// Do not geocode rows that only lack a location text
    #[arg(long)]
    no_location_fill: bool,

    /// Keep rows that are still missing country, location or subdivision
    #[arg(long)]
    keep_unresolved: bool,

    /// Print the supported environment variables and exit
    #[arg(long)]
    print_env_example: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.print_env_example {
        pipeline_config::print_env_config_example();
        println!();
        progress_config::print_env_config_example();
        return Ok(());
    }

    info!("Starting Earth Challenge geographic resolution pipeline");
    load_env();
    let start = Instant::now();

    let mut config = PipelineConfig::from_env();
    if let Some(input) = args.input {
        config.input_path = input;
    }
    if let Some(output) = args.output {
        config.output_path = output;
    }
    if let Some(coordinates) = args.coordinates {
        config.coordinates_path = Some(coordinates);
    }
    if let Some(plan) = args.normalization_plan {
        config.normalization_plan_path = Some(plan);
    }
    if args.no_geocoding {
        config.geocoder.enabled = false;
    }
    if args.no_location_fill {
        config.fill_missing_locations = false;
    }
    if args.keep_unresolved {
        config.drop_unresolved_rows = false;
    }
    config.log_config();

    let progress_config = ProgressConfig::from_env();
    info!(
        "Progress tracking: enabled={}, detailed={}",
        progress_config.enabled, progress_config.detailed
    );
    let multi_progress = progress_config.create_multi_progress();
    let stage_pb = multi_progress
        .as_ref()
        .map(|mp| progress_config.stage_bar(mp, PIPELINE_STAGES.len() as u64));
    let detail_pb = multi_progress
        .as_ref()
        .filter(|_| progress_config.should_show_detailed())
        .map(|mp| progress_config.detail_spinner(mp));

    let pipeline = ResolutionPipeline::from_config(&config).context("Failed to load reference data")?;

    let mut dataset = read_dataset(&config.input_path)
        .with_context(|| format!("Failed to load input dataset {}", config.input_path.display()))?;
    log_null_report("Null percentage by column (raw)", &null_percentage_report(&dataset));

    let progress_callback: Option<ProgressCallback> = stage_pb.as_ref().map(|stage_bar| {
        let stage_bar: ProgressBar = stage_bar.clone();
        let detail_bar = detail_pb.clone();
        let callback: ProgressCallback = Arc::new(move |phase: String, details: Option<String>| match details {
            None => {
                if !stage_bar.message().is_empty() {
                    stage_bar.inc(1);
                }
                stage_bar.set_message(phase);
            }
            Some(details) => {
                if let Some(bar) = &detail_bar {
                    bar.set_message(format!("{}: {}", phase, details));
                    bar.tick();
                }
            }
        });
        callback
    });

    let stats = pipeline.run(&mut dataset, progress_callback).await;

    if let Some(pb) = &stage_pb {
        pb.inc(1);
        pb.finish_with_message("Resolution complete");
    }
    if let Some(pb) = &detail_pb {
        pb.finish_and_clear();
    }

    if config.drop_unresolved_rows {
        let dropped = drop_unresolved(&mut dataset);
        if dropped > 0 {
            warn!(
                "⚠️  Dropped {} rows still missing a country, location or subdivision code ({} remain)",
                dropped,
                dataset.len()
            );
        }
    }
    log_null_report("Null percentage by column (cleaned)", &null_percentage_report(&dataset));

    write_dataset(&config.output_path, &dataset)
        .with_context(|| format!("Failed to write cleaned dataset {}", config.output_path.display()))?;

    info!(
        "Pipeline run {} finished in {:.2?}. Memory in use: {} MB",
        stats.run_id,
        start.elapsed(),
        get_memory_usage()
    );
    Ok(())
}
