// src/bin/build_features.rs
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use clap::Parser;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use earth_challenge_lib::aggregation::{
    aggregate_by_geography_and_year, drill_down, item_totals_by_year, top_share, GroupSummary,
    ItemYearTotal, LevelTotal, LocationFilter, ITEM_COLUMNS,
};
use earth_challenge_lib::utils::constants::{DEFAULT_FEATURES_PATH, DEFAULT_OUTPUT_PATH, TOP_SHARE_THRESHOLD};
use earth_challenge_lib::utils::csv_io::read_dataset;
use earth_challenge_lib::utils::env::load_env;

#[derive(Parser)]
#[command(author, version, about = "Aggregate the cleaned dataset for the dashboard", long_about = None)]
struct FeatureArgs {
    /// Cleaned CSV written by the resolution pipeline
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    input: PathBuf,

    /// JSON destination
    #[arg(long, default_value = DEFAULT_FEATURES_PATH)]
    output: PathBuf,

    /// Drill-down: restrict to one continent
    #[arg(long)]
    continent: Option<String>,

    /// Drill-down: restrict to one country
    #[arg(long)]
    country: Option<String>,

    /// Drill-down: restrict to one subdivision
    #[arg(long)]
    subdivision: Option<String>,

    /// Keep only the rows making up the top 80% of litter
    #[arg(long)]
    top_share: bool,
}

#[derive(Serialize)]
struct FeatureReport {
    generated_at: NaiveDateTime,
    source: String,
    records: usize,
    filter: LocationFilter,
    groups: Vec<GroupSummary>,
    item_totals: Vec<ItemYearTotal>,
    drill_down: Vec<LevelTotal>,
}

fn main() -> Result<()> {
    env_logger::init();
    load_env();
    let args = FeatureArgs::parse();

    let dataset = read_dataset(&args.input)?;
    let filter = LocationFilter {
        continent: args.continent,
        country: args.country,
        subdivision: args.subdivision,
    };

    let groups = aggregate_by_geography_and_year(&dataset.records, ITEM_COLUMNS);
    info!("📊 {} geography/year groups from {} records", groups.len(), dataset.len());

    let mut item_totals = item_totals_by_year(&groups, ITEM_COLUMNS);
    let mut levels = drill_down(&dataset.records, &filter, ITEM_COLUMNS);
    info!("🔎 Drill-down at {:?} level: {} rows", filter.level(), levels.len());

    if args.top_share {
        item_totals = top_share(item_totals, TOP_SHARE_THRESHOLD, |row| row.sum);
        levels = top_share(levels, TOP_SHARE_THRESHOLD, |row| row.sum);
        info!(
            "✂️  Top {:.0}% kept: {} items, {} drill-down rows",
            TOP_SHARE_THRESHOLD * 100.0,
            item_totals.len(),
            levels.len()
        );
    }

    let report = FeatureReport {
        generated_at: Utc::now().naive_utc(),
        source: args.input.display().to_string(),
        records: dataset.len(),
        filter,
        groups,
        item_totals,
        drill_down: levels,
    };

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize feature report")?;
    fs::write(&args.output, json).with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("📤 Feature report written to {}", args.output.display());
    Ok(())
}
