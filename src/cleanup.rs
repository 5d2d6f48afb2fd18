// src/cleanup.rs - Row cleanup around the resolution stages
use log::{debug, warn};

use crate::gazetteer::CoordinateIndex;
use crate::models::record::{clean_cell, columns};
use crate::models::{Dataset, Record};

/// Sparse or duplicated columns removed before export.
pub const DEFAULT_DROP_COLUMNS: &[&str] = &[
    "TotalArea_Sq_m",
    "Other",
    "FieldObsevations",
    "BeachAreaLandcover",
    "BeachType",
    "DebrisDescription",
    "WaterfrontName",
    "TotalWidth_m",
    "StartTime",
    "Longitude2",
    "ShorelineName",
    "Latitude2",
    "X",
    "Y",
    "SourceID",
    "SubCountry_L1_FromSource",
    "SubCountry_L2_FromSource",
    "OBJECTID",
];

/// Item and measurement columns whose missing cells mean zero.
pub const DEFAULT_FILL_COLUMNS: &[&str] = &[
    "TotalVolunteers",
    "Totalltems_EventRecord",
    "TotalClassifiedItems_EC2020",
    "PCT_PlasticAndFoam",
    "PCT_Glass_Rubber_Lumber_Metal",
    "SUM_Hard_PlasticBeverageBottle",
    "SUM_Hard_OtherPlasticBottle",
    "SUM_HardOrSoft_PlasticBottleCap",
    "SUM_PlasticOrFoamFoodContainer",
    "SUM_Hard_BucketOrCrate",
    "SUM_Hard_Lighter",
    "SUM_OtherHardPlastic",
    "SUM_PlasticOrFoamPlatesBowlsCup",
    "SUM_HardSoft_PersonalCareProduc",
    "SUM_HardSoftLollipopStick_EarBu",
    "SUM_Soft_Bag",
    "SUM_Soft_WrapperOrLabel",
    "SUM_Soft_Straw",
    "SUM_Soft_OtherPlastic",
    "SUM_Soft_CigaretteButts",
    "SUM_Soft_StringRingRibbon",
    "Fishing_Net",
    "SUM_FishingLineLureRope",
    "Fishing_BuoysAndFloats",
    "SUM_Foam_OtherPlasticDebris",
    "SUM_OtherPlasticDebris",
    "LAND_RANK",
    "Shape__Area",
    "Shape__Length",
    "Soft_Sheets2",
    "PlasticStraps2",
    "FishingGlowSticks2",
    "FishingOtherPlasticDebris2",
];

/// `USCA` -> `US-CA`. Codes that already carry a hyphen or are too short to
/// hold a region part are left alone.
pub fn hyphenate_code(code: &str) -> Option<String> {
    let code = code.trim();
    if code.contains('-') || code.chars().count() < 3 {
        return None;
    }
    let split = code.char_indices().nth(2).map(|(i, _)| i)?;
    Some(format!("{}-{}", &code[..split], &code[split..]))
}

pub fn split_code_by_hyphen(records: &mut [Record]) -> usize {
    let mut changed = 0;
    for record in records.iter_mut() {
        if let Some(code) = record.subdivision_code.as_deref().and_then(hyphenate_code) {
            record.subdivision_code = Some(code);
            changed += 1;
        }
    }
    changed
}

/// Keeps the text before the first `", "`.
pub fn truncate_location_text(records: &mut [Record]) -> usize {
    let mut changed = 0;
    for record in records.iter_mut() {
        if let Some(text) = record.location_text.as_mut() {
            if let Some(pos) = text.find(", ") {
                text.truncate(pos);
                changed += 1;
            }
        }
    }
    changed
}

/// Sets the country-level coordinates from the first observation for the
/// record's country. Records whose country is unknown to the index get nulls.
pub fn add_country_coordinates(records: &mut [Record], index: &CoordinateIndex) -> usize {
    let mut matched = 0;
    for record in records.iter_mut() {
        let first = record.country.as_deref().and_then(|c| index.first(c));
        record.country_latitude = first.map(|c| c.latitude);
        record.country_longitude = first.map(|c| c.longitude);
        if first.is_some() {
            matched += 1;
        }
    }
    matched
}

/// Removes pass-through columns. Core columns are typed fields and are never dropped.
pub fn drop_columns(dataset: &mut Dataset, drop: &[&str]) -> Vec<String> {
    let (removed, kept): (Vec<String>, Vec<String>) = dataset
        .extra_columns
        .drain(..)
        .partition(|c| drop.contains(&c.as_str()));
    dataset.extra_columns = kept;
    for record in dataset.records.iter_mut() {
        for column in &removed {
            record.extra.remove(column);
        }
    }
    for column in drop.iter().filter(|c| columns::CORE.contains(c)) {
        debug!("Column {} is part of the record model and is kept", column);
    }
    removed
}

/// Writes `0` into missing cells of the listed columns that exist in the table.
pub fn fill_missing_values(dataset: &mut Dataset, fill: &[&str]) -> usize {
    let present: Vec<&String> = dataset
        .extra_columns
        .iter()
        .filter(|c| fill.contains(&c.as_str()))
        .collect();
    let mut filled = 0;
    for record in dataset.records.iter_mut() {
        for &column in &present {
            let cell = record.extra.entry(column.clone()).or_default();
            if clean_cell(cell).is_none() {
                *cell = "0".to_string();
                filled += 1;
            }
        }
    }
    filled
}

/// Rewrites numeric cells of the listed columns as integers (`12.0` -> `12`),
/// truncating toward zero. Non-numeric cells are left as they are.
pub fn coerce_integer_columns(dataset: &mut Dataset, integer_columns: &[&str]) -> usize {
    let mut coerced = 0;
    let mut rejected = 0;
    for record in dataset.records.iter_mut() {
        for column in integer_columns {
            let Some(cell) = record.extra.get_mut(*column) else {
                continue;
            };
            match cell.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => {
                    let as_int = (value.trunc() as i64).to_string();
                    if *cell != as_int {
                        *cell = as_int;
                        coerced += 1;
                    }
                }
                _ => rejected += 1,
            }
        }
    }
    if rejected > 0 {
        warn!("⚠️  {} cells could not be read as integers and were left unchanged", rejected);
    }
    coerced
}

/// Percentage of null cells per column, highest first.
pub fn null_percentage_report(dataset: &Dataset) -> Vec<(String, f64)> {
    let total = dataset.len();
    let mut report: Vec<(String, f64)> = columns::CORE
        .iter()
        .map(|c| c.to_string())
        .chain(dataset.extra_columns.iter().cloned())
        .map(|column| {
            let nulls = dataset
                .records
                .iter()
                .filter(|r| r.column_text(&column).is_none())
                .count();
            let percent = if total == 0 {
                0.0
            } else {
                nulls as f64 / total as f64 * 100.0
            };
            (column, percent)
        })
        .collect();
    report.sort_by(|a, b| b.1.total_cmp(&a.1));
    report
}

/// Drops rows still missing a country, a location or a subdivision code.
pub fn drop_unresolved(dataset: &mut Dataset) -> usize {
    let before = dataset.len();
    dataset.records.retain(|r| {
        r.country.is_some() && r.location_text.is_some() && r.subdivision_code.is_some()
    });
    before - dataset.len()
}
