// src/utils/csv_io.rs - Load and store the survey table as CSV
use anyhow::{Context, Result};
use log::{info, warn};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use crate::models::record::{clean_cell, columns, Dataset, Record};

pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let dataset = read_dataset_from_reader(file).with_context(|| format!("Failed to read {}", path.display()))?;
    info!("📥 Loaded {} records from {}", dataset.len(), path.display());
    Ok(dataset)
}

pub fn read_dataset_from_reader<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers().context("Missing CSV header row")?.clone();

    let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();
    let extra_columns: Vec<String> = headers
        .iter()
        .filter(|h| !columns::CORE.contains(h))
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    let mut bad_numbers = 0usize;
    for (line, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("Invalid CSV row {}", line + 2))?;
        let text = |column: &str| -> Option<String> {
            index
                .get(column)
                .and_then(|&i| row.get(i))
                .and_then(clean_cell)
        };
        let mut number = |column: &str| -> Option<f64> {
            let raw = text(column)?;
            match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Some(v),
                _ => {
                    bad_numbers += 1;
                    None
                }
            }
        };

        let latitude = number(columns::LATITUDE);
        let longitude = number(columns::LONGITUDE);
        let country_latitude = number(columns::COUNTRY_LATITUDE);
        let country_longitude = number(columns::COUNTRY_LONGITUDE);

        let extra = extra_columns
            .iter()
            .map(|column| {
                let value = index
                    .get(column.as_str())
                    .and_then(|&i| row.get(i))
                    .unwrap_or("")
                    .to_string();
                (column.clone(), value)
            })
            .collect();

        records.push(Record {
            unique_id: text(columns::UNIQUE_ID),
            location_frequency_id: text(columns::LOCATION_FREQUENCY_ID),
            location_text: text(columns::LOCATION),
            country: text(columns::COUNTRY),
            country_code: text(columns::COUNTRY_CODE),
            subdivision_code: text(columns::SUBDIVISION_CODE),
            subdivision_name: text(columns::SUBDIVISION_NAME),
            land_type: text(columns::LAND_TYPE),
            continent: text(columns::CONTINENT),
            source_country_name: text(columns::SOURCE_COUNTRY_NAME),
            latitude,
            longitude,
            organization: text(columns::ORGANIZATION),
            event_date: text(columns::EVENT_DATE),
            country_latitude,
            country_longitude,
            extra,
        });
    }

    if bad_numbers > 0 {
        warn!("⚠️  {} coordinate cells could not be parsed and were treated as missing", bad_numbers);
    }
    Ok(Dataset::new(extra_columns, records))
}

pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_dataset_to_writer(file, dataset).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("📤 Wrote {} records to {}", dataset.len(), path.display());
    Ok(())
}

pub fn write_dataset_to_writer<W: Write>(writer: W, dataset: &Dataset) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header: Vec<&str> = columns::CORE.to_vec();
    header.extend(dataset.extra_columns.iter().map(|c| c.as_str()));
    wtr.write_record(&header)?;

    for record in &dataset.records {
        let mut row: Vec<String> = columns::CORE
            .iter()
            .map(|c| record.column_text(c).unwrap_or_default())
            .collect();
        row.extend(
            dataset
                .extra_columns
                .iter()
                .map(|c| record.extra.get(c).cloned().unwrap_or_default()),
        );
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
UniqueID,LocationFreqID,Location,COUNTRY,Latitude1,Longitude1,Organization,TotalVolunteers,SUM_Soft_Bag
1,X1,\"Santa Monica Beach, CA\",,34.01,-118.49,,12,40
2,X1,Santa Monica Beach,United States,bad,-118.49,Heal the Bay,,nan
";

    #[test]
    fn test_reads_core_and_extra_columns() {
        let dataset = read_dataset_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.extra_columns, vec!["TotalVolunteers", "SUM_Soft_Bag"]);

        let first = &dataset.records[0];
        assert_eq!(first.location_text.as_deref(), Some("Santa Monica Beach, CA"));
        assert_eq!(first.country, None);
        assert_eq!(first.organization, None);
        assert_eq!(first.coordinates(), Some((34.01, -118.49)));
        assert_eq!(first.extra_number("SUM_Soft_Bag"), Some(40.0));

        let second = &dataset.records[1];
        assert_eq!(second.latitude, None);
        assert_eq!(second.organization.as_deref(), Some("Heal the Bay"));
        assert_eq!(second.extra_number("SUM_Soft_Bag"), None);
    }

    #[test]
    fn test_write_then_read_preserves_values() {
        let dataset = read_dataset_from_reader(SAMPLE.as_bytes()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        write_dataset(&path, &dataset).unwrap();

        let reloaded = read_dataset(&path).unwrap();
        assert_eq!(reloaded.extra_columns, dataset.extra_columns);
        assert_eq!(reloaded.records, dataset.records);
    }
}
