// src/gazetteer/coordinates.rs - Country name -> coordinate observations
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinateRow {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Observations grouped by country name, in input order. Lookups use the
/// first observation.
#[derive(Debug, Clone, Default)]
pub struct CoordinateIndex {
    by_name: HashMap<String, Vec<Coordinate>>,
}

impl CoordinateIndex {
    pub fn observations(&self, name: &str) -> Option<&[Coordinate]> {
        self.by_name.get(name).map(|v| v.as_slice())
    }

    pub fn first(&self, name: &str) -> Option<Coordinate> {
        self.observations(name).and_then(|v| v.first().copied())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

pub fn build_coordinate_index<I>(rows: I) -> CoordinateIndex
where
    I: IntoIterator<Item = CoordinateRow>,
{
    let mut by_name: HashMap<String, Vec<Coordinate>> = HashMap::new();
    for row in rows {
        by_name.entry(row.name).or_default().push(Coordinate {
            latitude: row.latitude,
            longitude: row.longitude,
        });
    }
    CoordinateIndex { by_name }
}

/// Reads `name,latitude,longitude` rows; other columns are ignored. Any
/// unreadable row fails the whole load.
pub fn load_coordinate_rows(path: &Path) -> Result<Vec<CoordinateRow>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open coordinate table {}", path.display()))?;
    let mut rows = Vec::new();
    for (line, row) in rdr.deserialize::<CoordinateRow>().enumerate() {
        rows.push(row.with_context(|| format!("Invalid coordinate row {} in {}", line + 2, path.display()))?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn row(name: &str, latitude: f64, longitude: f64) -> CoordinateRow {
        CoordinateRow {
            name: name.to_string(),
            latitude,
            longitude,
        }
    }

    #[test]
    fn test_groups_by_name_preserving_order() {
        let index = build_coordinate_index(vec![
            row("Portugal", 39.4, -8.2),
            row("Spain", 40.4, -3.7),
            row("Portugal", 32.7, -16.9),
        ]);
        assert_eq!(index.len(), 2);
        let portugal = index.observations("Portugal").unwrap();
        assert_eq!(portugal.len(), 2);
        assert_eq!(portugal[1].latitude, 32.7);
        assert_eq!(
            index.first("Portugal"),
            Some(Coordinate { latitude: 39.4, longitude: -8.2 })
        );
        assert_eq!(index.first("Atlantis"), None);
    }

    #[test]
    fn test_load_rows_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "country,latitude,longitude,name").unwrap();
        writeln!(file, "US,37.09024,-95.712891,United States").unwrap();
        writeln!(file, "PT,39.399872,-8.224454,Portugal").unwrap();
        let rows = load_coordinate_rows(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "United States");
        assert_eq!(rows[1].longitude, -8.224454);
    }

    #[test]
    fn test_load_rejects_bad_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,latitude,longitude").unwrap();
        writeln!(file, "Portugal,north,-8.2").unwrap();
        assert!(load_coordinate_rows(file.path()).is_err());
    }
}
