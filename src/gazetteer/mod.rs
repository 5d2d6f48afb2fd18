// src/gazetteer/mod.rs - Read-only catalog of countries and subdivisions
//
// Built once per pipeline run and shared by every resolver through an `Arc`.
// Nothing mutates it after construction.
use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::resolution::name_matcher::fold;

pub mod coordinates;

pub use coordinates::{build_coordinate_index, load_coordinate_rows, Coordinate, CoordinateIndex, CoordinateRow};

const EMBEDDED_COUNTRIES: &str = include_str!("../../data/iso3166_1.csv");
const EMBEDDED_SUBDIVISIONS: &str = include_str!("../../data/iso3166_2.csv");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountryEntry {
    pub name: String,
    pub alpha_2: String,
    pub alpha_3: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubdivisionEntry {
    pub name: String,
    /// Hyphenated code, country alpha-2 first (`US-CA`).
    pub code: String,
    #[serde(rename = "type")]
    pub subdivision_type: String,
}

impl SubdivisionEntry {
    /// The part of the code after the hyphen, or the whole code when it has none.
    pub fn code_fragment(&self) -> &str {
        match self.code.split_once('-') {
            Some((_, fragment)) => fragment,
            None => &self.code,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Gazetteer {
    countries: Vec<CountryEntry>,
    subdivisions: Vec<SubdivisionEntry>,
}

impl Gazetteer {
    pub fn new(countries: Vec<CountryEntry>, subdivisions: Vec<SubdivisionEntry>) -> Self {
        Self { countries, subdivisions }
    }

    /// The catalog compiled into the binary. A failure here means the bundled
    /// data is broken, so callers treat it as fatal.
    pub fn embedded() -> Result<Self> {
        let gazetteer = Self::from_readers(EMBEDDED_COUNTRIES.as_bytes(), EMBEDDED_SUBDIVISIONS.as_bytes())
            .context("Embedded gazetteer data is corrupt")?;
        debug!(
            "Loaded embedded gazetteer: {} countries, {} subdivisions",
            gazetteer.countries.len(),
            gazetteer.subdivisions.len()
        );
        Ok(gazetteer)
    }

    pub fn from_readers<C: Read, S: Read>(countries: C, subdivisions: S) -> Result<Self> {
        let countries = read_entries::<CountryEntry, _>(countries).context("Failed to parse country catalog")?;
        let subdivisions =
            read_entries::<SubdivisionEntry, _>(subdivisions).context("Failed to parse subdivision catalog")?;
        if countries.is_empty() {
            bail!("Country catalog is empty");
        }
        Ok(Self::new(countries, subdivisions))
    }

    /// Loads the catalog, replacing either half of the embedded data with a
    /// file when a path is given.
    pub fn load(countries_path: Option<&Path>, subdivisions_path: Option<&Path>) -> Result<Self> {
        let embedded = Self::embedded()?;
        let countries = match countries_path {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open country catalog {}", path.display()))?;
                read_entries::<CountryEntry, _>(file)
                    .with_context(|| format!("Failed to parse country catalog {}", path.display()))?
            }
            None => embedded.countries,
        };
        let subdivisions = match subdivisions_path {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open subdivision catalog {}", path.display()))?;
                read_entries::<SubdivisionEntry, _>(file)
                    .with_context(|| format!("Failed to parse subdivision catalog {}", path.display()))?
            }
            None => embedded.subdivisions,
        };
        if countries.is_empty() {
            bail!("Country catalog is empty");
        }
        info!(
            "🗺️  Gazetteer ready: {} countries, {} subdivisions",
            countries.len(),
            subdivisions.len()
        );
        Ok(Self::new(countries, subdivisions))
    }

    pub fn countries(&self) -> &[CountryEntry] {
        &self.countries
    }

    pub fn subdivisions(&self) -> &[SubdivisionEntry] {
        &self.subdivisions
    }

    /// Exact lookup by name, ignoring case and accents.
    pub fn country_by_name(&self, name: &str) -> Option<&CountryEntry> {
        let needle = fold(name.trim());
        self.countries.iter().find(|c| fold(&c.name) == needle)
    }

    #[cfg(test)]
    pub fn subdivision_by_code(&self, code: &str) -> Option<&SubdivisionEntry> {
        self.subdivisions.iter().find(|s| s.code == code)
    }
}

fn read_entries<T: for<'de> Deserialize<'de>, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut entries = Vec::new();
    for (line, row) in rdr.deserialize::<T>().enumerate() {
        entries.push(row.with_context(|| format!("Invalid catalog row {}", line + 2))?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_loads_in_alpha_3_order() {
        let gazetteer = Gazetteer::embedded().unwrap();
        assert_eq!(gazetteer.countries().len(), 249);
        assert_eq!(gazetteer.countries()[0].name, "Aruba");
        let alpha_3: Vec<&str> = gazetteer.countries().iter().map(|c| c.alpha_3.as_str()).collect();
        let mut sorted = alpha_3.clone();
        sorted.sort();
        assert_eq!(alpha_3, sorted);
    }

    #[test]
    fn test_embedded_subdivisions_are_hyphenated() {
        let gazetteer = Gazetteer::embedded().unwrap();
        assert_eq!(gazetteer.subdivisions().len(), 5127);
        assert_eq!(gazetteer.subdivisions()[0].code, "AD-02");
        assert!(gazetteer.subdivisions().iter().all(|s| s.code.contains('-')));
        let california = gazetteer.subdivision_by_code("US-CA").unwrap();
        assert_eq!(california.name, "California");
        assert_eq!(california.subdivision_type, "State");
        assert_eq!(california.code_fragment(), "CA");
    }

    #[test]
    fn test_country_by_name_folds_case_and_accents() {
        let gazetteer = Gazetteer::embedded().unwrap();
        assert_eq!(gazetteer.country_by_name("cote d'ivoire").unwrap().alpha_2, "CI");
        assert_eq!(gazetteer.country_by_name("  United States ").unwrap().alpha_3, "USA");
        assert!(gazetteer.country_by_name("Atlantis").is_none());
    }

    #[test]
    fn test_code_fragment_without_hyphen() {
        let entry = SubdivisionEntry {
            name: "Somewhere".to_string(),
            code: "XYZ".to_string(),
            subdivision_type: "region".to_string(),
        };
        assert_eq!(entry.code_fragment(), "XYZ");
    }

    #[test]
    fn test_corrupt_catalog_is_an_error() {
        let countries = "alpha_2,alpha_3\nUS,USA\n";
        let subdivisions = "code,name,type\n";
        assert!(Gazetteer::from_readers(countries.as_bytes(), subdivisions.as_bytes()).is_err());
        let empty = "alpha_2,alpha_3,name\n";
        assert!(Gazetteer::from_readers(empty.as_bytes(), subdivisions.as_bytes()).is_err());
    }
}
