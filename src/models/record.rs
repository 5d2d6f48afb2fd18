// src/models/record.rs - Survey record and the in-memory table the resolvers mutate
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw column names of the Earth Challenge extract.
pub mod columns {
    pub const UNIQUE_ID: &str = "UniqueID";
    pub const LOCATION_FREQUENCY_ID: &str = "LocationFreqID";
    pub const LOCATION: &str = "Location";
    pub const COUNTRY: &str = "COUNTRY";
    pub const COUNTRY_CODE: &str = "ISO_CC";
    pub const SUBDIVISION_CODE: &str = "ISO_CODE";
    pub const SUBDIVISION_NAME: &str = "NAME";
    pub const LAND_TYPE: &str = "LAND_TYPE";
    pub const CONTINENT: &str = "CONTINENT";
    pub const SOURCE_COUNTRY_NAME: &str = "CountryName_FromSource";
    pub const LATITUDE: &str = "Latitude1";
    pub const LONGITUDE: &str = "Longitude1";
    pub const ORGANIZATION: &str = "Organization";
    pub const EVENT_DATE: &str = "DateStandardized";
    pub const COUNTRY_LATITUDE: &str = "COUNTRY_Latitude";
    pub const COUNTRY_LONGITUDE: &str = "COUNTRY_Longitude";

    /// Columns mapped onto typed `Record` fields, in export order.
    pub const CORE: [&str; 16] = [
        UNIQUE_ID,
        LOCATION_FREQUENCY_ID,
        LOCATION,
        COUNTRY,
        COUNTRY_CODE,
        SUBDIVISION_CODE,
        SUBDIVISION_NAME,
        LAND_TYPE,
        CONTINENT,
        SOURCE_COUNTRY_NAME,
        LATITUDE,
        LONGITUDE,
        ORGANIZATION,
        EVENT_DATE,
        COUNTRY_LATITUDE,
        COUNTRY_LONGITUDE,
    ];
}

/// Text fields a normalization pass can read from or write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    LocationText,
    Country,
    CountryCode,
    SubdivisionName,
    LandType,
    Continent,
    SourceCountryName,
    Organization,
}

/// One surveyed litter-collection event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub unique_id: Option<String>,
    pub location_frequency_id: Option<String>,
    pub location_text: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub subdivision_code: Option<String>,
    pub subdivision_name: Option<String>,
    pub land_type: Option<String>,
    pub continent: Option<String>,
    pub source_country_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub organization: Option<String>,
    pub event_date: Option<String>,
    pub country_latitude: Option<f64>,
    pub country_longitude: Option<f64>,
    /// Every other column of the extract, keyed by header.
    pub extra: BTreeMap<String, String>,
}

impl Record {
    pub fn field(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::LocationText => &self.location_text,
            Field::Country => &self.country,
            Field::CountryCode => &self.country_code,
            Field::SubdivisionName => &self.subdivision_name,
            Field::LandType => &self.land_type,
            Field::Continent => &self.continent,
            Field::SourceCountryName => &self.source_country_name,
            Field::Organization => &self.organization,
        };
        value.as_deref()
    }

    pub fn set_field(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::LocationText => &mut self.location_text,
            Field::Country => &mut self.country,
            Field::CountryCode => &mut self.country_code,
            Field::SubdivisionName => &mut self.subdivision_name,
            Field::LandType => &mut self.land_type,
            Field::Continent => &mut self.continent,
            Field::SourceCountryName => &mut self.source_country_name,
            Field::Organization => &mut self.organization,
        };
        *slot = Some(value);
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn has_subdivision(&self) -> bool {
        self.subdivision_code.is_some() && self.subdivision_name.is_some() && self.land_type.is_some()
    }

    /// Year of the event, parsed from ISO dates, ISO datetimes or `m/d/Y`.
    pub fn year(&self) -> Option<i32> {
        let raw = self.event_date.as_deref()?.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date.year());
        }
        for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M:%S"] {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(datetime.year());
            }
        }
        NaiveDate::parse_from_str(raw, "%m/%d/%Y")
            .ok()
            .map(|date| date.year())
    }

    /// Text of any column by header name. Null cells and unknown headers are `None`.
    pub fn column_text(&self, column: &str) -> Option<String> {
        let text = |v: &Option<String>| v.clone();
        let number = |v: Option<f64>| v.map(|n| n.to_string());
        match column {
            columns::UNIQUE_ID => text(&self.unique_id),
            columns::LOCATION_FREQUENCY_ID => text(&self.location_frequency_id),
            columns::LOCATION => text(&self.location_text),
            columns::COUNTRY => text(&self.country),
            columns::COUNTRY_CODE => text(&self.country_code),
            columns::SUBDIVISION_CODE => text(&self.subdivision_code),
            columns::SUBDIVISION_NAME => text(&self.subdivision_name),
            columns::LAND_TYPE => text(&self.land_type),
            columns::CONTINENT => text(&self.continent),
            columns::SOURCE_COUNTRY_NAME => text(&self.source_country_name),
            columns::LATITUDE => number(self.latitude),
            columns::LONGITUDE => number(self.longitude),
            columns::ORGANIZATION => text(&self.organization),
            columns::EVENT_DATE => text(&self.event_date),
            columns::COUNTRY_LATITUDE => number(self.country_latitude),
            columns::COUNTRY_LONGITUDE => number(self.country_longitude),
            other => self.extra.get(other).and_then(|v| clean_cell(v)),
        }
    }

    /// Numeric value of an extra column; empty, `nan` and unparsable cells are `None`.
    pub fn extra_number(&self, column: &str) -> Option<f64> {
        self.extra
            .get(column)
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
    }
}

/// The in-memory table: records plus the order of the pass-through columns.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub extra_columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(extra_columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { extra_columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Treats blank cells and pandas' `nan`/`None` spellings as missing.
pub fn clean_cell(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("null")
    {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_parsing_formats() {
        let mut record = Record::default();
        record.event_date = Some("2019-09-21".to_string());
        assert_eq!(record.year(), Some(2019));
        record.event_date = Some("2016-04-02 00:00:00".to_string());
        assert_eq!(record.year(), Some(2016));
        record.event_date = Some("7/14/2018".to_string());
        assert_eq!(record.year(), Some(2018));
        record.event_date = Some("sometime".to_string());
        assert_eq!(record.year(), None);
    }

    #[test]
    fn test_field_accessors() {
        let mut record = Record::default();
        assert_eq!(record.field(Field::Country), None);
        record.set_field(Field::Country, "Portugal".to_string());
        assert_eq!(record.field(Field::Country), Some("Portugal"));
        record.set_field(Field::Continent, "Europe".to_string());
        assert_eq!(record.continent.as_deref(), Some("Europe"));
    }

    #[test]
    fn test_column_text_covers_core_and_extra_columns() {
        let mut record = Record::default();
        record.country = Some("Portugal".to_string());
        record.latitude = Some(38.5);
        record.extra.insert("SUM_Soft_Bag".to_string(), "4".to_string());
        record.extra.insert("Dataset".to_string(), "nan".to_string());
        assert_eq!(record.column_text(columns::COUNTRY).as_deref(), Some("Portugal"));
        assert_eq!(record.column_text(columns::LATITUDE).as_deref(), Some("38.5"));
        assert_eq!(record.column_text(columns::CONTINENT), None);
        assert_eq!(record.column_text("SUM_Soft_Bag").as_deref(), Some("4"));
        assert_eq!(record.column_text("Dataset"), None);
        assert_eq!(record.column_text("Missing"), None);
    }

    #[test]
    fn test_clean_cell() {
        assert_eq!(clean_cell(""), None);
        assert_eq!(clean_cell("  "), None);
        assert_eq!(clean_cell("nan"), None);
        assert_eq!(clean_cell("NaN"), None);
        assert_eq!(clean_cell("Ocean Conservancy"), Some("Ocean Conservancy".to_string()));
    }

    #[test]
    fn test_coordinates_require_both_values() {
        let mut record = Record::default();
        record.latitude = Some(10.0);
        assert_eq!(record.coordinates(), None);
        record.longitude = Some(-20.5);
        assert_eq!(record.coordinates(), Some((10.0, -20.5)));
        record.longitude = Some(f64::NAN);
        assert_eq!(record.coordinates(), None);
    }
}
