// src/aggregation.rs - Geography/year rollups and dashboard drill-down totals
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::models::Record;

pub const VOLUNTEERS_COLUMN: &str = "TotalVolunteers";
pub const TOTAL_ITEMS_COLUMN: &str = "Totalltems_EventRecord";

/// Litter item columns summed per group and charted by the dashboard.
pub const ITEM_COLUMNS: &[&str] = &[
    "SUM_Soft_CigaretteButts",
    "SUM_Hard_Lighter",
    "SUM_Soft_Straw",
    "SUM_Hard_PlasticBeverageBottle",
    "SUM_Hard_OtherPlasticBottle",
    "SUM_HardOrSoft_PlasticBottleCap",
    "SUM_PlasticOrFoamPlatesBowlsCup",
    "SUM_PlasticOrFoamFoodContainer",
    "SUM_HardSoftLollipopStick_EarBu",
    "SUM_Soft_Bag",
    "SUM_Hard_BucketOrCrate",
    "SUM_Soft_WrapperOrLabel",
    "SUM_HardSoft_PersonalCareProduc",
    "SUM_Soft_StringRingRibbon",
    "PCT_PlasticAndFoam",
    "Soft_Sheets2",
    "PCT_Glass_Rubber_Lumber_Metal",
    "SUM_FishingLineLureRope",
    "Fishing_Net",
    "Fishing_BuoysAndFloats",
    "FishingGlowSticks2",
    "FishingOtherPlasticDebris2",
    "SUM_Soft_OtherPlastic",
    "SUM_Foam_OtherPlasticDebris",
    "SUM_OtherPlasticDebris",
    "SUM_OtherHardPlastic",
];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub continent: String,
    pub country: String,
    pub subdivision: String,
    pub year: i32,
}

impl GroupKey {
    /// Rows missing any grouping value are left out of the rollup.
    pub fn for_record(record: &Record) -> Option<Self> {
        Some(Self {
            continent: record.continent.clone()?,
            country: record.country.clone()?,
            subdivision: record.subdivision_name.clone()?,
            year: record.year()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    #[serde(flatten)]
    pub key: GroupKey,
    pub events: usize,
    pub locations: usize,
    pub organizations: usize,
    pub volunteers: f64,
    pub total_items: f64,
    pub items: BTreeMap<String, f64>,
}

#[derive(Default)]
struct GroupAccumulator {
    events: usize,
    locations: HashSet<String>,
    organizations: HashSet<String>,
    volunteers: f64,
    total_items: f64,
    items: BTreeMap<String, f64>,
}

fn sum_items(items: &mut BTreeMap<String, f64>, record: &Record, item_columns: &[&str]) {
    for column in item_columns {
        *items.entry(column.to_string()).or_insert(0.0) += record.extra_number(column).unwrap_or(0.0);
    }
}

/// Event counts, distinct locations and organizations, and item sums per
/// (continent, country, subdivision, year), ordered by key.
pub fn aggregate_by_geography_and_year(records: &[Record], item_columns: &[&str]) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<GroupKey, GroupAccumulator> = BTreeMap::new();
    for record in records {
        let Some(key) = GroupKey::for_record(record) else {
            continue;
        };
        let acc = groups.entry(key).or_default();
        acc.events += 1;
        if let Some(location) = &record.location_text {
            acc.locations.insert(location.clone());
        }
        if let Some(organization) = &record.organization {
            acc.organizations.insert(organization.clone());
        }
        acc.volunteers += record.extra_number(VOLUNTEERS_COLUMN).unwrap_or(0.0);
        acc.total_items += record.extra_number(TOTAL_ITEMS_COLUMN).unwrap_or(0.0);
        sum_items(&mut acc.items, record, item_columns);
    }

    groups
        .into_iter()
        .map(|(key, acc)| GroupSummary {
            key,
            events: acc.events,
            locations: acc.locations.len(),
            organizations: acc.organizations.len(),
            volunteers: acc.volunteers,
            total_items: acc.total_items,
            items: acc.items,
        })
        .collect()
}

/// The dashboard's location dropdowns. Each given value narrows the rows;
/// totals are reported one level below the deepest contiguous selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFilter {
    pub continent: Option<String>,
    pub country: Option<String>,
    pub subdivision: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillLevel {
    Continent,
    Country,
    Subdivision,
    Location,
}

impl LocationFilter {
    pub fn level(&self) -> DrillLevel {
        match (&self.continent, &self.country, &self.subdivision) {
            (None, _, _) => DrillLevel::Continent,
            (Some(_), None, _) => DrillLevel::Country,
            (Some(_), Some(_), None) => DrillLevel::Subdivision,
            (Some(_), Some(_), Some(_)) => DrillLevel::Location,
        }
    }

    fn admits(&self, record: &Record) -> bool {
        let matches = |wanted: &Option<String>, actual: &Option<String>| match wanted {
            None => true,
            Some(w) => actual.as_deref() == Some(w.as_str()),
        };
        matches(&self.continent, &record.continent)
            && matches(&self.country, &record.country)
            && matches(&self.subdivision, &record.subdivision_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTotal {
    pub label: String,
    pub items: BTreeMap<String, f64>,
    pub sum: f64,
}

/// Item sums per child of the selected level, largest `sum` first.
pub fn drill_down(records: &[Record], filter: &LocationFilter, item_columns: &[&str]) -> Vec<LevelTotal> {
    let level = filter.level();
    let mut totals: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for record in records.iter().filter(|r| filter.admits(r)) {
        let label = match level {
            DrillLevel::Continent => &record.continent,
            DrillLevel::Country => &record.country,
            DrillLevel::Subdivision => &record.subdivision_name,
            DrillLevel::Location => &record.location_text,
        };
        let Some(label) = label else {
            continue;
        };
        sum_items(totals.entry(label.clone()).or_default(), record, item_columns);
    }

    let mut rows: Vec<LevelTotal> = totals
        .into_iter()
        .map(|(label, items)| {
            let sum = items.values().sum();
            LevelTotal { label, items, sum }
        })
        .collect();
    rows.sort_by(|a, b| b.sum.total_cmp(&a.sum));
    rows
}

/// One litter item's totals per year, for the yearly bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemYearTotal {
    pub item: String,
    pub by_year: BTreeMap<i32, f64>,
    pub sum: f64,
}

pub fn item_totals_by_year(groups: &[GroupSummary], item_columns: &[&str]) -> Vec<ItemYearTotal> {
    let mut rows: Vec<ItemYearTotal> = item_columns
        .iter()
        .map(|item| {
            let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
            for group in groups {
                let value = group.items.get(*item).copied().unwrap_or(0.0);
                *by_year.entry(group.key.year).or_insert(0.0) += value;
            }
            let sum = by_year.values().sum();
            ItemYearTotal {
                item: item.to_string(),
                by_year,
                sum,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.sum.total_cmp(&a.sum));
    rows
}

/// Keeps the leading rows (already sorted descending) whose running total
/// stays within `share` of the grand total.
pub fn top_share<T, F>(rows: Vec<T>, share: f64, value: F) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    let threshold = rows.iter().map(&value).sum::<f64>() * share;
    let mut running = 0.0;
    rows.into_iter()
        .take_while(|row| {
            running += value(row);
            running <= threshold
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEMS: &[&str] = &["SUM_Soft_Bag", "SUM_Soft_Straw"];

    fn event(continent: &str, country: &str, subdivision: &str, location: &str, date: &str, bags: &str, straws: &str) -> Record {
        let mut record = Record {
            continent: Some(continent.to_string()),
            country: Some(country.to_string()),
            subdivision_name: Some(subdivision.to_string()),
            location_text: Some(location.to_string()),
            event_date: Some(date.to_string()),
            organization: Some("Surfrider".to_string()),
            ..Default::default()
        };
        record.extra.insert("SUM_Soft_Bag".to_string(), bags.to_string());
        record.extra.insert("SUM_Soft_Straw".to_string(), straws.to_string());
        record.extra.insert(VOLUNTEERS_COLUMN.to_string(), "3".to_string());
        record
    }

    fn sample() -> Vec<Record> {
        vec![
            event("Europe", "Portugal", "Faro", "Praia da Rocha", "2019-05-01", "4", "1"),
            event("Europe", "Portugal", "Faro", "Praia da Rocha", "2019-06-01", "6", "0"),
            event("Europe", "Portugal", "Lisboa", "Cascais", "2020-01-10", "1", "1"),
            event("North America", "United States", "California", "Santa Monica", "2019-07-04", "20", "30"),
        ]
    }

    #[test]
    fn test_groups_by_geography_and_year() {
        let mut records = sample();
        records.push(Record::default());
        let groups = aggregate_by_geography_and_year(&records, ITEMS);
        assert_eq!(groups.len(), 3);

        let faro = &groups[0];
        assert_eq!(faro.key.subdivision, "Faro");
        assert_eq!(faro.key.year, 2019);
        assert_eq!(faro.events, 2);
        assert_eq!(faro.locations, 1);
        assert_eq!(faro.organizations, 1);
        assert_eq!(faro.volunteers, 6.0);
        assert_eq!(faro.items["SUM_Soft_Bag"], 10.0);
    }

    #[test]
    fn test_drill_down_levels() {
        let records = sample();
        let continents = drill_down(&records, &LocationFilter::default(), ITEMS);
        assert_eq!(continents[0].label, "North America");
        assert_eq!(continents[0].sum, 50.0);
        assert_eq!(continents[1].sum, 13.0);

        let filter = LocationFilter {
            continent: Some("Europe".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.level(), DrillLevel::Country);
        let countries = drill_down(&records, &filter, ITEMS);
        assert_eq!(countries.len(), 1);
        assert_eq!(countries[0].label, "Portugal");

        let filter = LocationFilter {
            continent: Some("Europe".to_string()),
            country: Some("Portugal".to_string()),
            subdivision: Some("Faro".to_string()),
        };
        let locations = drill_down(&records, &filter, ITEMS);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].label, "Praia da Rocha");
        assert_eq!(locations[0].sum, 11.0);
    }

    #[test]
    fn test_item_totals_and_top_share() {
        let groups = aggregate_by_geography_and_year(&sample(), ITEMS);
        let totals = item_totals_by_year(&groups, ITEMS);
        assert_eq!(totals[0].item, "SUM_Soft_Straw");
        assert_eq!(totals[0].sum, 32.0);
        assert_eq!(totals[1].item, "SUM_Soft_Bag");
        assert_eq!(totals[1].by_year[&2019], 30.0);
        assert_eq!(totals[1].by_year[&2020], 1.0);

        let kept = top_share(vec![50.0, 30.0, 15.0, 5.0], 0.8, |v| *v);
        assert_eq!(kept, vec![50.0, 30.0]);
        let none = top_share(vec![90.0, 10.0], 0.8, |v| *v);
        assert!(none.is_empty());
    }
}
