// src/resolution/mappings.rs - Built-in normalization tables
//
// Order inside each table is precedence: the first key found wins. Keep long
// or qualified names above any shorter key they contain.
use crate::resolution::name_matcher::NameMapping;

/// Catalog and geocoder spellings of countries -> dashboard names.
pub fn country_variants() -> NameMapping {
    NameMapping::from_pairs(vec![
        ("Saint Helena, Ascension and Tristan da Cunha", "Saint Helena"),
        ("Madeira", "Portugal"),
        ("Azores", "Portugal"),
        ("Canary Islands", "Spain"),
        ("Russian Federation", "Russia"),
        ("Korea, Democratic People's Republic of", "North Korea"),
        ("Korea, Republic of", "South Korea"),
        ("Republic of Korea", "South Korea"),
        ("Iran, Islamic Republic of", "Iran"),
        ("Viet Nam", "Vietnam"),
        ("Taiwan, Province of China", "Taiwan"),
        ("Tanzania, United Republic of", "Tanzania"),
        ("Venezuela, Bolivarian Republic of", "Venezuela"),
        ("Bolivia, Plurinational State of", "Bolivia"),
        ("Micronesia, Federated States of", "Micronesia"),
        ("Moldova, Republic of", "Moldova"),
        ("Lao People's Democratic Republic", "Laos"),
        ("Syrian Arab Republic", "Syria"),
        ("Brunei Darussalam", "Brunei"),
        ("Côte d'Ivoire", "Ivory Coast"),
        ("Cabo Verde", "Cape Verde"),
        ("Türkiye", "Turkey"),
        ("Virgin Islands, U.S.", "US Virgin Islands"),
        ("Virgin Islands, British", "British Virgin Islands"),
        ("Congo, The Democratic Republic of the", "Democratic Republic of the Congo"),
        ("Palestine, State of", "Palestine"),
        ("Holy See", "Vatican City"),
        ("Falkland Islands (Malvinas)", "Falkland Islands"),
        ("Bonaire, Sint Eustatius and Saba", "Caribbean Netherlands"),
        ("United States of America", "United States"),
    ])
}

/// Subdivision names that the dashboard reports as a country of their own,
/// or that belong to a different sovereign than the raw row claims.
pub fn subdivision_promotions() -> NameMapping {
    NameMapping::from_pairs(vec![
        ("Madeira", "Portugal"),
        ("Açores", "Portugal"),
        ("Canarias", "Spain"),
        ("Puerto Rico", "Puerto Rico"),
        ("Guam", "Guam"),
        ("American Samoa", "American Samoa"),
        ("Northern Mariana", "Northern Mariana Islands"),
        ("Virgin Islands, U.S.", "US Virgin Islands"),
    ])
}

/// Alternate spellings of subdivision names.
pub fn subdivision_corrections() -> NameMapping {
    NameMapping::from_pairs(vec![
        ("Mexico City", "Ciudad de Mexico"),
        ("Distrito Federal", "Ciudad de Mexico"),
        ("Newfoundland", "Newfoundland and Labrador"),
        ("Washington, D.C.", "District of Columbia"),
        ("Yukon Territory", "Yukon"),
    ])
}

/// Countries whose raw continent label disagrees with the dashboard's.
pub fn continent_corrections() -> NameMapping {
    NameMapping::from_pairs(vec![
        ("Russia", "Europe"),
        ("Turkey", "Asia"),
        ("Cyprus", "Europe"),
        ("Egypt", "Africa"),
        ("Papua New Guinea", "Oceania"),
        ("Indonesia", "Asia"),
        ("Trinidad and Tobago", "North America"),
        ("Panama", "North America"),
        ("Greenland", "North America"),
        ("Saint Helena", "Africa"),
        ("French Polynesia", "Oceania"),
    ])
}
