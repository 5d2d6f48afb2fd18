// src/resolution/name_matcher.rs - Accent/case folding and ordered first-match name mapping
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Letters NFD leaves intact that still have a plain Latin spelling.
fn expand_letter(c: char) -> Option<&'static str> {
    match c {
        'ø' => Some("o"),
        'Ø' => Some("O"),
        'æ' => Some("ae"),
        'Æ' => Some("AE"),
        'œ' => Some("oe"),
        'Œ' => Some("OE"),
        'ß' => Some("ss"),
        'đ' => Some("d"),
        'Đ' => Some("D"),
        'ł' => Some("l"),
        'Ł' => Some("L"),
        'ı' => Some("i"),
        'þ' => Some("th"),
        'Þ' => Some("TH"),
        _ => None,
    }
}

/// Removes accents while keeping case: `Curaçao` -> `Curacao`.
pub fn strip_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        match expand_letter(c) {
            Some(expanded) => out.push_str(expanded),
            None => out.push(c),
        }
    }
    out
}

/// Lowercase plus accent removal, the comparison form for every name match.
pub fn fold(text: &str) -> String {
    strip_diacritics(text).to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MappingEntry {
    key: String,
    folded_key: String,
    replacement: String,
}

/// Ordered needle -> canonical replacement table. Order is precedence: the
/// first key found in the text wins, so longer or more specific keys must be
/// listed before the shorter keys they contain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct NameMapping {
    entries: Vec<MappingEntry>,
}

impl NameMapping {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(key, replacement)| {
                let key = key.into();
                MappingEntry {
                    folded_key: fold(&key),
                    key,
                    replacement: replacement.into(),
                }
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.key.as_str(), e.replacement.as_str()))
    }

    /// First entry whose folded key occurs in the folded text.
    pub fn find(&self, text: &str) -> Option<(&str, &str)> {
        let folded = fold(text);
        self.entries
            .iter()
            .find(|e| !e.folded_key.is_empty() && folded.contains(&e.folded_key))
            .map(|e| (e.key.as_str(), e.replacement.as_str()))
    }
}

impl From<Vec<(String, String)>> for NameMapping {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::from_pairs(pairs)
    }
}

impl From<NameMapping> for Vec<(String, String)> {
    fn from(mapping: NameMapping) -> Self {
        mapping
            .entries
            .into_iter()
            .map(|e| (e.key, e.replacement))
            .collect()
    }
}

/// Canonical replacement for `text`, accent-stripped, or `None` when no key
/// matches. Callers leave the target field untouched on `None`.
pub fn normalize(text: &str, mapping: &NameMapping) -> Option<String> {
    mapping
        .find(text)
        .map(|(_, replacement)| strip_diacritics(replacement))
}
