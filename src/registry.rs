//! Country registry - descriptive metadata keyed by country code.
//!
//! The registry is independent from the asset table: a code can have a flag
//! without metadata and vice versa. The built-in data lives in
//! `data/countries.json` and covers every embedded flag.

use crate::assets::{is_well_formed, normalize_country_code};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

const BUILTIN_DATA: &str = include_str!("../data/countries.json");

/// Descriptive metadata for one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryInfo {
    /// ISO 3166-1 alpha-2 code, lowercase (e.g., "de")
    pub code: String,
    /// English name (e.g., "Germany")
    pub name: String,
    /// Name in the country's own language (e.g., "Deutschland")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    /// Area in square kilometres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<u64>,
    /// ISO 4217 currency code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
}

impl CountryInfo {
    /// Minimal record with only a code and a name
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: normalize_country_code(code),
            name: name.to_string(),
            native_name: None,
            continent: None,
            capital: None,
            population: None,
            area: None,
            currency: None,
            languages: Vec::new(),
        }
    }

    pub fn with_native_name(mut self, native_name: &str) -> Self {
        self.native_name = Some(native_name.to_string());
        self
    }

    /// Case-insensitive substring match on name or native name.
    /// `query` must already be lowercased.
    fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
            || self
                .native_name
                .as_ref()
                .is_some_and(|n| n.to_lowercase().contains(query))
    }
}

/// Errors while loading registry data
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid registry data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate registry entry for {0}")]
    Duplicate(String),
    #[error("Invalid country code in registry: {0:?}")]
    InvalidCode(String),
}

/// Ordered, immutable country metadata table
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<CountryInfo>,
}

impl Registry {
    /// Registry parsed from the bundled `data/countries.json`
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_json(BUILTIN_DATA)
    }

    /// Parses a JSON array of country records, keeping file order.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let entries: Vec<CountryInfo> = serde_json::from_str(json)?;
        let mut seen = HashSet::new();
        for entry in &entries {
            let code = normalize_country_code(&entry.code);
            if !is_well_formed(&code) {
                return Err(RegistryError::InvalidCode(entry.code.clone()));
            }
            if !seen.insert(code) {
                return Err(RegistryError::Duplicate(entry.code.clone()));
            }
        }
        Ok(Self::from_entries(entries))
    }

    /// Registry from in-memory records; codes are normalized and later
    /// duplicates of a code are dropped.
    pub fn from_entries(entries: impl IntoIterator<Item = CountryInfo>) -> Self {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .map(|mut info| {
                info.code = normalize_country_code(&info.code);
                info
            })
            .filter(|info| seen.insert(info.code.clone()))
            .collect();
        Self { entries }
    }

    /// Metadata for a code, if the registry has any
    pub fn info_of(&self, code: &str) -> Option<&CountryInfo> {
        let code = normalize_country_code(code);
        self.entries.iter().find(|info| info.code == code)
    }

    /// Countries whose name or native name contains `query`, ignoring case,
    /// in registry order.
    pub fn search(&self, query: &str) -> Vec<&CountryInfo> {
        let query = query.to_lowercase();
        self.entries.iter().filter(|info| info.matches(&query)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
