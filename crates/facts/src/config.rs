//! Company catalog and comparison configuration.

use facts_core::{FactsError, PeriodType, Result};
use facts_edgar::company_facts_url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::chart::ChartKind;

/// Base URL of the reference automotive company documents.
const BUILTIN_BASE_URL: &str = "https://raw.githubusercontent.com/thebnbrkr/finance/main";

/// Built-in companies and their document file names.
const BUILTIN_COMPANIES: &[(&str, &str)] = &[
    ("Ford", "Ford.json"),
    ("GM", "GM.json"),
    ("Tesla", "Tesla.json"),
    ("Lucid", "Lucid.json"),
    ("Mullen Automotive", "Mullen_Automotive.json"),
    ("Rivian", "Rivian.json"),
    ("Nikola", "Nikola.json"),
    ("Polaris", "Polaris.json"),
    ("Pheonix_Motor", "Pheonix_Motor.json"),
    ("Cenntro", "Cenntro.json"),
    ("Canoo", "Canoo.json"),
    ("Arcimoto", "Arcimoto.json"),
];

/// Default description shown when no company describes a metric.
pub const DEFAULT_DESCRIPTION: &str = "No description available";

/// Where a company's facts document lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompanyLocation {
    /// A full URL.
    Url {
        /// Document URL.
        url: String,
    },
    /// An SEC CIK, resolved against the EDGAR companyfacts API.
    Cik {
        /// Central Index Key, with or without zero padding.
        cik: String,
    },
}

impl CompanyLocation {
    /// The URL to fetch.
    #[must_use]
    pub fn resolve(&self) -> String {
        match self {
            Self::Url { url } => url.clone(),
            Self::Cik { cik } => company_facts_url(cik),
        }
    }
}

/// A named company in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Display name, also the column name in comparisons.
    pub name: String,
    /// Document location.
    #[serde(flatten)]
    pub location: CompanyLocation,
}

/// Ordered, enumerable mapping from company name to document location.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCatalog {
    companies: Vec<CatalogEntry>,
}

impl CompanyCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalog of twelve automotive companies.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            companies: BUILTIN_COMPANIES
                .iter()
                .map(|(name, file)| CatalogEntry {
                    name: (*name).to_string(),
                    location: CompanyLocation::Url {
                        url: format!("{}/{}", BUILTIN_BASE_URL, file),
                    },
                })
                .collect(),
        }
    }

    /// Parses a catalog from JSON:
    /// `{"companies": [{"name": "Ford", "url": "..."}, {"name": "Tesla", "cik": "1318605"}]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)
            .map_err(|e| FactsError::Config(format!("Invalid company catalog: {}", e)))?;
        catalog.validate()?;
        debug!(companies = catalog.len(), "Loaded company catalog");
        Ok(catalog)
    }

    /// Reads a catalog from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Adds a company located by URL, replacing any entry with the same name.
    #[must_use]
    pub fn with_url(self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.with_entry(CatalogEntry {
            name: name.into(),
            location: CompanyLocation::Url { url: url.into() },
        })
    }

    /// Adds a company located by SEC CIK, replacing any entry with the same name.
    #[must_use]
    pub fn with_cik(self, name: impl Into<String>, cik: impl Into<String>) -> Self {
        self.with_entry(CatalogEntry {
            name: name.into(),
            location: CompanyLocation::Cik { cik: cik.into() },
        })
    }

    fn with_entry(mut self, entry: CatalogEntry) -> Self {
        match self.companies.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.companies.push(entry),
        }
        self
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.companies {
            if entry.name.trim().is_empty() {
                return Err(FactsError::Config("Company with empty name".to_string()));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(FactsError::Config(format!(
                    "Duplicate company: {}",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    /// Company names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.companies.iter().map(|e| e.name.as_str())
    }

    /// Catalog entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.companies.iter()
    }

    /// Returns true if the company is in the catalog.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.companies.iter().any(|e| e.name == name)
    }

    /// Resolved document URL for a company.
    #[must_use]
    pub fn location(&self, name: &str) -> Option<String> {
        self.companies
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.location.resolve())
    }

    /// Number of companies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.companies.len()
    }

    /// Returns true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

/// Which company's description is shown for the chosen metric.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DescriptionSource {
    /// The first selected company.
    #[default]
    FirstSelected,
    /// The first selected company, in selection order, that describes the metric.
    FirstAvailable,
    /// A named company; falls back to the first selected company when it is
    /// not part of the selection.
    Company(String),
}

/// Settings applied to a loaded selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompareConfig {
    /// Unit code series are narrowed to.
    pub unit: String,
    /// Description policy.
    pub description_source: DescriptionSource,
    /// Optional filing form filter.
    pub period: Option<PeriodType>,
    /// Default chart kind.
    pub chart: ChartKind,
    /// Text shown when no description is available.
    pub default_description: String,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            unit: "USD".to_string(),
            description_source: DescriptionSource::default(),
            period: None,
            chart: ChartKind::default(),
            default_description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

impl CompareConfig {
    /// Create the default configuration (USD, first-selected descriptions, line chart).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the unit code.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the description policy.
    #[must_use]
    pub fn with_description_source(mut self, source: DescriptionSource) -> Self {
        self.description_source = source;
        self
    }

    /// Restricts series to one filing period type.
    #[must_use]
    pub const fn with_period(mut self, period: PeriodType) -> Self {
        self.period = Some(period);
        self
    }

    /// Sets the chart kind.
    #[must_use]
    pub const fn with_chart(mut self, chart: ChartKind) -> Self {
        self.chart = chart;
        self
    }

    /// Sets the fallback description text.
    #[must_use]
    pub fn with_default_description(mut self, text: impl Into<String>) -> Self {
        self.default_description = text.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = CompanyCatalog::builtin();
        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.names().next(), Some("Ford"));
        assert_eq!(
            catalog.location("Mullen Automotive").as_deref(),
            Some("https://raw.githubusercontent.com/thebnbrkr/finance/main/Mullen_Automotive.json")
        );
        assert!(catalog.location("Toyota").is_none());
    }

    #[test]
    fn test_catalog_from_json() {
        let catalog = CompanyCatalog::from_json_str(
            r#"{"companies": [
                {"name": "Ford", "url": "https://example.com/ford.json"},
                {"name": "Tesla", "cik": "1318605"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["Ford", "Tesla"]);
        assert_eq!(
            catalog.location("Tesla").as_deref(),
            Some("https://data.sec.gov/api/xbrl/companyfacts/CIK0001318605.json")
        );
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let err = CompanyCatalog::from_json_str(
            r#"{"companies": [
                {"name": "Ford", "url": "a"},
                {"name": "Ford", "url": "b"}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FactsError::Config(_)));
    }

    #[test]
    fn test_catalog_rejects_bad_shape() {
        assert!(CompanyCatalog::from_json_str(r#"{"companies": [{"name": "Ford"}]}"#).is_err());
        assert!(CompanyCatalog::from_json_str("[]").is_err());
    }

    #[test]
    fn test_builder_replaces_existing_entry() {
        let catalog = CompanyCatalog::new()
            .with_url("Ford", "https://example.com/old.json")
            .with_cik("Ford", "37996");

        assert_eq!(catalog.len(), 1);
        assert!(catalog.location("Ford").unwrap().ends_with("CIK0000037996.json"));
    }

    #[test]
    fn test_compare_config_defaults() {
        let config = CompareConfig::new();
        assert_eq!(config.unit, "USD");
        assert_eq!(config.description_source, DescriptionSource::FirstSelected);
        assert_eq!(config.period, None);
        assert_eq!(config.chart, ChartKind::Line);
        assert_eq!(config.default_description, DEFAULT_DESCRIPTION);

        let config = config
            .with_unit("shares")
            .with_period(PeriodType::Quarterly)
            .with_chart(ChartKind::Area);
        assert_eq!(config.unit, "shares");
        assert_eq!(config.period, Some(PeriodType::Quarterly));
        assert_eq!(config.chart, ChartKind::Area);
    }
}
