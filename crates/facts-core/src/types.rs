//! Core data types for company facts.
//!
//! This module defines the document schema and the flat per-company indices:
//!
//! - [`FactDocument`] - Raw per-company companyfacts document
//! - [`FactEntry`] - One taxonomy tag: label, description and unit series
//! - [`Observation`] - A single reported value
//! - [`MetricIndex`] - Flat metric -> unit -> observations mapping
//! - [`Descriptions`] - Flat metric -> human readable description mapping
//! - [`CompanySeries`] - One company's observations for a single metric and unit

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{FactsError, Result};

/// Date format of `end`, `start` and `filed` fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Observations grouped by unit code (e.g. "USD", "shares").
pub type UnitSeries = BTreeMap<String, Vec<Observation>>;

/// Raw company facts document as served by the EDGAR companyfacts API.
///
/// Only `facts.us-gaap` is interpreted. Every field is optional so that a
/// document missing `facts` or `us-gaap` still parses and simply yields no
/// metrics.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactDocument {
    /// CIK number (a JSON number in EDGAR documents, sometimes a string elsewhere).
    #[serde(default)]
    pub cik: Option<serde_json::Value>,
    /// Entity name.
    #[serde(default)]
    pub entity_name: Option<String>,
    /// Facts organized by taxonomy.
    #[serde(default)]
    pub facts: Option<Taxonomies>,
}

impl FactDocument {
    /// Parses a document from raw JSON bytes.
    ///
    /// Fails when the body is not JSON or its top level is not an object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| FactsError::Parse(format!("Failed to parse company facts: {}", e)))?;

        if !value.is_object() {
            return Err(FactsError::Parse(
                "Company facts document is not a JSON object".to_string(),
            ));
        }

        serde_json::from_value(value)
            .map_err(|e| FactsError::Parse(format!("Failed to parse company facts: {}", e)))
    }

    /// Raw `us-gaap` entries keyed by tag, if present.
    #[must_use]
    pub fn us_gaap(&self) -> Option<&BTreeMap<String, serde_json::Value>> {
        self.facts.as_ref()?.us_gaap.as_ref()
    }
}

/// Taxonomies inside the `facts` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Taxonomies {
    /// US GAAP tags. Entries stay as raw JSON until extraction so one
    /// malformed tag cannot reject the whole document.
    #[serde(rename = "us-gaap", default)]
    pub us_gaap: Option<BTreeMap<String, serde_json::Value>>,
}

/// Facts for a single US GAAP tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactEntry {
    /// Short label.
    pub label: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Observations keyed by unit code.
    pub units: Option<UnitSeries>,
}

impl FactEntry {
    /// Decodes an entry from raw JSON, returning `None` if it is not an object.
    ///
    /// `label`, `description` and `units` are decoded independently: a field
    /// of the wrong type is treated as absent without affecting the others.
    /// Inside `units`, a unit whose value is not an array is skipped and
    /// observation records that are not objects are dropped.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;

        Some(Self {
            label: text_field(object.get("label")),
            description: text_field(object.get("description")),
            units: object.get("units").and_then(units_from_value),
        })
    }

    /// Description to show for this tag: `description`, falling back to `label`.
    #[must_use]
    pub fn display_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| self.label.as_deref().filter(|l| !l.trim().is_empty()))
    }
}

fn text_field(value: Option<&serde_json::Value>) -> Option<String> {
    value?.as_str().map(str::to_string)
}

fn units_from_value(value: &serde_json::Value) -> Option<UnitSeries> {
    let units = value.as_object()?;

    Some(
        units
            .iter()
            .filter_map(|(unit, records)| {
                let Some(records) = records.as_array() else {
                    debug!(unit = %unit, "Unit is not an observation list, skipping");
                    return None;
                };

                let observations: Vec<Observation> = records
                    .iter()
                    .filter(|record| record.is_object())
                    .filter_map(|record| Observation::deserialize(record).ok())
                    .collect();
                if observations.len() < records.len() {
                    debug!(
                        unit = %unit,
                        dropped = records.len() - observations.len(),
                        "Dropped undecodable observation records"
                    );
                }
                Some((unit.clone(), observations))
            })
            .collect(),
    )
}

/// Decodes an optional field, treating a value of the wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

/// A single reported fact value.
///
/// `end` and `val` are optional: extraction passes records through untouched
/// and alignment decides what is usable. Fields of the wrong type decode as
/// absent, so a malformed `fy` or `filed` never costs the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// End date of the period (YYYY-MM-DD).
    #[serde(default, deserialize_with = "lenient")]
    pub end: Option<String>,
    /// Reported value, kept as raw JSON.
    #[serde(default)]
    pub val: Option<serde_json::Value>,
    /// Start date of the period, absent for instant facts.
    #[serde(default, deserialize_with = "lenient")]
    pub start: Option<String>,
    /// Accession number.
    #[serde(default, deserialize_with = "lenient")]
    pub accn: Option<String>,
    /// Fiscal year.
    #[serde(default, deserialize_with = "lenient")]
    pub fy: Option<i64>,
    /// Fiscal period (FY, Q1..Q4).
    #[serde(default, deserialize_with = "lenient")]
    pub fp: Option<String>,
    /// Form type (10-K, 10-Q, ...).
    #[serde(default, deserialize_with = "lenient")]
    pub form: Option<String>,
    /// Filed date.
    #[serde(default, deserialize_with = "lenient")]
    pub filed: Option<String>,
    /// Frame (e.g. CY2023Q4I).
    #[serde(default, deserialize_with = "lenient")]
    pub frame: Option<String>,
}

impl Observation {
    /// Creates an observation with only a period end and a numeric value.
    #[must_use]
    pub fn new(end: impl Into<String>, val: f64) -> Self {
        Self {
            end: Some(end.into()),
            val: serde_json::Number::from_f64(val).map(serde_json::Value::Number),
            ..Default::default()
        }
    }

    /// Parsed period end, or `None` if absent or not a calendar date.
    #[must_use]
    pub fn period_end(&self) -> Option<NaiveDate> {
        let end = self.end.as_deref()?.trim();
        NaiveDate::parse_from_str(end, DATE_FORMAT).ok()
    }

    /// Numeric value, accepting JSON numbers and numeric strings.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        let value = match self.val.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        value.is_finite().then_some(value)
    }
}

/// Flat mapping from metric identifier to its unit series for one company.
///
/// Built once per load and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricIndex(BTreeMap<String, UnitSeries>);

impl MetricIndex {
    /// Creates an empty index.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Number of metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the company has no metrics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if the metric is present.
    #[must_use]
    pub fn contains(&self, metric: &str) -> bool {
        self.0.contains_key(metric)
    }

    /// Metric identifiers in ascending order.
    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Unit series for a metric.
    #[must_use]
    pub fn get(&self, metric: &str) -> Option<&UnitSeries> {
        self.0.get(metric)
    }

    /// Observations for a metric in one unit; empty if either is absent.
    #[must_use]
    pub fn series(&self, metric: &str, unit: &str) -> &[Observation] {
        self.0
            .get(metric)
            .and_then(|units| units.get(unit))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl FromIterator<(String, UnitSeries)> for MetricIndex {
    fn from_iter<I: IntoIterator<Item = (String, UnitSeries)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Flat mapping from metric identifier to description for one company.
///
/// Only metrics whose entry carried a description or label appear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptions(BTreeMap<String, String>);

impl Descriptions {
    /// Creates an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Description for a metric.
    #[must_use]
    pub fn get(&self, metric: &str) -> Option<&str> {
        self.0.get(metric).map(String::as_str)
    }

    /// Number of described metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is described.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Descriptions {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One company's observations for a single metric and unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanySeries {
    /// Company name; becomes the value column name in the aligned table.
    pub company: String,
    /// Observations in document order.
    pub observations: Vec<Observation>,
}

impl CompanySeries {
    /// Creates a series for a company.
    #[must_use]
    pub fn new(company: impl Into<String>, observations: Vec<Observation>) -> Self {
        Self {
            company: company.into(),
            observations,
        }
    }
}
