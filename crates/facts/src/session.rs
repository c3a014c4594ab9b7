//! Selection loading and metric comparison.
//!
//! [`Comparer`] loads the documents of a company selection through a
//! [`FactSource`]; the resulting [`Selection`] answers which metrics are
//! common to every company, which description to show, and produces the
//! [`Comparison`] for a chosen metric.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use facts_core::{
    AlignedTable, CompanySeries, Descriptions, FactSource, FactsError, MetricIndex, Result,
    align, extract,
};
use tracing::{debug, warn};

use crate::chart::ChartSpec;
use crate::config::{CompanyCatalog, CompareConfig, DescriptionSource};

/// Message shown when nothing is selected.
pub const NO_COMPANIES_MESSAGE: &str = "Please select at least one company.";

/// Message shown when the selected companies share no metric.
pub const NO_COMMON_METRIC_MESSAGE: &str =
    "No common US GAAP metrics found across the selected companies.";

/// Message shown when the join leaves no rows.
pub const NO_COMPARABLE_DATA_MESSAGE: &str = "No comparable data for this metric.";

/// Loads company selections through a fact source.
///
/// # Example
///
/// ```no_run
/// use facts::{Comparer, CompanyCatalog, HttpFactSource};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> facts::Result<()> {
/// let source = Arc::new(HttpFactSource::new("MyApp/1.0 (contact@example.com)")?);
/// let comparer = Comparer::new(source, CompanyCatalog::builtin());
///
/// let selection = comparer.load(&["Ford", "GM"]).await?;
/// for metric in selection.common_metrics() {
///     println!("{}", metric);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Comparer {
    source: Arc<dyn FactSource>,
    catalog: CompanyCatalog,
    config: CompareConfig,
}

impl Comparer {
    /// Create a comparer with the default configuration.
    #[must_use]
    pub fn new(source: Arc<dyn FactSource>, catalog: CompanyCatalog) -> Self {
        Self {
            source,
            catalog,
            config: CompareConfig::default(),
        }
    }

    /// Set the comparison configuration.
    #[must_use]
    pub fn with_config(mut self, config: CompareConfig) -> Self {
        self.config = config;
        self
    }

    /// The company catalog.
    #[must_use]
    pub const fn catalog(&self) -> &CompanyCatalog {
        &self.catalog
    }

    /// The comparison configuration.
    #[must_use]
    pub const fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Fetches and extracts every selected company, one after another.
    ///
    /// Fails only if a name is not in the catalog. A company whose document
    /// cannot be fetched or parsed is kept with an empty index and its
    /// failure recorded. Repeated names are loaded once.
    pub async fn load<S: AsRef<str>>(&self, selection: &[S]) -> Result<Selection> {
        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(selection.len());

        for name in selection {
            let name: &str = name.as_ref();
            if !seen.insert(name) {
                debug!(company = %name, "Company selected twice, loading once");
                continue;
            }
            let location = self
                .catalog
                .location(name)
                .ok_or_else(|| FactsError::UnknownCompany(name.to_string()))?;
            targets.push((name, location));
        }

        let mut companies = Vec::with_capacity(targets.len());
        for (name, location) in targets {
            companies.push(self.load_company(name, &location).await);
        }

        Ok(Selection {
            companies,
            config: self.config.clone(),
        })
    }

    async fn load_company(&self, name: &str, location: &str) -> LoadedCompany {
        debug!(company = %name, source = self.source.name(), "Loading company facts");

        match self.source.fetch_document(location).await {
            Ok(document) => {
                let (metrics, descriptions) = extract(&document);
                debug!(company = %name, metrics = metrics.len(), "Loaded company facts");
                LoadedCompany {
                    name: name.to_string(),
                    metrics,
                    descriptions,
                    failure: None,
                }
            }
            Err(e) => {
                warn!(company = %name, error = %e, "Failed to load company facts");
                LoadedCompany {
                    name: name.to_string(),
                    metrics: MetricIndex::new(),
                    descriptions: Descriptions::new(),
                    failure: Some(e.to_string()),
                }
            }
        }
    }
}

/// One selected company's extracted facts.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCompany {
    /// Company name.
    pub name: String,
    /// Metric index; empty if loading failed.
    pub metrics: MetricIndex,
    /// Metric descriptions.
    pub descriptions: Descriptions,
    /// Why loading failed, if it did.
    pub failure: Option<String>,
}

/// The loaded companies of one selection, in selection order.
#[derive(Debug, Clone)]
pub struct Selection {
    companies: Vec<LoadedCompany>,
    config: CompareConfig,
}

impl Selection {
    /// Builds a selection from already loaded companies.
    #[must_use]
    pub const fn from_companies(companies: Vec<LoadedCompany>, config: CompareConfig) -> Self {
        Self { companies, config }
    }

    /// Loaded companies in selection order.
    #[must_use]
    pub fn companies(&self) -> &[LoadedCompany] {
        &self.companies
    }

    /// Returns true if nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    /// The configuration this selection compares with.
    #[must_use]
    pub const fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Companies that failed to load, with the reason.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.companies
            .iter()
            .filter_map(|c| Some((c.name.as_str(), c.failure.as_deref()?)))
    }

    /// Metrics present in every selected company's index, sorted.
    #[must_use]
    pub fn common_metrics(&self) -> Vec<&str> {
        let Some((first, rest)) = self.companies.split_first() else {
            return Vec::new();
        };

        let common: BTreeSet<&str> = first
            .metrics
            .metrics()
            .filter(|metric| rest.iter().all(|c| c.metrics.contains(metric)))
            .collect();

        common.into_iter().collect()
    }

    /// Returns true if every selected company reports the metric.
    #[must_use]
    pub fn is_common(&self, metric: &str) -> bool {
        !self.companies.is_empty() && self.companies.iter().all(|c| c.metrics.contains(metric))
    }

    /// Description of a metric according to the configured policy.
    #[must_use]
    pub fn description(&self, metric: &str) -> String {
        let first = || self.companies.first()?.descriptions.get(metric);

        let found = match &self.config.description_source {
            DescriptionSource::FirstSelected => first(),
            DescriptionSource::FirstAvailable => self
                .companies
                .iter()
                .find_map(|c| c.descriptions.get(metric)),
            DescriptionSource::Company(name) => {
                match self.companies.iter().find(|c| &c.name == name) {
                    Some(company) => company.descriptions.get(metric),
                    None => first(),
                }
            }
        };

        found
            .unwrap_or(self.config.default_description.as_str())
            .to_string()
    }

    /// Each reporting company's observations for a metric in the configured
    /// unit, narrowed to the configured period type.
    ///
    /// Companies without the metric are left out; a company without the unit
    /// gets an empty series.
    #[must_use]
    pub fn series(&self, metric: &str) -> Vec<CompanySeries> {
        self.companies
            .iter()
            .filter(|c| c.metrics.contains(metric))
            .map(|c| {
                let observations = c
                    .metrics
                    .series(metric, &self.config.unit)
                    .iter()
                    .filter(|o| self.config.period.is_none_or(|p| p.matches(o)))
                    .cloned()
                    .collect();
                CompanySeries::new(c.name.clone(), observations)
            })
            .collect()
    }

    /// Compares a metric across the selection.
    ///
    /// Every non-chart state is reported as a [`Comparison`] variant; errors
    /// come only from the dataframe engine.
    pub fn compare(&self, metric: &str) -> Result<Comparison> {
        if self.companies.is_empty() {
            return Ok(Comparison::NoCompanies);
        }
        if self.common_metrics().is_empty() {
            return Ok(Comparison::NoCommonMetric);
        }
        if !self.is_common(metric) {
            return Ok(Comparison::MetricNotCommon {
                metric: metric.to_string(),
            });
        }

        let description = self.description(metric);
        let table = align(&self.series(metric))?;

        if table.is_empty() {
            debug!(metric = %metric, "No dates common to all companies");
            return Ok(Comparison::NoComparableData {
                metric: metric.to_string(),
                description,
            });
        }

        Ok(Comparison::Ready(ComparisonView {
            metric: metric.to_string(),
            description,
            config: self.config.clone(),
            table,
        }))
    }
}

/// Outcome of comparing a metric.
#[derive(Debug, Clone)]
pub enum Comparison {
    /// No company was selected.
    NoCompanies,
    /// The selected companies share no metric.
    NoCommonMetric,
    /// The requested metric is not reported by every selected company.
    MetricNotCommon {
        /// The requested metric.
        metric: String,
    },
    /// The join left no rows; the chart is omitted.
    NoComparableData {
        /// The requested metric.
        metric: String,
        /// Its description.
        description: String,
    },
    /// Data to chart.
    Ready(ComparisonView),
}

impl Comparison {
    /// User-facing explanation for every state without a chart.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::NoCompanies => Some(NO_COMPANIES_MESSAGE.to_string()),
            Self::NoCommonMetric => Some(NO_COMMON_METRIC_MESSAGE.to_string()),
            Self::MetricNotCommon { metric } => Some(format!(
                "Metric {} is not reported by every selected company.",
                metric
            )),
            Self::NoComparableData { .. } => Some(NO_COMPARABLE_DATA_MESSAGE.to_string()),
            Self::Ready(_) => None,
        }
    }

    /// The chartable view, if any.
    #[must_use]
    pub const fn view(&self) -> Option<&ComparisonView> {
        match self {
            Self::Ready(view) => Some(view),
            _ => None,
        }
    }
}

/// A metric aligned across the selection.
#[derive(Debug, Clone)]
pub struct ComparisonView {
    /// The compared metric.
    pub metric: String,
    /// Description per the configured policy.
    pub description: String,
    /// Configuration used.
    pub config: CompareConfig,
    /// Aligned values.
    pub table: AlignedTable,
}

impl ComparisonView {
    /// Chart hand-off using the configured chart kind.
    #[must_use]
    pub fn chart(&self) -> ChartSpec<'_> {
        ChartSpec::new(&self.metric, &self.table, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;
    use approx::assert_relative_eq;
    use facts_core::{InMemorySource, PeriodType};
    use serde_json::json;

    fn doc(entries: serde_json::Value) -> String {
        json!({"entityName": "TEST", "facts": {"us-gaap": entries}}).to_string()
    }

    fn catalog() -> CompanyCatalog {
        CompanyCatalog::new()
            .with_url("A", "mem://a")
            .with_url("B", "mem://b")
            .with_url("C", "mem://c")
            .with_url("Broken", "mem://broken")
            .with_url("Missing", "mem://missing")
    }

    fn source() -> InMemorySource {
        InMemorySource::new()
            .with_document(
                "mem://a",
                doc(json!({
                    "Revenues": {
                        "label": "Revenues",
                        "description": "Revenue as described by A.",
                        "units": {"USD": [
                            {"end": "2020-03-31", "val": 10, "form": "10-Q"},
                            {"end": "2020-06-30", "val": 11, "form": "10-Q"},
                            {"end": "2020-12-31", "val": 40, "form": "10-K"}
                        ]}
                    },
                    "Assets": {"units": {"USD": [{"end": "2020-12-31", "val": 100}]}},
                    "OnlyA": {"units": {"USD": [{"end": "2020-12-31", "val": 1}]}}
                })),
            )
            .with_document(
                "mem://b",
                doc(json!({
                    "Revenues": {
                        "description": "Revenue as described by B.",
                        "units": {"USD": [
                            {"end": "2020-03-31", "val": 20, "form": "10-Q"},
                            {"end": "2020-06-30", "val": 21, "form": "10-Q"},
                            {"end": "2020-12-31", "val": 80, "form": "10-K"}
                        ]}
                    },
                    "Assets": {
                        "label": "Assets (B)",
                        "units": {"USD": [{"end": "2021-12-31", "val": 200}]}
                    }
                })),
            )
            .with_document(
                "mem://c",
                doc(json!({
                    "Revenues": {"units": {"EUR": [{"end": "2020-03-31", "val": 5}]}},
                    "Assets": {"units": {"USD": [{"end": "2020-12-31", "val": 300}]}}
                })),
            )
            .with_document("mem://broken", "{not json")
    }

    fn comparer() -> Comparer {
        Comparer::new(Arc::new(source()), catalog())
    }

    #[tokio::test]
    async fn test_unknown_company_is_error() {
        let err = comparer().load(&["A", "Toyota"]).await.unwrap_err();
        assert!(matches!(err, FactsError::UnknownCompany(name) if name == "Toyota"));
    }

    #[tokio::test]
    async fn test_empty_selection() {
        let selection = comparer().load::<&str>(&[]).await.unwrap();
        assert!(selection.is_empty());
        assert!(selection.common_metrics().is_empty());

        let outcome = selection.compare("Revenues").unwrap();
        assert!(matches!(outcome, Comparison::NoCompanies));
        assert_eq!(outcome.message().as_deref(), Some(NO_COMPANIES_MESSAGE));
    }

    #[tokio::test]
    async fn test_common_metrics_intersection() {
        let selection = comparer().load(&["A", "B"]).await.unwrap();
        assert_eq!(selection.common_metrics(), vec!["Assets", "Revenues"]);
        assert!(!selection.is_common("OnlyA"));
    }

    #[tokio::test]
    async fn test_identical_metric_sets_intersect_to_each_set() {
        let selection = comparer().load(&["A", "A"]).await.unwrap();
        assert_eq!(selection.companies().len(), 1);

        let same = Selection::from_companies(
            vec![selection.companies()[0].clone(), {
                let mut twin = selection.companies()[0].clone();
                twin.name = "A2".to_string();
                twin
            }],
            CompareConfig::new(),
        );
        let own: Vec<&str> = same.companies()[0].metrics.metrics().collect();
        assert_eq!(same.common_metrics(), own);
    }

    #[tokio::test]
    async fn test_failed_load_degrades_to_empty_index() {
        let selection = comparer().load(&["A", "Broken", "Missing"]).await.unwrap();

        let failures: Vec<&str> = selection.failures().map(|(name, _)| name).collect();
        assert_eq!(failures, vec!["Broken", "Missing"]);
        assert!(selection.companies()[1].metrics.is_empty());
        assert!(selection.common_metrics().is_empty());

        let outcome = selection.compare("Revenues").unwrap();
        assert!(matches!(outcome, Comparison::NoCommonMetric));
        assert_eq!(outcome.message().as_deref(), Some(NO_COMMON_METRIC_MESSAGE));
    }

    #[tokio::test]
    async fn test_compare_ready() {
        let selection = comparer().load(&["A", "B"]).await.unwrap();
        let outcome = selection.compare("Revenues").unwrap();

        let view = outcome.view().expect("chartable comparison");
        assert_eq!(view.description, "Revenue as described by A.");
        assert_eq!(view.table.len(), 3);
        assert_eq!(view.table.companies().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_relative_eq!(view.table.values("B").unwrap()[2], 80.0);
        assert_eq!(view.chart().title, "Comparison of Revenues");
        assert!(outcome.message().is_none());
    }

    #[tokio::test]
    async fn test_metric_not_common() {
        let selection = comparer().load(&["A", "B"]).await.unwrap();
        let outcome = selection.compare("OnlyA").unwrap();
        assert!(matches!(outcome, Comparison::MetricNotCommon { ref metric } if metric == "OnlyA"));
    }

    #[tokio::test]
    async fn test_no_comparable_dates() {
        let selection = comparer().load(&["A", "B"]).await.unwrap();
        let outcome = selection.compare("Assets").unwrap();

        match outcome {
            Comparison::NoComparableData { metric, description } => {
                assert_eq!(metric, "Assets");
                assert_eq!(description, "No description available");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_company_without_unit_is_skipped_from_table() {
        let selection = comparer().load(&["A", "C"]).await.unwrap();
        let outcome = selection.compare("Revenues").unwrap();

        let view = outcome.view().expect("A alone still charts");
        assert_eq!(view.table.skipped(), &["C".to_string()]);
        assert_eq!(view.table.companies().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(view.table.len(), 3);
    }

    #[tokio::test]
    async fn test_description_is_deterministic() {
        let config = CompareConfig::new();
        let a_first = comparer()
            .with_config(config.clone())
            .load(&["A", "B"])
            .await
            .unwrap();
        let b_first = comparer()
            .with_config(config)
            .load(&["B", "A"])
            .await
            .unwrap();

        for _ in 0..3 {
            assert_eq!(a_first.description("Revenues"), "Revenue as described by A.");
            assert_eq!(b_first.description("Revenues"), "Revenue as described by B.");
        }
        // Described by B only; the first selected company decides.
        assert_eq!(a_first.description("Assets"), "No description available");
        assert_eq!(b_first.description("Assets"), "Assets (B)");
    }

    #[tokio::test]
    async fn test_description_policies() {
        let first_available = comparer()
            .with_config(
                CompareConfig::new().with_description_source(DescriptionSource::FirstAvailable),
            )
            .load(&["A", "B"])
            .await
            .unwrap();
        assert_eq!(first_available.description("Assets"), "Assets (B)");

        let named = comparer()
            .with_config(CompareConfig::new().with_description_source(
                DescriptionSource::Company("B".to_string()),
            ))
            .load(&["A", "B"])
            .await
            .unwrap();
        assert_eq!(named.description("Revenues"), "Revenue as described by B.");

        let absent = comparer()
            .with_config(
                CompareConfig::new()
                    .with_description_source(DescriptionSource::Company("Z".to_string()))
                    .with_default_description("n/a"),
            )
            .load(&["A", "B"])
            .await
            .unwrap();
        assert_eq!(absent.description("Revenues"), "Revenue as described by A.");
        assert_eq!(absent.description("Assets"), "n/a");
    }

    #[tokio::test]
    async fn test_period_filter_narrows_series() {
        let selection = comparer()
            .with_config(
                CompareConfig::new()
                    .with_period(PeriodType::Annual)
                    .with_chart(ChartKind::Area),
            )
            .load(&["A", "B"])
            .await
            .unwrap();

        let series = selection.series("Revenues");
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].observations.len(), 1);

        let outcome = selection.compare("Revenues").unwrap();
        let view = outcome.view().unwrap();
        assert_eq!(view.table.len(), 1);
        assert_eq!(view.chart().kind, ChartKind::Area);
    }
}
