//! Taxonomy extraction.
//!
//! Flattens a company's `facts.us-gaap` block into a [`MetricIndex`] and a
//! parallel [`Descriptions`] mapping.

use tracing::debug;

use crate::types::{Descriptions, FactDocument, FactEntry, MetricIndex};

/// Extracts the US GAAP metric index and descriptions from a document.
///
/// A document missing `facts` or `us-gaap` yields two empty mappings. Tags
/// without `units` are left out of the index but still contribute a
/// description when they carry one. Tags that are not objects are skipped.
/// Observation values are not validated here.
#[must_use]
pub fn extract(document: &FactDocument) -> (MetricIndex, Descriptions) {
    let Some(us_gaap) = document.us_gaap() else {
        debug!("Document has no facts.us-gaap block");
        return (MetricIndex::new(), Descriptions::new());
    };

    let mut values = Vec::with_capacity(us_gaap.len());
    let mut descriptions = Vec::new();
    let mut skipped = 0usize;

    for (tag, raw) in us_gaap {
        let Some(entry) = FactEntry::from_value(raw) else {
            skipped += 1;
            continue;
        };

        if let Some(text) = entry.display_description() {
            descriptions.push((tag.clone(), text.to_string()));
        }
        if let Some(units) = entry.units {
            values.push((tag.clone(), units));
        }
    }

    debug!(
        metrics = values.len(),
        described = descriptions.len(),
        skipped,
        "Extracted us-gaap facts"
    );

    (
        values.into_iter().collect(),
        descriptions.into_iter().collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: serde_json::Value) -> FactDocument {
        FactDocument::from_slice(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_missing_facts_yields_empty() {
        let (values, descriptions) = extract(&document(json!({"entityName": "Canoo"})));
        assert!(values.is_empty());
        assert!(descriptions.is_empty());
    }

    #[test]
    fn test_missing_us_gaap_yields_empty() {
        let (values, descriptions) = extract(&document(json!({
            "facts": {"dei": {"EntityCommonStockSharesOutstanding": {"units": {}}}}
        })));
        assert!(values.is_empty());
        assert!(descriptions.is_empty());
    }

    #[test]
    fn test_null_us_gaap_yields_empty() {
        let (values, _) = extract(&document(json!({"facts": {"us-gaap": null}})));
        assert!(values.is_empty());
    }

    #[test]
    fn test_extracts_units_and_descriptions() {
        let doc = document(json!({
            "facts": {"us-gaap": {
                "Revenues": {
                    "label": "Revenues",
                    "description": "Amount of revenue recognized.",
                    "units": {"USD": [
                        {"end": "2022-12-31", "val": 158057000000_i64, "form": "10-K"},
                        {"end": "2023-12-31", "val": 176191000000_i64, "form": "10-K"}
                    ]}
                },
                "Assets": {
                    "label": "Assets",
                    "units": {"USD": [{"end": "2023-12-31", "val": 273310000000_i64}]}
                },
                "DescribedOnly": {"description": "No units reported."},
                "Broken": 17
            }}
        }));

        let (values, descriptions) = extract(&doc);

        assert_eq!(values.metrics().collect::<Vec<_>>(), vec!["Assets", "Revenues"]);
        assert_eq!(values.series("Revenues", "USD").len(), 2);
        assert_eq!(
            descriptions.get("Revenues"),
            Some("Amount of revenue recognized.")
        );
        assert_eq!(descriptions.get("Assets"), Some("Assets"));
        assert_eq!(descriptions.get("DescribedOnly"), Some("No units reported."));
        assert!(!values.contains("DescribedOnly"));
        assert!(!values.contains("Broken"));
    }

    #[test]
    fn test_values_pass_through_unvalidated() {
        let doc = document(json!({
            "facts": {"us-gaap": {"Revenues": {"units": {"USD": [
                {"end": "2023-12-31", "val": "n/a"},
                {"val": 5}
            ]}}}}
        }));

        let (values, descriptions) = extract(&doc);
        let series = values.series("Revenues", "USD");

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].value(), None);
        assert_eq!(series[1].end, None);
        assert!(descriptions.is_empty());
    }

    #[test]
    fn test_malformed_description_keeps_units() {
        let doc = document(json!({
            "facts": {"us-gaap": {
                "Revenues": {
                    "description": 7,
                    "units": {"USD": [{"end": "2023-12-31", "val": 100}]}
                },
                "Assets": {
                    "label": "Assets",
                    "units": {"USD": "not a list"}
                }
            }}
        }));

        let (values, descriptions) = extract(&doc);

        assert!(values.contains("Revenues"));
        assert_eq!(values.series("Revenues", "USD").len(), 1);
        assert_eq!(descriptions.get("Revenues"), None);
        assert!(values.contains("Assets"));
        assert!(values.series("Assets", "USD").is_empty());
        assert_eq!(descriptions.get("Assets"), Some("Assets"));
    }
}
