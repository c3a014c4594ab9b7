//! Chart hand-off for the rendering layer.
//!
//! A [`ChartSpec`] bundles an aligned table with titles and the chart kind.
//! It can be exported as CSV or as a Vega-Lite specification so any external
//! charting tool can draw one series per company against the date axis.

use facts_core::{AlignedTable, FactsError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

use crate::config::CompareConfig;

/// Vega-Lite schema URL.
const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Fill opacity for area charts, so overlapping companies stay visible.
const AREA_OPACITY: f64 = 0.4;

/// How each company's series is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// One line per company.
    #[default]
    Line,
    /// One translucent filled area per company, not stacked.
    Area,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line => write!(f, "line"),
            Self::Area => write!(f, "area"),
        }
    }
}

impl FromStr for ChartKind {
    type Err = FactsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "line" => Ok(Self::Line),
            "area" => Ok(Self::Area),
            other => Err(FactsError::InvalidParameter(format!(
                "Unknown chart kind: {}",
                other
            ))),
        }
    }
}

/// Everything a renderer needs to draw a comparison.
#[derive(Debug, Clone)]
pub struct ChartSpec<'a> {
    /// Chart title, `Comparison of <metric>`.
    pub title: String,
    /// X axis label.
    pub x_label: String,
    /// Y axis label, `Value (<unit>)`.
    pub y_label: String,
    /// Line or area.
    pub kind: ChartKind,
    /// The aligned data.
    pub table: &'a AlignedTable,
}

impl<'a> ChartSpec<'a> {
    /// Builds the chart for a metric using the configured unit and chart kind.
    #[must_use]
    pub fn new(metric: &str, table: &'a AlignedTable, config: &CompareConfig) -> Self {
        Self {
            title: format!("Comparison of {}", metric),
            x_label: "Date".to_string(),
            y_label: format!("Value ({})", config.unit),
            kind: config.chart,
            table,
        }
    }

    /// Overrides the chart kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: ChartKind) -> Self {
        self.kind = kind;
        self
    }

    /// Long-format rows: one `{date, company, value}` object per point.
    #[must_use]
    pub fn rows(&self) -> Vec<Value> {
        let dates = self.table.dates();
        self.table
            .companies()
            .filter_map(|company| Some((company, self.table.values(company)?)))
            .flat_map(|(company, values)| {
                dates.iter().zip(values).map(move |(date, value)| {
                    json!({
                        "date": date.to_string(),
                        "company": company,
                        "value": value,
                    })
                })
            })
            .collect()
    }

    /// Vega-Lite specification of the chart.
    #[must_use]
    pub fn to_vega_lite(&self) -> Value {
        let mark = match self.kind {
            ChartKind::Line => json!({"type": "line", "point": true}),
            ChartKind::Area => json!({"type": "area", "opacity": AREA_OPACITY}),
        };

        let mut y = json!({
            "field": "value",
            "type": "quantitative",
            "title": self.y_label,
        });
        if self.kind == ChartKind::Area {
            y["stack"] = Value::Null;
        }

        json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": self.title,
            "data": {"values": self.rows()},
            "mark": mark,
            "encoding": {
                "x": {"field": "date", "type": "temporal", "title": self.x_label},
                "y": y,
                "color": {"field": "company", "type": "nominal", "title": "Company"},
            },
        })
    }

    /// The aligned table as CSV with a header row.
    pub fn to_csv(&self) -> Result<String> {
        let mut frame = self.table.frame().clone();
        let mut buffer = Vec::new();
        CsvWriter::new(&mut buffer)
            .include_header(true)
            .finish(&mut frame)?;
        String::from_utf8(buffer).map_err(|e| FactsError::Other(e.to_string()))
    }
}
