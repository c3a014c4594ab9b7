//! Date alignment of per-company metric series.
//!
//! [`align`] turns one observation series per company into a single
//! [`AlignedTable`] keyed by period end, keeping only the dates every
//! participating company reported.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::error::{FactsError, Result};
use crate::types::{CompanySeries, Observation};

/// Name of the period-end key column.
pub const DATE_COLUMN: &str = "end";

/// `NaiveDate::num_days_from_ce` of 1970-01-01, the origin of polars dates.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A company's value column in an [`AlignedTable`].
#[derive(Debug, Clone, PartialEq)]
struct AlignedColumn {
    company: String,
    column: String,
    values: Vec<f64>,
}

/// Period-end keyed table with one value column per company.
///
/// Rows are sorted by date ascending and every date is unique. A company is
/// addressed by its name through [`AlignedTable::values`]; the underlying
/// column name only differs from the company name when the name would clash.
#[derive(Debug, Clone)]
pub struct AlignedTable {
    frame: DataFrame,
    dates: Vec<NaiveDate>,
    columns: Vec<AlignedColumn>,
    skipped: Vec<String>,
}

impl AlignedTable {
    fn empty(skipped: Vec<String>) -> Self {
        Self {
            frame: DataFrame::empty(),
            dates: Vec::new(),
            columns: Vec::new(),
            skipped,
        }
    }

    /// The joined frame: `end` (Date) followed by one f64 column per company.
    #[must_use]
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of aligned dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns true if no date is common to every participating company.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Aligned period-end dates, ascending.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Companies that contributed a column, in join order.
    pub fn companies(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.company.as_str())
    }

    /// Values for a company, parallel to [`AlignedTable::dates`].
    #[must_use]
    pub fn values(&self, company: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.company == company)
            .map(|c| c.values.as_slice())
    }

    /// Frame column name holding a company's values.
    #[must_use]
    pub fn column_name(&self, company: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.company == company)
            .map(|c| c.column.as_str())
    }

    /// Companies left out because their series had no `end` field at all.
    #[must_use]
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

impl PartialEq for AlignedTable {
    fn eq(&self, other: &Self) -> bool {
        self.dates == other.dates
            && self.columns == other.columns
            && self.skipped == other.skipped
            && self.frame.equals(&other.frame)
    }
}

/// Aligns per-company series on exact period-end equality.
///
/// Series are joined one at a time into a running inner join, so a date
/// survives only if every participating company reported it. A series in
/// which no observation carries `end` is skipped and listed in
/// [`AlignedTable::skipped`]. Observations whose `end` is not a calendar
/// date or whose `val` is not numeric are dropped. When a company reports the
/// same period end more than once the last observation wins. Later duplicates
/// of a company name are ignored.
///
/// A single usable series passes through unchanged (apart from the drops
/// above); no usable series yields an empty table.
pub fn align(series: &[CompanySeries]) -> Result<AlignedTable> {
    let mut taken: HashSet<String> = HashSet::from([DATE_COLUMN.to_string()]);
    let mut companies: HashSet<&str> = HashSet::new();
    let mut columns: Vec<(String, String)> = Vec::with_capacity(series.len());
    let mut skipped = Vec::new();
    let mut joined: Option<LazyFrame> = None;

    for company_series in series {
        let company = company_series.company.as_str();

        if !companies.insert(company) {
            warn!(company = %company, "Duplicate company series ignored");
            continue;
        }

        if !company_series.observations.iter().any(|o| o.end.is_some()) {
            warn!(company = %company, "Series has no period end dates, skipping");
            skipped.push(company.to_string());
            continue;
        }

        let points = usable_points(&company_series.observations);
        let column = value_column_name(company, &taken);
        taken.insert(column.clone());

        debug!(
            company = %company,
            column = %column,
            points = points.len(),
            "Joining company series"
        );

        let frame = series_frame(&column, &points)?.lazy();
        joined = Some(match joined {
            Some(acc) => acc.join(
                frame,
                [col(DATE_COLUMN)],
                [col(DATE_COLUMN)],
                JoinArgs::new(JoinType::Inner),
            ),
            None => frame,
        });
        columns.push((company.to_string(), column));
    }

    let Some(joined) = joined else {
        debug!("No usable series to align");
        return Ok(AlignedTable::empty(skipped));
    };

    let frame = joined.sort([DATE_COLUMN], Default::default()).collect()?;

    let dates = column_dates(&frame, DATE_COLUMN)?;

    let columns = columns
        .into_iter()
        .map(|(company, column)| {
            let values = column_values(&frame, &column)?;
            Ok::<_, FactsError>(AlignedColumn {
                company,
                column,
                values,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(rows = dates.len(), companies = columns.len(), "Aligned series");

    Ok(AlignedTable {
        frame,
        dates,
        columns,
        skipped,
    })
}

/// Usable (date, value) points of a series; a repeated date keeps the last value.
fn usable_points(observations: &[Observation]) -> BTreeMap<NaiveDate, f64> {
    observations
        .iter()
        .filter_map(|o| Some((o.period_end()?, o.value()?)))
        .collect()
}

/// Picks a frame column name for a company that clashes with nothing taken.
///
/// The company name is used as is when free; otherwise the value column is
/// suffixed with the company name, then numbered.
fn value_column_name(company: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(company) {
        return company.to_string();
    }

    let base = format!("val_{}", company);
    if !taken.contains(&base) {
        return base;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Reads a joined date column back; a null is an error since every row came
/// from a usable point.
fn column_dates(frame: &DataFrame, column: &str) -> Result<Vec<NaiveDate>> {
    frame
        .column(column)?
        .cast(&DataType::Int32)?
        .as_materialized_series()
        .i32()?
        .into_iter()
        .map(|days| {
            days.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE))
                .ok_or_else(|| unexpected_null(column))
        })
        .collect()
}

/// Reads a joined value column back; a null is an error since the inner join
/// only keeps rows present in every series.
fn column_values(frame: &DataFrame, column: &str) -> Result<Vec<f64>> {
    frame
        .column(column)?
        .as_materialized_series()
        .f64()?
        .into_iter()
        .map(|value| value.ok_or_else(|| unexpected_null(column)))
        .collect()
}

fn unexpected_null(column: &str) -> FactsError {
    warn!(column = %column, "Null in aligned column");
    FactsError::Other(format!("Unexpected null in aligned column {}", column))
}

fn series_frame(column: &str, points: &BTreeMap<NaiveDate, f64>) -> Result<DataFrame> {
    let days: Vec<i32> = points
        .keys()
        .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    let values: Vec<f64> = points.values().copied().collect();

    let date_col = Column::new(DATE_COLUMN.into(), days).cast(&DataType::Date)?;

    Ok(DataFrame::new(vec![
        date_col,
        Column::new(column.into(), values),
    ])?)
}
