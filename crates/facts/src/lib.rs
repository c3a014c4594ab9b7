#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gaap-compare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Side-by-side comparison of US GAAP metrics across companies.
//!
//! This crate re-exports the core types and the HTTP source, and provides a
//! [`Comparer`] that loads a company selection, finds the metrics every
//! selected company reports, and aligns one of them by period end date.
//!
//! # Example
//!
//! ```no_run
//! use facts::{Comparer, CompanyCatalog, HttpFactSource};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> facts::Result<()> {
//!     let source = Arc::new(HttpFactSource::new("MyApp/1.0 (contact@example.com)")?);
//!     let comparer = Comparer::new(source, CompanyCatalog::builtin());
//!
//!     let selection = comparer.load(&["Ford", "GM", "Tesla"]).await?;
//!     let comparison = selection.compare("Revenues")?;
//!     match comparison.view() {
//!         Some(view) => println!("{}", view.table.frame()),
//!         None => println!("{}", comparison.message().unwrap_or_default()),
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use facts_core::*;

// Sources
pub use facts_edgar::{HttpFactSource, company_facts_url};

/// Chart hand-off.
pub mod chart;
/// Company catalog and comparison settings.
pub mod config;
mod session;

pub use chart::{ChartKind, ChartSpec};
pub use config::{
    CatalogEntry, CompanyCatalog, CompanyLocation, CompareConfig, DEFAULT_DESCRIPTION,
    DescriptionSource,
};
pub use session::{
    Comparer, Comparison, ComparisonView, LoadedCompany, NO_COMMON_METRIC_MESSAGE,
    NO_COMPANIES_MESSAGE, NO_COMPARABLE_DATA_MESSAGE, Selection,
};
