#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gaap-compare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types, extraction and alignment for US GAAP company facts.
//!
//! This crate provides the building blocks of a metric comparison:
//!
//! - [`FactSource`](source::FactSource) - Retrieves raw company facts documents
//! - [`extract`](extract::extract) - Flattens `facts.us-gaap` into a [`MetricIndex`]
//! - [`align`](align::align) - Date-keyed inner join of per-company series
//! - [`PeriodType`](frequency::PeriodType) - Filing form filter

/// Date alignment of per-company series.
pub mod align;
/// Error types for fact operations.
pub mod error;
/// Taxonomy extraction.
pub mod extract;
/// Filing period definitions.
pub mod frequency;
/// Fact source trait and the in-memory source.
pub mod source;
/// Core data types (FactDocument, Observation, MetricIndex, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use align::{AlignedTable, DATE_COLUMN, align};
pub use error::{FactsError, Result};
pub use extract::extract;
pub use frequency::PeriodType;
pub use source::{FactSource, InMemorySource};
pub use types::{
    CompanySeries, Descriptions, FactDocument, FactEntry, MetricIndex, Observation, UnitSeries,
};
