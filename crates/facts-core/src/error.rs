//! Error types for fact loading and comparison.
//!
//! This module defines [`FactsError`]. Data problems inside a company's
//! document are not errors: they degrade to empty results. The variants here
//! cover transport, parse, configuration and dataframe engine failures.

use thiserror::Error;

/// Errors that can occur while fetching, parsing or comparing company facts.
#[derive(Error, Debug)]
pub enum FactsError {
    /// Network-related errors (connection failures, timeouts, HTTP status).
    #[error("Network error: {0}")]
    Network(String),

    /// The body could not be parsed as a company facts document.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The requested company is not in the catalog.
    #[error("Unknown company: {0}")]
    UnknownCompany(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The company catalog or comparison configuration is malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Polars DataFrame error.
    #[error("DataFrame error: {0}")]
    Frame(#[from] polars::error::PolarsError),

    /// I/O error while reading configuration or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using [`FactsError`].
pub type Result<T> = std::result::Result<T, FactsError>;
