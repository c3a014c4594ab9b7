//! Fact source abstraction.
//!
//! A [`FactSource`] retrieves the raw body of a company facts document from a
//! location (a URL for HTTP sources). Parsing and extraction happen in the
//! caller so every source shares the same degrade-to-empty policy.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use tracing::trace;

use crate::error::{FactsError, Result};
use crate::types::FactDocument;

/// Retrieves raw company facts documents.
#[async_trait]
pub trait FactSource: Send + Sync + Debug {
    /// Returns the name of this source (e.g., "SEC EDGAR").
    fn name(&self) -> &str;

    /// Fetches the raw JSON body stored at `location`.
    async fn fetch(&self, location: &str) -> Result<Vec<u8>>;

    /// Fetches and parses the document stored at `location`.
    async fn fetch_document(&self, location: &str) -> Result<FactDocument> {
        let body = self.fetch(location).await?;
        FactDocument::from_slice(&body)
    }
}

/// Fact source backed by an in-memory map from location to body.
///
/// Useful for offline use and for driving the comparison layer in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    documents: HashMap<String, Vec<u8>>,
}

impl InMemorySource {
    /// Create a new empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a body under a location.
    #[must_use]
    pub fn with_document(mut self, location: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(location, body);
        self
    }

    /// Stores a body under a location, replacing any previous one.
    pub fn insert(&mut self, location: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.documents.insert(location.into(), body.into());
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl FactSource for InMemorySource {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        match self.documents.get(location) {
            Some(body) => {
                trace!(location = %location, bytes = body.len(), "In-memory hit");
                Ok(body.clone())
            }
            None => Err(FactsError::Network(format!(
                "No document stored at {}",
                location
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_fetch_document() {
        let source = InMemorySource::new().with_document(
            "mem://ford",
            r#"{"entityName": "FORD MOTOR CO", "facts": {"us-gaap": {}}}"#,
        );

        let doc = source.fetch_document("mem://ford").await.unwrap();
        assert_eq!(doc.entity_name.as_deref(), Some("FORD MOTOR CO"));
        assert_eq!(source.len(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_missing_location() {
        let source = InMemorySource::new();
        let err = source.fetch("mem://nowhere").await.unwrap_err();
        assert!(matches!(err, FactsError::Network(_)));
    }

    #[tokio::test]
    async fn test_invalid_body_is_parse_error() {
        let source = InMemorySource::new().with_document("mem://bad", "<html>");
        let err = source.fetch_document("mem://bad").await.unwrap_err();
        assert!(matches!(err, FactsError::Parse(_)));
    }
}
