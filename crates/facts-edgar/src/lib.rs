#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gaap-compare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! HTTP fact source for SEC EDGAR company facts documents.
//!
//! This crate provides [`HttpFactSource`], which fetches company facts JSON
//! over HTTP GET from either the SEC EDGAR companyfacts API or any mirror
//! serving documents of the same shape (e.g. raw files in a Git repository).
//!
//! # Example
//!
//! ```no_run
//! use facts_core::{FactSource, extract};
//! use facts_edgar::{HttpFactSource, company_facts_url};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = HttpFactSource::new("MyApp/1.0 (contact@example.com)")?;
//!
//!     let doc = source.fetch_document(&company_facts_url("37996")).await?;
//!     let (metrics, descriptions) = extract(&doc);
//!     println!("{} metrics, {} described", metrics.len(), descriptions.len());
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use facts_core::{FactSource, FactsError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// SEC EDGAR API base URL
pub const EDGAR_BASE_URL: &str = "https://data.sec.gov";

/// Default rate limit: 10 requests per second (SEC requirement)
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the companyfacts URL for a CIK, zero-padding it to 10 digits.
///
/// # Example
/// ```
/// assert_eq!(
///     facts_edgar::company_facts_url("37996"),
///     "https://data.sec.gov/api/xbrl/companyfacts/CIK0000037996.json"
/// );
/// ```
#[must_use]
pub fn company_facts_url(cik: &str) -> String {
    let cik_padded = format!("{:0>10}", cik.trim());
    format!(
        "{}/api/xbrl/companyfacts/CIK{}.json",
        EDGAR_BASE_URL, cik_padded
    )
}

/// Rate limiter to ensure we don't exceed SEC's rate limits
#[derive(Debug)]
struct RateLimiter {
    last_request: Option<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    const fn new(min_interval: Duration) -> Self {
        Self {
            last_request: None,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// HTTP fact source.
///
/// Issues one GET per document with an identifying user agent, and spaces
/// requests to stay under the SEC limit of 10 requests per second.
#[derive(Debug)]
pub struct HttpFactSource {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl HttpFactSource {
    /// Create a new source with the specified user agent and the default timeout.
    ///
    /// The SEC requires identifying user agent headers. Format should be:
    /// "AppName/Version (contact@email.com)"
    ///
    /// # Example
    /// ```
    /// use facts_edgar::HttpFactSource;
    ///
    /// let source = HttpFactSource::new("MyApp/1.0 (contact@example.com)").unwrap();
    /// ```
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_timeout(user_agent, DEFAULT_TIMEOUT)
    }

    /// Create a new source with a custom request timeout.
    pub fn with_timeout(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| FactsError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client))
    }

    /// Create a new source with a pre-configured HTTP client.
    ///
    /// # Example
    /// ```
    /// use facts_edgar::HttpFactSource;
    /// use std::time::Duration;
    ///
    /// let client = reqwest::Client::builder()
    ///     .timeout(Duration::from_secs(60))
    ///     .user_agent("MyApp/1.0 (contact@example.com)")
    ///     .build()
    ///     .unwrap();
    ///
    /// let source = HttpFactSource::with_client(client);
    /// ```
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_RATE_LIMIT))),
        }
    }
}

#[async_trait]
impl FactSource for HttpFactSource {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        if location.is_empty() {
            return Err(FactsError::InvalidParameter("Empty location".to_string()));
        }

        // Rate limit
        self.rate_limiter.lock().await.wait().await;

        debug!("Fetching company facts from {}", location);
        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| FactsError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FactsError::Network(format!(
                "Failed to fetch company facts from {}: HTTP {}",
                location,
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FactsError::Network(format!("Failed to read response body: {}", e)))?;

        debug!(bytes = body.len(), "Fetched company facts");
        Ok(body.to_vec())
    }
}
