pub mod http;
pub mod iscj;
pub mod normalize;
pub mod rate_limit;
pub mod retry;
pub mod sports;
pub mod types;
pub mod xbet;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sports::Sport;
use types::{DataSource, MatchRecord};

/// A provider of normalized match records.
///
/// `fetch_matches` returns `Err` only for transient upstream failures
/// (timeout, connection, non-200, undecodable body). Individual malformed
/// matches are dropped inside the adapter and never surface as errors.
#[async_trait]
pub trait MatchFeed: Send + Sync {
    fn source(&self) -> DataSource;
    async fn fetch_matches(&self, sport: &'static Sport) -> Result<Vec<MatchRecord>>;
    async fn list_sports(&self) -> Result<Vec<SportListing>>;
    fn stats(&self) -> FeedStats;
}

/// One entry of a provider's sports listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SportListing {
    pub provider_id: u32,
    pub name: String,
    /// Catalog key when the provider id is known.
    pub key: Option<&'static str>,
    pub match_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedStats {
    pub requests: u64,
    pub failures: u64,
    /// Times a request had to wait for the rate limiter.
    pub throttled: u64,
    pub matches: u64,
    pub last_success: Option<DateTime<Utc>>,
}
