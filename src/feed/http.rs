use super::rate_limit::RequestLimiter;
use super::retry::RetryPolicy;
use super::FeedStats;
use crate::config::ProviderConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Rate-limited, retrying GET client shared by both provider feeds.
pub struct FeedHttp {
    client: Client,
    name: &'static str,
    limiter: RequestLimiter,
    retry: RetryPolicy,
    requests: AtomicU64,
    failures: AtomicU64,
    throttled: AtomicU64,
    matches: AtomicU64,
    last_success: Mutex<Option<DateTime<Utc>>>,
}

impl FeedHttp {
    pub fn new(name: &'static str, config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .with_context(|| format!("failed to build {} http client", name))?;

        Ok(Self {
            client,
            name,
            limiter: RequestLimiter::per_minute(config.rate_limit_per_minute, config.burst),
            retry: RetryPolicy::new(config.max_attempts, Duration::from_millis(config.backoff_ms)),
            requests: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            throttled: AtomicU64::new(0),
            matches: AtomicU64::new(0),
            last_success: Mutex::new(None),
        })
    }

    /// Wait until the limiter grants a request.
    async fn throttle(&self) {
        loop {
            match self.limiter.check() {
                Ok(()) => return,
                Err(wait) => {
                    self.throttled.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(provider = self.name, wait_ms = wait.as_millis() as u64, "rate limit wait");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    async fn get_once(&self, url: &str, headers: &[(&str, String)]) -> Result<String> {
        self.throttle().await;
        self.requests.fetch_add(1, Ordering::Relaxed);

        let mut req = self.client.get(url);
        for (name, value) in headers {
            req = req.header(*name, value.as_str());
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("{} request failed", self.name))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("{} HTTP error ({}): {}", self.name, status, truncate(&body, 200));
        }
        resp.text()
            .await
            .with_context(|| format!("{} response read failed", self.name))
    }

    /// GET `url` as text, honouring the rate limit and retry policy.
    pub async fn get_text(&self, url: &str, headers: &[(&str, String)]) -> Result<String> {
        let result = self
            .retry
            .run(self.name, |_| self.get_once(url, headers))
            .await;
        match &result {
            Ok(_) => {
                *self.last_success.lock().unwrap_or_else(|e| e.into_inner()) = Some(Utc::now());
            }
            Err(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    pub fn record_matches(&self, n: usize) {
        self.matches.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn stats(&self) -> FeedStats {
        FeedStats {
            requests: self.requests.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            last_success: *self.last_success.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
