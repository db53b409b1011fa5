use crate::feed::sports::{self, SPORTS};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const ENV_FILE: &str = ".env";
const ENV_DB_PATH: &str = "MATCH_COLLECTOR_DB";
const ENV_INTERVAL: &str = "MATCH_COLLECTOR_INTERVAL_MIN";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub collector: CollectorConfig,
    pub xbet: ProviderConfig,
    pub iscj: ProviderConfig,
    pub sports: SportsConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collector: CollectorConfig::default(),
            xbet: ProviderConfig::xbet_default(),
            iscj: ProviderConfig::iscj_default(),
            sports: SportsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// On-disk shape. Provider sections are partial overrides of the
/// provider-specific defaults.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    collector: CollectorConfig,
    xbet: ProviderOverrides,
    iscj: ProviderOverrides,
    sports: SportsConfig,
    logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CollectorConfig {
    pub interval_minutes: u64,
    pub max_concurrent_fetches: usize,
    pub retention_days: u32,
    pub db_path: PathBuf,
    /// Pregame lines further ahead than this are ignored.
    pub horizon_days: u32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
            max_concurrent_fetches: 10,
            retention_days: 90,
            db_path: PathBuf::from("sports_data.db"),
            horizon_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub rate_limit_per_minute: u32,
    /// Token bucket capacity.
    pub burst: u32,
    /// 1 = single attempt, no retries.
    pub max_attempts: u32,
    pub backoff_ms: u64,
    /// Items requested per list call.
    pub count: u32,
}

impl ProviderConfig {
    pub fn xbet_default() -> Self {
        Self {
            base_url: "https://1xlite-86981.world/service-api".to_string(),
            request_timeout_ms: 10_000,
            rate_limit_per_minute: 45,
            burst: 5,
            max_attempts: 1,
            backoff_ms: 500,
            count: 50,
        }
    }

    pub fn iscj_default() -> Self {
        Self {
            base_url: "https://iscjxxqgmb.com/api".to_string(),
            request_timeout_ms: 30_000,
            rate_limit_per_minute: 50,
            burst: 5,
            max_attempts: 1,
            backoff_ms: 500,
            count: 250,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ProviderOverrides {
    base_url: Option<String>,
    request_timeout_ms: Option<u64>,
    rate_limit_per_minute: Option<u32>,
    burst: Option<u32>,
    max_attempts: Option<u32>,
    backoff_ms: Option<u64>,
    count: Option<u32>,
}

impl ProviderOverrides {
    fn over(self, base: ProviderConfig) -> ProviderConfig {
        ProviderConfig {
            base_url: self.base_url.unwrap_or(base.base_url),
            request_timeout_ms: self.request_timeout_ms.unwrap_or(base.request_timeout_ms),
            rate_limit_per_minute: self.rate_limit_per_minute.unwrap_or(base.rate_limit_per_minute),
            burst: self.burst.unwrap_or(base.burst),
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            backoff_ms: self.backoff_ms.unwrap_or(base.backoff_ms),
            count: self.count.unwrap_or(base.count),
        }
    }
}

/// `[sports]` toggles. Keys are catalog keys; hyphenated spellings
/// (`ice-hockey`) are accepted. Sports not listed follow `default_enabled`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SportsConfig {
    pub default_enabled: bool,
    #[serde(flatten)]
    pub toggles: BTreeMap<String, bool>,
}

impl Default for SportsConfig {
    fn default() -> Self {
        Self {
            default_enabled: true,
            toggles: BTreeMap::new(),
        }
    }
}

impl SportsConfig {
    /// Enabled catalog keys, in catalog order.
    pub fn enabled_keys(&self) -> Vec<&'static str> {
        let mut resolved: BTreeMap<&'static str, bool> = BTreeMap::new();
        for (raw, enabled) in &self.toggles {
            match sports::lookup(raw) {
                Some(sport) => {
                    resolved.insert(sport.key, *enabled);
                }
                None => tracing::warn!(sport = %raw, "unknown sport in [sports], ignoring"),
            }
        }
        SPORTS
            .iter()
            .map(|s| s.key)
            .filter(|k| resolved.get(k).copied().unwrap_or(self.default_enabled))
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing-subscriber filter used when RUST_LOG is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "match_collector=info".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content).with_context(|| "Failed to parse config TOML")?;
        Ok(Config {
            collector: raw.collector,
            xbet: raw.xbet.over(ProviderConfig::xbet_default()),
            iscj: raw.iscj.over(ProviderConfig::iscj_default()),
            sports: raw.sports,
            logging: raw.logging,
        })
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        // Strip BOM if present (common on Windows-created files)
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for (key, value) in parse_env_lines(content) {
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }

    /// Apply MATCH_COLLECTOR_* overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(db) = get(ENV_DB_PATH).map(|v| sanitize_value(&v)).filter(|v| !v.is_empty()) {
            self.collector.db_path = PathBuf::from(db);
        }
        if let Some(raw) = get(ENV_INTERVAL) {
            match sanitize_value(&raw).parse::<u64>() {
                Ok(mins) if mins > 0 => self.collector.interval_minutes = mins,
                _ => tracing::warn!(value = %raw, "invalid {}, keeping config value", ENV_INTERVAL),
            }
        }
    }
}

fn parse_env_lines(content: &str) -> impl Iterator<Item = (&str, &str)> {
    content.lines().filter_map(|line| {
        let line = line.trim().trim_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (key, value) = line.split_once('=')?;
        Some((key.trim(), value.trim().trim_matches('"').trim_matches('\'')))
    })
}

/// Strip carriage returns, BOM, and other invisible chars from a value.
fn sanitize_value(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}
