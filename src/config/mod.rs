//! Configuration management.
//!
//! Settings are read from a TOML file and `CITEGRAPH_*` environment variables
//! (nested keys use `__`, e.g. `CITEGRAPH_CRAWL__MAX_ARTICLES=100`).
//!
//! ```toml
//! [pubmed]
//! email = "you@example.org"
//! api_key = "your-ncbi-key"
//!
//! [rate_limits]
//! base_delay_ms = 500
//! jitter_ms = 100
//! max_retries = 3
//!
//! [crawl]
//! max_articles = 50
//! node_pause_ms = 200
//!
//! [analytics]
//! betweenness_sample_size = 100
//! community_detection = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// PubMed E-utilities settings
    #[serde(default)]
    pub pubmed: PubMedConfig,

    /// Outbound request pacing and retry settings
    #[serde(default)]
    pub rate_limits: RateLimitConfig,

    /// Graph crawl settings
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Analytics engine settings
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// PubMed E-utilities configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubMedConfig {
    /// E-utilities base URL (without trailing slash)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Tool name reported to NCBI
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Contact email reported to NCBI
    #[serde(default)]
    pub email: Option<String>,

    /// NCBI API key (optional, raises the server-side rate limit)
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            tool: default_tool(),
            email: None,
            api_key: default_api_key(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl PubMedConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_base_url() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string()
}

fn default_tool() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_api_key() -> Option<String> {
    std::env::var("NCBI_API_KEY").ok().filter(|k| !k.is_empty())
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Rate limiting and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum spacing between two outbound requests (milliseconds)
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Upper bound of the uniform jitter added to the spacing (milliseconds)
    #[serde(default = "default_jitter")]
    pub jitter_ms: u64,

    /// Retries after the first attempt for rate-limited or failed transport calls
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit; retry `n` waits `backoff_base * 2^n` plus jitter (milliseconds)
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Upper bound of the jitter added to each backoff (milliseconds)
    #[serde(default = "default_backoff_jitter")]
    pub backoff_jitter_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay(),
            jitter_ms: default_jitter(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base(),
            backoff_jitter_ms: default_backoff_jitter(),
        }
    }
}

fn default_base_delay() -> u64 {
    500
}

fn default_jitter() -> u64 {
    100
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    1000
}

fn default_backoff_jitter() -> u64 {
    1000
}

/// Crawl configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Node budget: maximum number of publications a single graph may contain
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,

    /// Pause after each processed node (milliseconds)
    #[serde(default = "default_node_pause")]
    pub node_pause_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_articles: default_max_articles(),
            node_pause_ms: default_node_pause(),
        }
    }
}

impl CrawlConfig {
    pub fn node_pause(&self) -> Duration {
        Duration::from_millis(self.node_pause_ms)
    }
}

fn default_max_articles() -> usize {
    50
}

fn default_node_pause() -> u64 {
    200
}

/// Analytics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Betweenness is exact up to this many nodes, sampled from this many sources above it
    #[serde(default = "default_betweenness_sample")]
    pub betweenness_sample_size: usize,

    /// Seed for the betweenness source sample
    #[serde(default = "default_sample_seed")]
    pub sample_seed: u64,

    /// PageRank damping factor
    #[serde(default = "default_damping")]
    pub pagerank_damping: f64,

    #[serde(default = "default_pagerank_iter")]
    pub pagerank_max_iter: usize,

    #[serde(default = "default_long_iter")]
    pub eigenvector_max_iter: usize,

    #[serde(default = "default_long_iter")]
    pub hits_max_iter: usize,

    /// Run community detection when a detector is compiled in
    #[serde(default = "default_true")]
    pub community_detection: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            betweenness_sample_size: default_betweenness_sample(),
            sample_seed: default_sample_seed(),
            pagerank_damping: default_damping(),
            pagerank_max_iter: default_pagerank_iter(),
            eigenvector_max_iter: default_long_iter(),
            hits_max_iter: default_long_iter(),
            community_detection: true,
        }
    }
}

fn default_betweenness_sample() -> usize {
    100
}

fn default_sample_seed() -> u64 {
    42
}

fn default_damping() -> f64 {
    0.85
}

fn default_pagerank_iter() -> usize {
    100
}

fn default_long_iter() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Reject settings the crawler or analytics engine cannot run with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.crawl.max_articles == 0 {
            return Err(config::ConfigError::Message(
                "crawl.max_articles must be at least 1".to_string(),
            ));
        }
        let damping = self.analytics.pagerank_damping;
        if !(damping > 0.0 && damping < 1.0) {
            return Err(config::ConfigError::Message(format!(
                "analytics.pagerank_damping must lie in (0, 1), got {}",
                damping
            )));
        }
        if self.pubmed.base_url.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "pubmed.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// `CITEGRAPH_<SECTION>__<KEY>` variables, e.g. `CITEGRAPH_CRAWL__MAX_ARTICLES`
fn environment() -> config::Environment {
    config::Environment::with_prefix("CITEGRAPH")
        .prefix_separator("_")
        .separator("__")
}

/// Load configuration from a file, with `CITEGRAPH_*` environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Get the default configuration, with `CITEGRAPH_*` environment overrides
pub fn get_config() -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(environment())
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Look for a configuration file in the working directory, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("citegraph.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("citegraph").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.crawl.max_articles, 50);
        assert_eq!(config.rate_limits.base_delay_ms, 500);
        assert_eq!(config.rate_limits.max_retries, 3);
        assert_eq!(config.analytics.pagerank_damping, 0.85);
        assert!(config.analytics.community_detection);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = Config::default();
        config.crawl.max_articles = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_damping() {
        let mut config = Config::default();
        config.analytics.pagerank_damping = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join(format!("citegraph-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[crawl]\nnode_pause_ms = 12\n\n[rate_limits]\nbase_delay_ms = 50").unwrap();

        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.crawl.node_pause_ms, 12);
        assert_eq!(config.rate_limits.base_delay_ms, 50);
        // untouched sections keep their defaults
        assert_eq!(config.rate_limits.max_retries, 3);
        assert_eq!(config.analytics.betweenness_sample_size, 100);
    }

    #[test]
    fn test_env_overrides_use_single_underscore_prefix() {
        std::env::set_var("CITEGRAPH_CRAWL__MAX_ARTICLES", "7");
        let config = get_config();
        std::env::remove_var("CITEGRAPH_CRAWL__MAX_ARTICLES");

        assert_eq!(config.unwrap().crawl.max_articles, 7);
    }
}
