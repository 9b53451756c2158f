use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::gate::{GateOptions, ResolutionFailurePolicy};
use crate::retry::RetryPolicy;
use crate::scrape::ArticleLayout;

/// URL safety gate parameters (`[gate]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Schemes a URL may use (compared case-insensitively).
    pub allowed_schemes: Vec<String>,
    /// Literal hostnames that are always denied.
    pub blocked_hostnames: Vec<String>,
    /// What to do when the host cannot be resolved: "allow" or "deny".
    pub on_resolution_failure: ResolutionFailurePolicy,
}

impl Default for GateConfig {
    fn default() -> Self {
        let opts = GateOptions::default();
        Self {
            allowed_schemes: opts.allowed_schemes,
            blocked_hostnames: opts.blocked_hostnames,
            on_resolution_failure: opts.on_resolution_failure,
        }
    }
}

impl GateConfig {
    pub fn to_options(&self) -> GateOptions {
        GateOptions {
            allowed_schemes: self.allowed_schemes.clone(),
            blocked_hostnames: self.blocked_hostnames.clone(),
            on_resolution_failure: self.on_resolution_failure,
        }
    }
}

/// HTTP transport parameters (`[http]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: f64,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum redirect hops the guarded fetcher follows.
    pub max_redirects: u32,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 3.05,
            timeout_secs: 30,
            max_redirects: 5,
            user_agent: format!("fetchguard/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Retry policy parameters (`[retry]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (1.0 gives 1s, 2s, 4s, ...).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 1.0,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: secs_f64(self.base_delay_secs),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Client-side rate limiting (`[rate_limit]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum seconds between two calls of the same client (0 disables).
    pub min_interval_secs: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 1.0,
        }
    }
}

impl RateLimitConfig {
    pub fn min_interval(&self) -> Duration {
        secs_f64(self.min_interval_secs)
    }
}

/// Article listing selectors (`[scrape]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// CSS selector for one article entry.
    pub article: String,
    /// Title element inside an entry.
    pub title: String,
    /// Link element inside an entry (its `href` is used).
    pub link: String,
    /// Summary element inside an entry.
    pub summary: String,
    /// Date element inside an entry (its `datetime` attribute is used).
    pub date: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        let layout = ArticleLayout::default();
        Self {
            article: layout.article,
            title: layout.title,
            link: layout.link,
            summary: layout.summary,
            date: layout.date,
        }
    }
}

impl ScrapeConfig {
    pub fn to_layout(&self) -> ArticleLayout {
        ArticleLayout {
            article: self.article.clone(),
            title: self.title.clone(),
            link: self.link.clone(),
            summary: self.summary.clone(),
            date: self.date.clone(),
        }
    }
}

/// Global configuration loaded from `~/.config/fetchguard/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
}

/// Negative or non-finite values collapse to zero instead of panicking.
fn secs_f64(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fetchguard")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<GuardConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = GuardConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<GuardConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: GuardConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
