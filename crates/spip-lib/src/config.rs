// Engine Configuration
// Registry endpoints, external scanner settings and per-analysis thresholds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;
use crate::services::progress::ProgressCallback;

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";
pub const DEFAULT_STATS_URL: &str = "https://pypistats.org/api/packages";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SCANNER_TOOL: &str = "pip-audit";

pub const DEFAULT_MIN_DOWNLOADS: i64 = 1000;
pub const DEFAULT_MIN_AGE_DAYS: i64 = 30;
pub const DEFAULT_MAX_DEPTH: usize = 4;
pub const DEFAULT_TYPOSQUAT_THRESHOLD: f64 = 0.85;

const ENV_INDEX_URL: &str = "SPIP_INDEX_URL";
const ENV_STATS_URL: &str = "SPIP_STATS_URL";
const ENV_HTTP_TIMEOUT: &str = "SPIP_HTTP_TIMEOUT_SECS";

// ============================================================================
// Registry
// ============================================================================

/// Where and how to reach the package index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Base of the JSON metadata endpoint, `{index_url}/{name}/json`
    pub index_url: String,
    /// Base of the download statistics endpoint, `{stats_url}/{name}/recent`
    pub stats_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            stats_url: DEFAULT_STATS_URL.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: format!("spip/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl RegistryConfig {
    /// Build from `SPIP_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_INDEX_URL).filter(|v| !v.trim().is_empty()) {
            config.index_url = url.trim().to_string();
        }
        if let Some(url) = lookup(ENV_STATS_URL).filter(|v| !v.trim().is_empty()) {
            config.stats_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_HTTP_TIMEOUT) {
            config.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(ENV_HTTP_TIMEOUT, raw.clone()))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_index_url(mut self, url: impl Into<String>) -> Self {
        self.index_url = url.into();
        self
    }

    pub fn with_stats_url(mut self, url: impl Into<String>) -> Self {
        self.stats_url = url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject unusable endpoints before any request is made
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_http_url("indexUrl", &self.index_url)?;
        check_http_url("statsUrl", &self.stats_url)?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("timeoutSecs", "0".to_string()));
        }
        Ok(())
    }
}

fn check_http_url(field: &'static str, raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl {
            field,
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

// ============================================================================
// Vulnerability scanner
// ============================================================================

/// External vulnerability tool invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScannerConfig {
    /// Tool name looked up on PATH, or an absolute path
    pub tool: String,
    /// Arguments; the package name is written to the tool's stdin
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            tool: DEFAULT_SCANNER_TOOL.to_string(),
            args: vec!["-r".to_string(), "/dev/stdin".to_string()],
            timeout_secs: DEFAULT_SCAN_TIMEOUT_SECS,
        }
    }
}

impl ScannerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============================================================================
// Per-analysis options
// ============================================================================

/// Options for a single `analyze` call
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    pub min_downloads: i64,
    pub min_age_days: i64,
    pub build_dependency_tree: bool,
    pub max_depth: usize,
    pub typosquat_threshold: f64,
    #[serde(skip)]
    pub progress: Option<ProgressCallback>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            min_downloads: DEFAULT_MIN_DOWNLOADS,
            min_age_days: DEFAULT_MIN_AGE_DAYS,
            build_dependency_tree: false,
            max_depth: DEFAULT_MAX_DEPTH,
            typosquat_threshold: DEFAULT_TYPOSQUAT_THRESHOLD,
            progress: None,
        }
    }
}

impl fmt::Debug for AnalysisOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisOptions")
            .field("min_downloads", &self.min_downloads)
            .field("min_age_days", &self.min_age_days)
            .field("build_dependency_tree", &self.build_dependency_tree)
            .field("max_depth", &self.max_depth)
            .field("typosquat_threshold", &self.typosquat_threshold)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl AnalysisOptions {
    pub fn with_dependency_tree(mut self, max_depth: usize) -> Self {
        self.build_dependency_tree = true;
        self.max_depth = max_depth;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }
}
