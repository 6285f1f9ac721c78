//! Scan configuration types.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default minimum interval between throttled progress reports.
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 500;

/// Which entries the scanner leaves out of the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterPolicy {
    /// Skip zero-length files and, when enabled, reparse points.
    #[default]
    Standard,
    /// Also skip offline, temporary and sparse files and cloud-sync
    /// placeholders (`.nextcloud`, `.cloud`, `.cloudf`).
    CloudPlaceholders,
}

/// Configuration for scanning operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Skip symbolic links, junctions and other reparse points.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub ignore_reparse_points: bool,

    /// Filtering rule set.
    #[builder(default)]
    #[serde(default)]
    pub filter_policy: FilterPolicy,

    /// Minimum milliseconds between throttled progress reports.
    #[builder(default = "DEFAULT_PROGRESS_INTERVAL_MS")]
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    /// Entry names to skip (glob syntax).
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_progress_interval_ms() -> u64 {
    DEFAULT_PROGRESS_INTERVAL_MS
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let patterns = self.ignore_patterns.as_deref().unwrap_or_default();
        if patterns.iter().any(|p| p.trim().is_empty()) {
            return Err("Ignore patterns cannot be empty".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Minimum interval between throttled progress reports.
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_reparse_points: true,
            filter_policy: FilterPolicy::Standard,
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
            ignore_patterns: Vec::new(),
        }
    }
}
