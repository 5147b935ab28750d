//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.vizstats.toml` files.

use crate::analysis::{AggregatorOptions, EmptyColumnPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".vizstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Snapshot input settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "vizstats_report.md".to_string()
}

/// Snapshot input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// File extensions picked up from input directories.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Maximum snapshot size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["json".to_string()]
}

fn default_max_file_size() -> u64 {
    16 * 1024 * 1024 // 16MB
}

/// Aggregation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// What to do with a fact column that has no values ("fail" or "skip").
    #[serde(default)]
    pub empty_columns: EmptyColumnPolicy,

    /// Fail instead of overwriting when two columns of the same kind share a label.
    #[serde(default)]
    pub reject_duplicate_labels: bool,
}

impl AggregationConfig {
    pub fn options(&self) -> AggregatorOptions {
        AggregatorOptions {
            empty_columns: self.empty_columns,
            reject_duplicate_labels: self.reject_duplicate_labels,
        }
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Fixed number of decimal places for displayed values (unset = as is).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<usize>,

    /// Include the source path and value counts in Markdown reports.
    #[serde(default = "default_true")]
    pub include_details: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            precision: None,
            include_details: true,
        }
    }
}

fn default_title() -> String {
    "Data Statistics".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(policy) = args.empty_columns {
            self.aggregation.empty_columns = policy.into();
        }
        if args.reject_duplicate_labels {
            self.aggregation.reject_duplicate_labels = true;
        }

        if let Some(ref title) = args.title {
            self.report.title = title.clone();
        }
        if let Some(precision) = args.precision {
            self.report.precision = Some(precision);
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
