//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::EmptyColumnPolicy;
use clap::Parser;
use std::path::PathBuf;

/// VizStats - min/max/average statistics for dashboard query results
///
/// Reads query result snapshots (JSON), computes per-fact statistics with
/// the attribute labels of the extreme rows, and writes a Markdown, JSON
/// or HTML report.
///
/// Examples:
///   vizstats sales.json
///   vizstats snapshots/ --format html -o stats.html
///   vizstats q1.json q2.json --empty-columns skip --precision 2
///   vizstats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Snapshot files or directories of snapshots
    #[arg(value_name = "INPUT", required_unless_present = "init_config")]
    pub inputs: Vec<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to the configured output with the extension of --format
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the report to stdout instead of writing a file
    #[arg(long, conflicts_with = "output")]
    pub stdout: bool,

    /// Output format (markdown, json, html)
    #[arg(
        short,
        long,
        default_value = "markdown",
        value_name = "FORMAT",
        env = "VIZSTATS_FORMAT"
    )]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .vizstats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// What to do with a fact column without values
    #[arg(long, value_name = "POLICY")]
    pub empty_columns: Option<EmptyColumnsArg>,

    /// Fail when two columns of the same kind share a label
    #[arg(long)]
    pub reject_duplicate_labels: bool,

    /// Report title
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Number of decimal places for displayed values
    #[arg(long, value_name = "DIGITS")]
    pub precision: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .vizstats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
    /// HTML fragment in the stats widget layout
    Html,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
        }
    }
}

/// Value of --empty-columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EmptyColumnsArg {
    /// Fail the snapshot
    Fail,
    /// Leave the column out
    Skip,
}

impl From<EmptyColumnsArg> for EmptyColumnPolicy {
    fn from(arg: EmptyColumnsArg) -> Self {
        match arg {
            EmptyColumnsArg::Fail => EmptyColumnPolicy::Fail,
            EmptyColumnsArg::Skip => EmptyColumnPolicy::Skip,
        }
    }
}

/// Largest accepted --precision.
const MAX_PRECISION: usize = 17;

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.inputs.is_empty() {
            return Err("At least one input file or directory is required".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(precision) = self.precision {
            if precision > MAX_PRECISION {
                return Err(format!("Precision must be at most {}", MAX_PRECISION));
            }
        }

        for input in &self.inputs {
            if !input.exists() {
                return Err(format!("Input does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `--quiet` wins over a configured `verbose = true`.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn make_args(input: PathBuf) -> Args {
        Args {
            inputs: vec![input],
            output: None,
            stdout: false,
            format: OutputFormat::Markdown,
            config: None,
            empty_columns: None,
            reject_duplicate_labels: false,
            title: None,
            precision: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        let file = NamedTempFile::new().unwrap();
        let args = make_args(file.path().to_path_buf());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let args = make_args(PathBuf::from("/no/such/snapshot.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_precision() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        args.precision = Some(40);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args(PathBuf::from("/no/such/snapshot.json"));
        args.inputs.clear();
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "vizstats",
            "a.json",
            "dir",
            "--format",
            "html",
            "--empty-columns",
            "skip",
        ])
        .unwrap();

        assert_eq!(args.inputs, vec![PathBuf::from("a.json"), PathBuf::from("dir")]);
        assert_eq!(args.format, OutputFormat::Html);
        assert_eq!(args.empty_columns, Some(EmptyColumnsArg::Skip));
        assert_eq!(
            EmptyColumnPolicy::from(EmptyColumnsArg::Skip),
            EmptyColumnPolicy::Skip
        );
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(PathBuf::from("a.json"));
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
