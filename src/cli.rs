//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// gssview - survey dashboard builder for General Social Survey extracts
///
/// Loads a cleaned GSS record file (JSON array or JSON Lines) and renders the
/// dashboard as Markdown or as JSON chart descriptions.
///
/// Examples:
///   gssview --data gss_clean.json
///   gssview --data gss_clean.jsonl --group-by region --x-axis satjob
///   gssview --data gss_clean.json --format json --output dashboard.json
///   gssview --data gss_clean.json --interactive
///   gssview --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Cleaned survey records to load
    ///
    /// JSON array of objects or JSON Lines. Falls back to the [data] path
    /// in the config file when omitted.
    #[arg(short, long, value_name = "FILE", env = "GSSVIEW_DATA")]
    pub data: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .gssview.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the dashboard
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Group-by selector for the interactive chart (sex, region, education)
    #[arg(short, long, value_name = "FIELD")]
    pub group_by: Option<String>,

    /// X-axis selector for the interactive chart
    ///
    /// One of: satjob, relationship, male_breadwinner, men_bettersuited,
    /// child_suffer, men_overwork
    #[arg(short = 'x', long, value_name = "FIELD")]
    pub x_axis: Option<String>,

    /// Dashboard title
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Change selectors from stdin and re-render the interactive chart
    #[arg(short, long)]
    pub interactive: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .gssview.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the dashboard.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    clap::ValueEnum,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON chart descriptions
    Json,
}

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

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref data) = self.data {
            if !data.exists() {
                return Err(format!("Data file does not exist: {}", data.display()));
            }
            if !data.is_file() {
                return Err(format!("Data path is not a file: {}", data.display()));
            }
        }

        if let Some(ref group) = self.group_by {
            group
                .parse::<crate::models::GroupField>()
                .map_err(|e| e.to_string())?;
        }

        if let Some(ref x) = self.x_axis {
            x.parse::<crate::models::MeasureField>()
                .map_err(|e| e.to_string())?;
        }

        Ok(())
    }
}
