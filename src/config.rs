//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.gssview.toml` files.

use crate::cli::{Args, OutputFormat};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".gssview.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Data source settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Initial selector values.
    #[serde(default)]
    pub view: ViewConfig,

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
    "gss_dashboard.md".to_string()
}

/// Data source settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the cleaned record file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Initial selector values for the interactive chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Group-by selector.
    #[serde(default = "default_group_by")]
    pub group_by: String,

    /// X-axis selector.
    #[serde(default = "default_x_axis")]
    pub x_axis: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            group_by: default_group_by(),
            x_axis: default_x_axis(),
        }
    }
}

fn default_group_by() -> String {
    "sex".to_string()
}

fn default_x_axis() -> String {
    "male_breadwinner".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Dashboard title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Markdown introduction shown above the charts.
    #[serde(default = "default_intro")]
    pub intro: String,

    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            intro: default_intro(),
            format: OutputFormat::default(),
        }
    }
}

fn default_title() -> String {
    "Exploring Gender Differences through GSS Data".to_string()
}

fn default_intro() -> String {
    "The [General Social Survey](https://gss.norc.org) (GSS) is an ongoing interview survey \
     of U.S. households conducted by NORC since 1972. It tracks demographic characteristics \
     and attitudes of the adult population. The charts below compare income, occupational \
     prestige and opinions on gender roles across men and women."
        .to_string()
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
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.gssview.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref data) = args.data {
            self.data.path = Some(data.clone());
        }
        if let Some(ref output) = args.output {
            self.general.output = output.to_string_lossy().to_string();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref group) = args.group_by {
            self.view.group_by = group.clone();
        }
        if let Some(ref x) = args.x_axis {
            self.view.x_axis = x.clone();
        }
        if let Some(ref title) = args.title {
            self.report.title = title.clone();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level after merging: `quiet` wins, then `[general] verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.view.group_by, "sex");
        assert_eq!(config.view.x_axis, "male_breadwinner");
        assert_eq!(config.report.format, OutputFormat::Markdown);
        assert!(config.data.path.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_dashboard.json"
verbose = true

[data]
path = "data/gss2018.jsonl"

[view]
group_by = "region"

[report]
format = "json"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom_dashboard.json");
        assert!(config.general.verbose);
        assert_eq!(
            config.data.path.as_deref(),
            Some(Path::new("data/gss2018.jsonl"))
        );
        assert_eq!(config.view.group_by, "region");
        assert_eq!(config.view.x_axis, "male_breadwinner");
        assert_eq!(config.report.format, OutputFormat::Json);
        assert!(config.report.title.contains("GSS"));
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let args = Args {
            data: Some(PathBuf::from("gss.json")),
            config: None,
            output: None,
            format: Some(OutputFormat::Json),
            group_by: Some("education".to_string()),
            x_axis: None,
            title: None,
            interactive: false,
            verbose: true,
            quiet: false,
            init_config: false,
        };

        config.merge_with_args(&args);
        assert_eq!(config.data.path, Some(PathBuf::from("gss.json")));
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.view.group_by, "education");
        assert_eq!(config.view.x_axis, "male_breadwinner");
        assert_eq!(config.general.output, "gss_dashboard.md");
        assert!(config.general.verbose);
    }

    #[test]
    fn test_log_level_honours_config_verbose() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
        assert_eq!(config.log_level(true), tracing::Level::ERROR);

        config.general.verbose = false;
        assert_eq!(config.log_level(false), tracing::Level::INFO);

        let args = Args {
            data: None,
            config: None,
            output: None,
            format: None,
            group_by: None,
            x_axis: None,
            title: None,
            interactive: false,
            verbose: true,
            quiet: false,
            init_config: false,
        };
        config.merge_with_args(&args);
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        let mut file = std::fs::File::create(dir.path().join(CONFIG_FILE)).unwrap();
        writeln!(file, "[view]\nx_axis = \"satjob\"").unwrap();

        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.view.x_axis, "satjob");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[view]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.view.group_by, "sex");
    }
}
