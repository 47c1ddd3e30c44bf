//! gssview - General Social Survey dashboard builder
//!
//! A CLI tool that loads a cleaned GSS extract, aggregates it, and writes
//! the dashboard as Markdown or JSON chart descriptions. In interactive mode
//! the grouped-count chart is re-rendered whenever a selector changes.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (bad arguments, unreadable data, invalid selector, etc.)

mod cli;
mod config;
mod dashboard;
mod data;
mod models;
mod report;
mod view;

use anyhow::{anyhow, Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use dashboard::DashboardOptions;
use models::SelectorPair;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use view::{help_text, validate_selectors, AggregationView, SelectorSession, SessionCommand};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging starts so `[general] verbose` applies
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(args.quiet));

    info!("gssview v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    if let Err(e) = run(args, config).await {
        error!("Dashboard failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .gssview.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the data path, default selectors and report options.");
    Ok(())
}

/// Initialize logging at the given level. `RUST_LOG` wins if set.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load data, then either write the dashboard or run an interactive session.
async fn run(args: Args, config: Config) -> Result<()> {
    let data_path = config
        .data
        .path
        .clone()
        .ok_or_else(|| {
            anyhow!(
                "No data file given (use --data or set [data] path in {})",
                CONFIG_FILE
            )
        })?;

    let table = data::load_table(&data_path)
        .with_context(|| format!("Failed to load records from {}", data_path.display()))?;
    let view = AggregationView::new(Arc::new(table));

    let selection =
        validate_selectors(&config.view.group_by, &config.view.x_axis, view.table())?;

    if args.interactive {
        return run_interactive(view, selection).await;
    }

    let dashboard = dashboard::build_dashboard(
        &view,
        DashboardOptions {
            title: config.report.title.clone(),
            intro: config.report.intro.clone(),
            source: data_path.display().to_string(),
            selection,
        },
    )?;

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => report::generate_markdown_report(&dashboard),
    };

    let output_path = Path::new(&config.general.output);
    report::write_report(&output, output_path)
        .with_context(|| format!("Failed to write dashboard to {}", output_path.display()))?;

    let chart = &dashboard.interactive.chart;
    println!("Dashboard Summary:");
    println!("   Records: {}", dashboard.metadata.records);
    println!("   Static charts: {}", dashboard.charts.len());
    println!(
        "   Interactive chart: {} by {} ({} combinations, {} rows skipped)",
        chart.x,
        chart.color,
        chart.data.rows.len(),
        chart.data.skipped
    );
    println!("\nDashboard saved to: {}", output_path.display());

    Ok(())
}

/// Read selector commands from stdin until `quit` or end of input.
async fn run_interactive(view: AggregationView, initial: SelectorPair) -> Result<()> {
    let session = SelectorSession::new(view, initial);

    println!("{}\n", help_text());

    let renderer = tokio::spawn(session.render_loop(|pair, result| match result {
        Ok(chart) => {
            println!("== {} by {} ==\n", pair.measure, pair.group);
            print!("{}", report::generate_count_table(&chart));
        }
        Err(e) => eprintln!("Error: {}", e),
    }));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let command = match SessionCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(msg) => {
                eprintln!("{} (type 'help' for commands)", msg);
                continue;
            }
        };

        let applied = match command {
            SessionCommand::Group(field) => session.set_group(&field),
            SessionCommand::Measure(field) => session.set_measure(&field),
            SessionCommand::Show => {
                session.refresh();
                Ok(true)
            }
            SessionCommand::Options => {
                println!("{}", report::generate_options_text());
                Ok(true)
            }
            SessionCommand::Help => {
                println!("{}", help_text());
                Ok(true)
            }
            SessionCommand::Quit => break,
        };

        match applied {
            Ok(true) => {}
            Ok(false) => {
                let current = session.current();
                println!(
                    "(selection unchanged: {} by {})",
                    current.measure, current.group
                );
            }
            Err(e) => {
                warn!("Rejected selector: {}", e);
                eprintln!("Error: {}", e);
            }
        }
    }

    drop(session);
    let renders = renderer.await.context("Render loop stopped unexpectedly")?;
    info!("Session closed after {} renders", renders);

    Ok(())
}

/// Where the configuration came from.
enum ConfigSource {
    Explicit(PathBuf),
    Default,
    Builtin,
    Fallback(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::Default => info!("Loaded default config from {}", CONFIG_FILE),
            ConfigSource::Builtin => debug!("No config file found, using defaults"),
            ConfigSource::Fallback(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::Default)),
        Ok(None) => Ok((Config::default(), ConfigSource::Builtin)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(e))),
    }
}
