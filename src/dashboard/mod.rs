//! Dashboard assembly.
//!
//! A [`Dashboard`] is the complete declarative page: intro text, the summary
//! table, the static charts and the interactive chart for one selector pair.

pub mod charts;
pub mod summary;

pub use charts::StaticChart;
pub use summary::{summarize_by_sex, SummaryTable};

use crate::models::{ChartDescription, GroupField, InvalidFieldError, MeasureField, SelectorPair};
use crate::view::AggregationView;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Heading above the summary table.
pub const SUMMARY_HEADING: &str =
    "Comparing Male vs. Female for Average Income, Education, Occupational Prestige, and Socioeconomic Index";

/// Heading above the interactive chart.
pub const INTERACTIVE_HEADING: &str = "Counts of Levels of Agreement to Survey Questions";

/// Metadata about a generated dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetadata {
    pub title: String,
    /// Where the records came from.
    pub source: String,
    pub records: usize,
    pub generated_at: DateTime<Utc>,
}

/// The selector-driven part of the page.
#[derive(Debug, Clone, Serialize)]
pub struct InteractiveSection {
    pub heading: String,
    pub selection: SelectorPair,
    /// Options offered by the x-axis dropdown.
    pub measure_options: Vec<String>,
    /// Options offered by the group-by dropdown.
    pub group_options: Vec<String>,
    pub chart: ChartDescription,
}

/// The complete dashboard description.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    /// Markdown introduction.
    pub intro: String,
    pub summary_heading: String,
    pub summary: SummaryTable,
    pub charts: Vec<StaticChart>,
    pub interactive: InteractiveSection,
}

/// Inputs for [`build_dashboard`] that are not part of the data.
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub title: String,
    pub intro: String,
    pub source: String,
    pub selection: SelectorPair,
}

/// Build the full dashboard for the view's table.
pub fn build_dashboard(
    view: &AggregationView,
    options: DashboardOptions,
) -> Result<Dashboard, InvalidFieldError> {
    let table = view.table();
    let chart = view.recompute(
        options.selection.group.as_str(),
        options.selection.measure.as_str(),
    )?;

    let charts = vec![
        charts::income_prestige_scatter(),
        charts::income_box(),
        charts::prestige_box(),
        charts::faceted_income_box(table),
    ];

    info!(
        "Built dashboard with {} static charts over {} records",
        charts.len(),
        table.len()
    );

    Ok(Dashboard {
        metadata: DashboardMetadata {
            title: options.title,
            source: options.source,
            records: table.len(),
            generated_at: Utc::now(),
        },
        intro: options.intro,
        summary_heading: SUMMARY_HEADING.to_string(),
        summary: summarize_by_sex(table),
        charts,
        interactive: InteractiveSection {
            heading: INTERACTIVE_HEADING.to_string(),
            selection: options.selection,
            measure_options: MeasureField::names().into_iter().map(String::from).collect(),
            group_options: GroupField::names().into_iter().map(String::from).collect(),
            chart,
        },
    })
}
