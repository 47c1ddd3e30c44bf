//! Markdown and JSON dashboard rendering.
//!
//! Markdown output is a readable stand-in for the page; JSON output is the
//! chart description a plotting front-end consumes.

use crate::dashboard::{Dashboard, DashboardMetadata, StaticChart, SummaryTable};
use crate::models::{ChartDescription, GroupField, MeasureField};
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown dashboard.
pub fn generate_markdown_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {}\n\n", dashboard.metadata.title));

    output.push_str(&generate_metadata_section(&dashboard.metadata));
    output.push_str(&generate_table_of_contents(dashboard));
    output.push_str(&generate_intro_section(&dashboard.intro));
    output.push_str(&generate_summary_section(
        &dashboard.summary_heading,
        &dashboard.summary,
    ));

    for chart in &dashboard.charts {
        output.push_str(&generate_chart_section(chart));
    }

    output.push_str(&generate_interactive_section(dashboard));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!("- **Records:** {}\n", metadata.records));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(dashboard: &Dashboard) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");

    if !dashboard.intro.is_empty() {
        toc.push_str("- [Introduction](#introduction)\n");
    }

    toc.push_str(&format!(
        "- [{}](#summary)\n",
        dashboard.summary_heading
    ));

    for chart in &dashboard.charts {
        toc.push_str(&format!("- [{}](#{})\n", chart.heading, chart.id));
    }

    toc.push_str(&format!(
        "- [{}](#interactive)\n\n",
        dashboard.interactive.heading
    ));

    toc
}

fn generate_intro_section(intro: &str) -> String {
    if intro.is_empty() {
        return String::new();
    }

    format!("## Introduction\n\n{}\n\n", intro.trim())
}

/// Generate the summary table section.
fn generate_summary_section(heading: &str, summary: &SummaryTable) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {} {{#summary}}\n\n", heading));

    if summary.rows.is_empty() {
        section.push_str("No records with a recorded sex.\n\n");
        return section;
    }

    section.push_str(&format!("| {} |\n", summary.headers.join(" | ")));
    section.push_str("|:---|");
    section.push_str(&"---:|".repeat(summary.headers.len().saturating_sub(1)));
    section.push('\n');

    for row in &summary.rows {
        let means: Vec<String> = row
            .means
            .iter()
            .map(|m| m.map_or_else(|| "NA".to_string(), |v| format!("{:.2}", v)))
            .collect();
        section.push_str(&format!("| {} | {} |\n", row.group, means.join(" | ")));
    }
    section.push('\n');

    section
}

/// Generate the section for one static chart.
fn generate_chart_section(chart: &StaticChart) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {} {{#{}}}\n\n", chart.heading, chart.id));
    section.push_str(&format!(
        "*{} | {}x{}*\n\n",
        chart.kind.label(),
        chart.width,
        chart.height
    ));

    section.push_str(&format!("- **x:** `{}`\n", chart.x));
    section.push_str(&format!("- **y:** `{}`\n", chart.y));
    if let Some(ref color) = chart.color {
        section.push_str(&format!("- **color:** `{}`\n", color));
    }
    if let Some(ref trendline) = chart.trendline {
        section.push_str(&format!("- **trendline:** {}\n", trendline));
    }
    if !chart.hover.is_empty() {
        section.push_str(&format!("- **hover:** {}\n", chart.hover.join(", ")));
    }
    if !chart.show_legend {
        section.push_str("- **legend:** hidden\n");
    }
    section.push('\n');

    if let Some(ref facet) = chart.facet {
        section.push_str(&format!(
            "Faceted by `{}` ({} per row):\n\n",
            facet.column, facet.wrap
        ));

        if facet.brackets.is_empty() {
            section.push_str("No rows with income, sex and job prestige.\n\n");
        } else {
            section.push_str("| Bracket | Rows |\n");
            section.push_str("|:---|:---:|\n");
            for bracket in &facet.brackets {
                section.push_str(&format!("| {} | {} |\n", bracket.label, bracket.rows));
            }
            section.push('\n');
        }
    }

    section
}

/// Generate the interactive chart section.
fn generate_interactive_section(dashboard: &Dashboard) -> String {
    let interactive = &dashboard.interactive;
    let mut section = String::new();

    section.push_str(&format!("## {} {{#interactive}}\n\n", interactive.heading));
    section.push_str(&format!(
        "- **X-Axis Category:** `{}` (options: {})\n",
        interactive.selection.measure,
        interactive.measure_options.join(", ")
    ));
    section.push_str(&format!(
        "- **Group-by Category:** `{}` (options: {})\n\n",
        interactive.selection.group,
        interactive.group_options.join(", ")
    ));

    section.push_str(&generate_count_table(&interactive.chart));

    section
}

/// Render the interactive chart's count table as Markdown.
pub fn generate_count_table(chart: &ChartDescription) -> String {
    let mut table = String::new();

    table.push_str(&format!(
        "*Grouped bars: x = `{}`, y = `{}`, color = `{}`*\n\n",
        chart.x, chart.y, chart.color
    ));

    if chart.data.rows.is_empty() {
        table.push_str("No rows with both values recorded.\n\n");
        return table;
    }

    table.push_str(&format!(
        "| {} | {} | Count |\n",
        chart.data.group_field, chart.data.measure_field
    ));
    table.push_str("|:---|:---|---:|\n");

    for row in &chart.data.rows {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            row.group, row.measure, row.count
        ));
    }
    table.push('\n');

    table.push_str(&format!("Total: {}", chart.data.total()));
    if chart.data.skipped > 0 {
        table.push_str(&format!(
            " ({} rows skipped for missing values)",
            chart.data.skipped
        ));
    }
    table.push_str("\n\n");

    table
}

/// List both selector option sets.
pub fn generate_options_text() -> String {
    format!(
        "x-axis:   {}\ngroup-by: {}",
        MeasureField::names().join(", "),
        GroupField::names().join(", ")
    )
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Data: [General Social Survey](https://gss.norc.org)*\n".to_string()
}

/// Generate a JSON dashboard.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

/// Write rendered output to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}
