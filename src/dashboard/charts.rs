//! Static chart descriptions for the dashboard page.
//!
//! These charts do not depend on the selectors; they only name columns and
//! presentation options for the rendering front-end. The faceted box plot
//! also carries the job prestige brackets it is split by.

use crate::models::RecordTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of job prestige brackets in the faceted box plot.
pub const PRESTIGE_BRACKETS: usize = 6;

/// Kind of chart the front-end should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Scatter,
    Box,
    FacetedBox,
}

impl ChartKind {
    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Scatter => "Scatter plot",
            ChartKind::Box => "Box plot",
            ChartKind::FacetedBox => "Faceted box plot",
        }
    }
}

/// One selector-independent chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticChart {
    /// Stable identifier, usable as an anchor.
    pub id: String,
    /// Section heading shown above the chart.
    pub heading: String,
    pub kind: ChartKind,
    pub x: String,
    pub y: String,
    pub color: Option<String>,
    /// Regression overlay requested from the renderer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trendline: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hover: Vec<String>,
    /// Axis label overrides, keyed by column.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub show_legend: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet: Option<Facet>,
    pub width: u32,
    pub height: u32,
}

/// Facet split for a box plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    /// Derived column the facets are keyed by.
    pub column: String,
    /// Facets per row.
    pub wrap: u32,
    pub brackets: Vec<Bracket>,
}

/// Right-closed interval `(lower, upper]` of a binned column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    /// Rows falling in this bracket.
    pub rows: usize,
}

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Income against occupational prestige, coloured by sex, with an OLS line.
pub fn income_prestige_scatter() -> StaticChart {
    StaticChart {
        id: "income-vs-prestige".to_string(),
        heading: "Relationship between Annual Income and Occupation Prestige Score across Genders"
            .to_string(),
        kind: ChartKind::Scatter,
        x: "job_prestige".to_string(),
        y: "income".to_string(),
        color: Some("sex".to_string()),
        trendline: Some("ols".to_string()),
        hover: vec!["education".to_string(), "socioeconomic_index".to_string()],
        labels: labels(&[
            ("job_prestige", "Occupation Prestige Score"),
            ("income", "Annual Income"),
        ]),
        show_legend: true,
        facet: None,
        width: 600,
        height: 600,
    }
}

fn box_by_sex(id: &str, heading: &str, y: &str, y_label: &str) -> StaticChart {
    StaticChart {
        id: id.to_string(),
        heading: heading.to_string(),
        kind: ChartKind::Box,
        x: "sex".to_string(),
        y: y.to_string(),
        color: Some("sex".to_string()),
        trendline: None,
        hover: Vec::new(),
        labels: labels(&[(y, y_label), ("sex", "")]),
        show_legend: false,
        facet: None,
        width: 600,
        height: 600,
    }
}

/// Distribution of income by sex.
pub fn income_box() -> StaticChart {
    box_by_sex(
        "income-by-sex",
        "Distribution of Annual Income by Sex",
        "income",
        "Annual Income",
    )
}

/// Distribution of job prestige by sex.
pub fn prestige_box() -> StaticChart {
    box_by_sex(
        "prestige-by-sex",
        "Distribution of Job Prestige Score by Sex",
        "job_prestige",
        "Occupation Prestige Score",
    )
}

/// Income by sex, one panel per job prestige bracket.
pub fn faceted_income_box(table: &RecordTable) -> StaticChart {
    StaticChart {
        id: "income-by-sex-per-prestige".to_string(),
        heading: "Distribution of Annual Income by Sex Per Job Prestige Score Bracket".to_string(),
        kind: ChartKind::FacetedBox,
        x: "sex".to_string(),
        y: "income".to_string(),
        color: Some("sex".to_string()),
        trendline: None,
        hover: Vec::new(),
        labels: labels(&[("job_prestige", "Occupation Prestige Score"), ("sex", "")]),
        show_legend: false,
        facet: Some(Facet {
            column: "job_prestige_group".to_string(),
            wrap: 2,
            brackets: prestige_brackets(table, PRESTIGE_BRACKETS),
        }),
        width: 1000,
        height: 1000,
    }
}

/// Split the observed job prestige range into `bins` equal-width brackets.
///
/// The range spans every recorded job prestige value. Only rows that also
/// have income and sex are counted into a bracket. The lowest edge is pushed
/// down by 0.1% of the range so the minimum falls inside the first bracket.
pub fn prestige_brackets(table: &RecordTable, bins: usize) -> Vec<Bracket> {
    let values: Vec<f64> = table
        .rows()
        .iter()
        .filter_map(|row| table.value(row, "job_prestige").as_f64())
        .collect();

    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let edges = bin_edges(&values, bins);
    let mut counts = vec![0usize; bins];
    let counted = table.rows().iter().filter(|row| {
        table.value(row, "income").as_f64().is_some() && !table.value(row, "sex").is_missing()
    });
    for v in counted.filter_map(|row| table.value(row, "job_prestige").as_f64()) {
        let idx = edges[1..]
            .iter()
            .position(|upper| v <= *upper)
            .unwrap_or(bins - 1);
        counts[idx] += 1;
    }

    edges
        .windows(2)
        .zip(counts)
        .map(|(w, rows)| Bracket {
            label: format!("({:.3}, {:.3}]", w[0], w[1]),
            lower: w[0],
            upper: w[1],
            rows,
        })
        .collect()
}

fn bin_edges(values: &[f64], bins: usize) -> Vec<f64> {
    let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let degenerate = min == max;
    if degenerate {
        let pad = if min == 0.0 { 0.001 } else { min.abs() * 0.001 };
        min -= pad;
        max += pad;
    }

    let step = (max - min) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| min + step * i as f64).collect();
    edges[bins] = max;

    if !degenerate {
        edges[0] -= (max - min) * 0.001;
    }

    edges
}
