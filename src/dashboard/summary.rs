//! Sex-grouped summary table of mean socioeconomic measures.

use crate::models::{RecordTable, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MEASURES: usize = 4;

/// Column averaged by the summary table, paired with its display label.
const SUMMARY_COLUMNS: [(&str, &str); MEASURES] = [
    ("income", "Mean Income"),
    ("job_prestige", "Mean Occupational Prestige"),
    ("socioeconomic_index", "Mean Socioeconomic Index"),
    ("education", "Mean Years of Education"),
];

const GROUP_COLUMN: (&str, &str) = ("sex", "Sex");

/// Rendered summary table: display headers plus one row per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub headers: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

/// One group of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub group: Value,
    /// Means in header order, `None` when the group has no values.
    pub means: Vec<Option<f64>>,
}

#[derive(Default)]
struct Accumulator {
    sums: [f64; MEASURES],
    counts: [usize; MEASURES],
}

/// Group by sex and average income, prestige, SEI and education.
///
/// Missing and non-numeric values are ignored; means are rounded to 2
/// decimals. Groups appear in first-seen order.
pub fn summarize_by_sex(table: &RecordTable) -> SummaryTable {
    let mut order: Vec<Value> = Vec::new();
    let mut acc: HashMap<Value, Accumulator> = HashMap::new();

    for row in table.rows() {
        let group = table.value(row, GROUP_COLUMN.0);
        if group.is_missing() {
            continue;
        }

        if !acc.contains_key(group) {
            order.push(group.clone());
        }
        let entry = acc.entry(group.clone()).or_default();

        for (i, (column, _)) in SUMMARY_COLUMNS.iter().enumerate() {
            if let Some(v) = table.value(row, column).as_f64() {
                entry.sums[i] += v;
                entry.counts[i] += 1;
            }
        }
    }

    let rows = order
        .into_iter()
        .map(|group| {
            let a = &acc[&group];
            let means = (0..MEASURES)
                .map(|i| (a.counts[i] > 0).then(|| round2(a.sums[i] / a.counts[i] as f64)))
                .collect();
            SummaryRow { group, means }
        })
        .collect();

    let headers = std::iter::once(GROUP_COLUMN.1)
        .chain(SUMMARY_COLUMNS.iter().map(|(_, label)| *label))
        .map(String::from)
        .collect();

    SummaryTable { headers, rows }
}

/// Round to 2 decimals, ties to even.
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}
