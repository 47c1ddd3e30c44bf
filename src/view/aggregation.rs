//! Grouped counts behind the interactive bar chart.
//!
//! Every selector change recomputes the count table from scratch over the
//! shared, read-only record table.

use crate::models::{
    ChartDescription, CountRow, CountTable, FieldRole, GroupField, InvalidFieldError,
    InvalidFieldReason, MeasureField, RecordTable, SelectorPair, Value, COUNT_COLUMN,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Bar layout hint for grouped (side-by-side) bars.
pub const GROUPED_BARS: &str = "group";

const CHART_WIDTH: u32 = 1000;
const CHART_HEIGHT: u32 = 600;

/// Recompute the interactive chart for a pair of field names.
///
/// Fails with [`InvalidFieldError`] if either name is not an allowed option
/// for its role or is absent from the table.
pub fn recompute(
    group_field: &str,
    measure_field: &str,
    table: &RecordTable,
) -> Result<ChartDescription, InvalidFieldError> {
    let pair = validate_selectors(group_field, measure_field, table)?;
    Ok(describe(pair, table))
}

/// Check both selector names against their option lists and the table schema.
pub fn validate_selectors(
    group_field: &str,
    measure_field: &str,
    table: &RecordTable,
) -> Result<SelectorPair, InvalidFieldError> {
    let group: GroupField = group_field.parse()?;
    let measure: MeasureField = measure_field.parse()?;
    let pair = SelectorPair { group, measure };
    ensure_in_schema(pair, table)?;
    Ok(pair)
}

fn ensure_in_schema(pair: SelectorPair, table: &RecordTable) -> Result<(), InvalidFieldError> {
    for (field, role) in [
        (pair.group.as_str(), FieldRole::Group),
        (pair.measure.as_str(), FieldRole::Measure),
    ] {
        if !table.has_field(field) {
            return Err(InvalidFieldError {
                field: field.to_string(),
                role,
                reason: InvalidFieldReason::NotInSchema,
            });
        }
    }
    Ok(())
}

/// Build the chart description for an already validated pair.
fn describe(pair: SelectorPair, table: &RecordTable) -> ChartDescription {
    let data = count_combinations(table, pair.group.as_str(), pair.measure.as_str());

    debug!(
        "Recomputed {} x {}: {} combinations over {} rows ({} skipped)",
        pair.group,
        pair.measure,
        data.rows.len(),
        table.len(),
        data.skipped
    );

    ChartDescription {
        x: pair.measure.as_str().to_string(),
        y: COUNT_COLUMN.to_string(),
        color: pair.group.as_str().to_string(),
        mode: GROUPED_BARS.to_string(),
        hover: vec![pair.group.as_str().to_string()],
        width: CHART_WIDTH,
        height: CHART_HEIGHT,
        data,
    }
}

/// Count rows per observed `(group value, measure value)` pair.
///
/// Output order is first appearance of the group value, then first
/// appearance of the measure value. Rows missing either value are skipped.
pub fn count_combinations(
    table: &RecordTable,
    group_field: &str,
    measure_field: &str,
) -> CountTable {
    let mut group_order: HashMap<&Value, usize> = HashMap::new();
    let mut measure_order: HashMap<&Value, usize> = HashMap::new();
    let mut counts: HashMap<(usize, usize), usize> = HashMap::new();
    let mut groups: Vec<&Value> = Vec::new();
    let mut measures: Vec<&Value> = Vec::new();
    let mut skipped = 0;

    for row in table.rows() {
        let group = table.value(row, group_field);
        let measure = table.value(row, measure_field);
        if group.is_missing() || measure.is_missing() {
            skipped += 1;
            continue;
        }

        let g = *group_order.entry(group).or_insert_with(|| {
            groups.push(group);
            groups.len() - 1
        });
        let m = *measure_order.entry(measure).or_insert_with(|| {
            measures.push(measure);
            measures.len() - 1
        });

        *counts.entry((g, m)).or_default() += 1;
    }

    let mut keys: Vec<(usize, usize)> = counts.keys().copied().collect();
    keys.sort_unstable();

    let rows = keys
        .into_iter()
        .map(|(g, m)| CountRow {
            group: groups[g].clone(),
            measure: measures[m].clone(),
            count: counts[&(g, m)],
        })
        .collect();

    CountTable {
        group_field: group_field.to_string(),
        measure_field: measure_field.to_string(),
        rows,
        skipped,
    }
}

/// The interactive chart bound to one immutable record table.
#[derive(Debug, Clone)]
pub struct AggregationView {
    table: Arc<RecordTable>,
}

impl AggregationView {
    /// Create a view over a loaded table.
    pub fn new(table: Arc<RecordTable>) -> Self {
        Self { table }
    }

    /// The table this view reads from.
    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    /// Recompute for a pair of field names.
    pub fn recompute(
        &self,
        group_field: &str,
        measure_field: &str,
    ) -> Result<ChartDescription, InvalidFieldError> {
        recompute(group_field, measure_field, &self.table)
    }

    /// Recompute for an already parsed pair, still checking the schema.
    pub fn render(&self, pair: SelectorPair) -> Result<ChartDescription, InvalidFieldError> {
        ensure_in_schema(pair, &self.table)?;
        Ok(describe(pair, &self.table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[(&str, Value)]) -> Vec<(String, Value)> {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn scenario_table() -> RecordTable {
        let pairs = [
            ("male", "very satisfied"),
            ("male", "very satisfied"),
            ("male", "somewhat satisfied"),
            ("female", "very satisfied"),
            ("female", "very satisfied"),
            ("female", "somewhat satisfied"),
        ];

        RecordTable::from_ordered_rows(
            pairs
                .iter()
                .map(|(sex, sat)| row(&[("sex", (*sex).into()), ("satjob", (*sat).into())]))
                .collect(),
        )
    }

    fn survey_table() -> RecordTable {
        let sexes = ["male", "female"];
        let regions = ["pacific", "new england", "mountain"];
        let answers = ["agree", "disagree", "strongly agree", "strongly disagree"];
        let educations = [12.0, 16.0, 12.0, 18.0, 20.0];

        RecordTable::from_ordered_rows(
            (0..40)
                .map(|i| {
                    row(&[
                        ("sex", sexes[i % 2].into()),
                        ("region", regions[(i * 7) % 3].into()),
                        ("education", educations[(i * 3) % 5].into()),
                        ("satjob", answers[(i * 5) % 4].into()),
                        ("relationship", answers[(i / 3) % 4].into()),
                        ("male_breadwinner", answers[(i * i) % 4].into()),
                        ("men_bettersuited", answers[(i / 5) % 2].into()),
                        ("child_suffer", answers[(i + 1) % 3].into()),
                        ("men_overwork", answers[(i * 11) % 4].into()),
                    ])
                })
                .collect(),
        )
    }

    #[test]
    fn test_scenario_counts() {
        let table = scenario_table();
        let chart = recompute("sex", "satjob", &table).unwrap();

        let counts: Vec<usize> = chart.data.rows.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![2, 1, 2, 1]);
        assert_eq!(chart.data.total(), 6);

        assert_eq!(chart.data.rows[0].group, Value::from("male"));
        assert_eq!(chart.data.rows[0].measure, Value::from("very satisfied"));
        assert_eq!(chart.data.rows[3].group, Value::from("female"));
        assert_eq!(chart.data.rows[3].measure, Value::from("somewhat satisfied"));
    }

    #[test]
    fn test_chart_tags() {
        let chart = recompute("sex", "satjob", &scenario_table()).unwrap();
        assert_eq!(chart.x, "satjob");
        assert_eq!(chart.y, "count");
        assert_eq!(chart.color, "sex");
        assert_eq!(chart.mode, GROUPED_BARS);
        assert_eq!(chart.hover, vec!["sex".to_string()]);
    }

    #[test]
    fn test_serialized_rows_resolve_chart_columns() {
        let table = survey_table();
        let chart = recompute("region", "satjob", &table).unwrap();
        let json = serde_json::to_value(&chart).unwrap();

        let rows = json["data"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), chart.data.rows.len());
        for (value, row) in rows.iter().zip(&chart.data.rows) {
            assert_eq!(value[chart.x.as_str()], row.measure.to_string());
            assert_eq!(value[chart.color.as_str()], row.group.to_string());
            assert_eq!(value[chart.y.as_str()], row.count);
        }
    }

    #[test]
    fn test_count_conservation_for_all_pairs() {
        let table = survey_table();
        for group in GroupField::names() {
            for measure in MeasureField::names() {
                let chart = recompute(group, measure, &table).unwrap();
                assert_eq!(chart.data.total(), table.len(), "{} x {}", group, measure);
                assert_eq!(chart.data.skipped, 0);
            }
        }
    }

    #[test]
    fn test_no_empty_groups() {
        let table = survey_table();
        for group in GroupField::names() {
            for measure in MeasureField::names() {
                let chart = recompute(group, measure, &table).unwrap();
                assert!(chart.data.rows.iter().all(|r| r.count >= 1));

                for r in &chart.data.rows {
                    let observed = table.rows().iter().any(|row| {
                        table.value(row, group) == &r.group
                            && table.value(row, measure) == &r.measure
                    });
                    assert!(observed);
                }
            }
        }
    }

    #[test]
    fn test_determinism() {
        let table = survey_table();
        let first = recompute("region", "relationship", &table).unwrap();
        let second = recompute("region", "relationship", &table).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_symmetry_of_field_roles() {
        let table = survey_table();
        let forward = count_combinations(&table, "sex", "satjob");
        let swapped = count_combinations(&table, "satjob", "sex");

        let mut a: Vec<(String, String, usize)> = forward
            .rows
            .iter()
            .map(|r| (r.group.to_string(), r.measure.to_string(), r.count))
            .collect();
        let mut b: Vec<(String, String, usize)> = swapped
            .rows
            .iter()
            .map(|r| (r.measure.to_string(), r.group.to_string(), r.count))
            .collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);

        let chart = recompute("sex", "satjob", &table).unwrap();
        assert_eq!((chart.x.as_str(), chart.color.as_str()), ("satjob", "sex"));
    }

    #[test]
    fn test_numeric_group_key() {
        let table = survey_table();
        let chart = recompute("education", "satjob", &table).unwrap();
        let mut educations: Vec<String> =
            chart.data.rows.iter().map(|r| r.group.to_string()).collect();
        educations.sort();
        educations.dedup();
        assert_eq!(educations, vec!["12", "16", "18", "20"]);
    }

    #[test]
    fn test_invalid_group_selector() {
        let err = recompute("income", "satjob", &survey_table()).unwrap_err();
        assert_eq!(err.field, "income");
        assert_eq!(err.role, FieldRole::Group);
        assert_eq!(err.reason, InvalidFieldReason::NotAnOption);
    }

    #[test]
    fn test_invalid_measure_selector() {
        let err = recompute("sex", "region", &survey_table()).unwrap_err();
        assert_eq!(err.role, FieldRole::Measure);
        assert_eq!(err.reason, InvalidFieldReason::NotAnOption);
    }

    #[test]
    fn test_selector_missing_from_schema() {
        let err = recompute("region", "satjob", &scenario_table()).unwrap_err();
        assert_eq!(err.field, "region");
        assert_eq!(err.reason, InvalidFieldReason::NotInSchema);

        let err = recompute("sex", "men_overwork", &scenario_table()).unwrap_err();
        assert_eq!(err.role, FieldRole::Measure);
        assert_eq!(err.reason, InvalidFieldReason::NotInSchema);
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let table = RecordTable::from_ordered_rows(vec![
            row(&[("sex", "male".into()), ("satjob", "very satisfied".into())]),
            row(&[("sex", "male".into()), ("satjob", Value::Missing)]),
            row(&[("sex", "female".into())]),
            row(&[("sex", "female".into()), ("satjob", "very satisfied".into())]),
        ]);

        let chart = recompute("sex", "satjob", &table).unwrap();
        assert_eq!(chart.data.rows.len(), 2);
        assert_eq!(chart.data.skipped, 2);
        assert_eq!(chart.data.total() + chart.data.skipped, table.len());
    }

    #[test]
    fn test_view_render_matches_recompute() {
        let view = AggregationView::new(Arc::new(survey_table()));
        let pair = SelectorPair {
            group: GroupField::Region,
            measure: MeasureField::ChildSuffer,
        };
        assert_eq!(
            view.render(pair).unwrap(),
            view.recompute("region", "child_suffer").unwrap()
        );
    }
}
