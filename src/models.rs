//! Data models for the survey dashboard.
//!
//! This module contains the record table, the selector fields and the
//! aggregated outputs that flow from the data source to the report generator.

use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// A single cell of the record table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric value (e.g. years of education).
    Number(f64),
    /// Categorical label.
    Text(String),
    /// Missing or not applicable.
    #[default]
    Missing,
}

impl Value {
    /// Returns true if the value is missing.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Returns the numeric value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Canonical bits for numbers so that 0.0 and -0.0 group together.
    fn number_bits(n: f64) -> u64 {
        if n == 0.0 {
            0.0f64.to_bits()
        } else {
            n.to_bits()
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                Value::number_bits(*a) == Value::number_bits(*b)
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Missing, Value::Missing) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Number(n) => Value::number_bits(*n).hash(state),
            Value::Text(s) => s.hash(state),
            Value::Missing => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => write!(f, "NA"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

/// One survey response.
pub type Record = HashMap<String, Value>;

/// Immutable, ordered collection of survey responses.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    schema: Vec<String>,
    rows: Vec<Record>,
}

impl RecordTable {
    /// Build a table from rows whose field order is significant.
    pub fn from_ordered_rows(rows: Vec<Vec<(String, Value)>>) -> Self {
        let mut schema: Vec<String> = Vec::new();
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            let mut record = Record::with_capacity(row.len());
            for (field, value) in row {
                if !schema.contains(&field) {
                    schema.push(field.clone());
                }
                record.insert(field, value);
            }
            records.push(record);
        }

        Self {
            schema,
            rows: records,
        }
    }

    /// Field names present in the table.
    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    /// Returns true if the field appears in the schema.
    pub fn has_field(&self, field: &str) -> bool {
        self.schema.iter().any(|f| f == field)
    }

    /// All rows, in load order.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Value of `field` in `row`, missing if absent.
    pub fn value<'a>(&self, row: &'a Record, field: &str) -> &'a Value {
        const MISSING: &Value = &Value::Missing;
        row.get(field).unwrap_or(MISSING)
    }
}

/// Role a selector plays in the interactive chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    /// Bar colour / grouping selector.
    Group,
    /// X-axis / measure selector.
    Measure,
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRole::Group => write!(f, "group-by"),
            FieldRole::Measure => write!(f, "x-axis"),
        }
    }
}

/// Why a selector value was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidFieldReason {
    /// Not one of the allowed options for its role.
    NotAnOption,
    /// Allowed, but the loaded table has no such column.
    NotInSchema,
}

/// A selector value outside its allowed set or absent from the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe_invalid_field(.field, .role, .reason))]
pub struct InvalidFieldError {
    pub field: String,
    pub role: FieldRole,
    pub reason: InvalidFieldReason,
}

fn describe_invalid_field(field: &str, role: &FieldRole, reason: &InvalidFieldReason) -> String {
    match reason {
        InvalidFieldReason::NotAnOption => {
            let options = match role {
                FieldRole::Group => GroupField::names(),
                FieldRole::Measure => MeasureField::names(),
            };
            format!(
                "invalid {} field '{}' (expected one of: {})",
                role,
                field,
                options.join(", ")
            )
        }
        InvalidFieldReason::NotInSchema => {
            format!("{} field '{}' is not present in the data", role, field)
        }
    }
}

/// Fields the interactive chart may group (colour) by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Sex,
    Region,
    Education,
}

impl GroupField {
    pub const ALL: [GroupField; 3] = [GroupField::Sex, GroupField::Region, GroupField::Education];

    /// Column name in the record table.
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupField::Sex => "sex",
            GroupField::Region => "region",
            GroupField::Education => "education",
        }
    }

    /// All option names, in dropdown order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.as_str()).collect()
    }
}

impl fmt::Display for GroupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupField {
    type Err = InvalidFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| InvalidFieldError {
                field: s.to_string(),
                role: FieldRole::Group,
                reason: InvalidFieldReason::NotAnOption,
            })
    }
}

/// Survey questions the interactive chart may put on the x-axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureField {
    Satjob,
    Relationship,
    MaleBreadwinner,
    MenBettersuited,
    ChildSuffer,
    MenOverwork,
}

impl MeasureField {
    pub const ALL: [MeasureField; 6] = [
        MeasureField::Satjob,
        MeasureField::Relationship,
        MeasureField::MaleBreadwinner,
        MeasureField::MenBettersuited,
        MeasureField::ChildSuffer,
        MeasureField::MenOverwork,
    ];

    /// Column name in the record table.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureField::Satjob => "satjob",
            MeasureField::Relationship => "relationship",
            MeasureField::MaleBreadwinner => "male_breadwinner",
            MeasureField::MenBettersuited => "men_bettersuited",
            MeasureField::ChildSuffer => "child_suffer",
            MeasureField::MenOverwork => "men_overwork",
        }
    }

    /// All option names, in dropdown order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.as_str()).collect()
    }
}

impl fmt::Display for MeasureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasureField {
    type Err = InvalidFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| InvalidFieldError {
                field: s.to_string(),
                role: FieldRole::Measure,
                reason: InvalidFieldReason::NotAnOption,
            })
    }
}

/// The two user-chosen fields parameterising the interactive chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorPair {
    pub group: GroupField,
    pub measure: MeasureField,
}

impl Default for SelectorPair {
    fn default() -> Self {
        Self {
            group: GroupField::Sex,
            measure: MeasureField::MaleBreadwinner,
        }
    }
}

/// Column holding the number of rows per combination.
pub const COUNT_COLUMN: &str = "count";

/// One observed (group value, measure value) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct CountRow {
    pub group: Value,
    pub measure: Value,
    pub count: usize,
}

/// Per-combination occurrence counts for a selector pair.
///
/// Serialized rows are keyed by the selected field names, so a row of
/// `sex` by `satjob` reads `{"sex": "male", "satjob": "...", "count": 2}`.
#[derive(Debug, Clone, PartialEq)]
pub struct CountTable {
    /// Name of the grouping column.
    pub group_field: String,
    /// Name of the measure column.
    pub measure_field: String,
    /// One row per observed combination, first-seen order.
    pub rows: Vec<CountRow>,
    /// Rows left out because either selected value was missing.
    pub skipped: usize,
}

impl Serialize for CountTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CountTable", 4)?;
        state.serialize_field("group_field", &self.group_field)?;
        state.serialize_field("measure_field", &self.measure_field)?;
        state.serialize_field("rows", &KeyedRows(self))?;
        state.serialize_field("skipped", &self.skipped)?;
        state.end()
    }
}

struct KeyedRows<'a>(&'a CountTable);

impl Serialize for KeyedRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let table = self.0;
        let mut seq = serializer.serialize_seq(Some(table.rows.len()))?;
        for row in &table.rows {
            seq.serialize_element(&KeyedRow { table, row })?;
        }
        seq.end()
    }
}

struct KeyedRow<'a> {
    table: &'a CountTable,
    row: &'a CountRow,
}

impl Serialize for KeyedRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(&self.table.group_field, &self.row.group)?;
        map.serialize_entry(&self.table.measure_field, &self.row.measure)?;
        map.serialize_entry(COUNT_COLUMN, &self.row.count)?;
        map.end()
    }
}

impl CountTable {
    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }
}

/// Declarative grouped bar chart handed to the rendering front-end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDescription {
    /// Column on the x-axis (the measure field).
    pub x: String,
    /// Column on the y-axis, always "count".
    pub y: String,
    /// Column mapped to bar colour (the group field).
    pub color: String,
    /// Bar layout hint.
    pub mode: String,
    /// Extra columns shown on hover.
    pub hover: Vec<String>,
    pub width: u32,
    pub height: u32,
    /// The aggregated data behind the bars.
    pub data: CountTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality_and_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Value::Number(12.0));
        set.insert(Value::Number(12.0));
        set.insert(Value::Number(0.0));
        set.insert(Value::Number(-0.0));
        set.insert(Value::from("12"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Number(16.0).to_string(), "16");
        assert_eq!(Value::Number(12.5).to_string(), "12.5");
        assert_eq!(Value::from("male").to_string(), "male");
        assert_eq!(Value::Missing.to_string(), "NA");
    }

    #[test]
    fn test_value_serde_untagged() {
        let v: Value = serde_json::from_str("\"female\"").unwrap();
        assert_eq!(v, Value::from("female"));
        let v: Value = serde_json::from_str("14").unwrap();
        assert_eq!(v, Value::Number(14.0));
        assert_eq!(serde_json::to_string(&Value::Number(3.0)).unwrap(), "3.0");
    }

    #[test]
    fn test_table_schema_first_appearance() {
        let table = RecordTable::from_ordered_rows(vec![
            vec![("sex".into(), "male".into()), ("satjob".into(), "very satisfied".into())],
            vec![("region".into(), "new england".into()), ("sex".into(), "female".into())],
        ]);
        assert_eq!(table.schema(), ["sex", "satjob", "region"]);
        assert_eq!(table.len(), 2);
        assert!(table.has_field("region"));
        assert!(!table.has_field("income"));
        assert!(table.value(&table.rows()[1], "satjob").is_missing());
    }

    #[test]
    fn test_group_field_from_str() {
        assert_eq!("region".parse::<GroupField>(), Ok(GroupField::Region));
        let err = "income".parse::<GroupField>().unwrap_err();
        assert_eq!(err.role, FieldRole::Group);
        assert_eq!(err.reason, InvalidFieldReason::NotAnOption);
        assert!(err.to_string().contains("sex, region, education"));
    }

    #[test]
    fn test_measure_field_names() {
        assert_eq!(
            MeasureField::names(),
            vec![
                "satjob",
                "relationship",
                "male_breadwinner",
                "men_bettersuited",
                "child_suffer",
                "men_overwork"
            ]
        );
        assert_eq!(
            "child_suffer".parse::<MeasureField>(),
            Ok(MeasureField::ChildSuffer)
        );
        assert!("sex".parse::<MeasureField>().is_err());
    }

    #[test]
    fn test_count_table_rows_keyed_by_field() {
        let table = CountTable {
            group_field: "sex".to_string(),
            measure_field: "education".to_string(),
            rows: vec![
                CountRow {
                    group: Value::from("male"),
                    measure: Value::Number(16.0),
                    count: 2,
                },
                CountRow {
                    group: Value::from("female"),
                    measure: Value::Number(12.0),
                    count: 1,
                },
            ],
            skipped: 3,
        };

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["group_field"], "sex");
        assert_eq!(json["skipped"], 3);
        assert_eq!(
            json["rows"][0],
            serde_json::json!({"sex": "male", "education": 16.0, "count": 2})
        );
        assert_eq!(json["rows"][1]["sex"], "female");
        assert!(json["rows"][1].get("group").is_none());
    }

    #[test]
    fn test_default_selector_pair() {
        let pair = SelectorPair::default();
        assert_eq!(pair.group, GroupField::Sex);
        assert_eq!(pair.measure, MeasureField::MaleBreadwinner);
    }
}
