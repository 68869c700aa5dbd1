use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{config::ColumnAliases, normalizer::normalize, similarity::TextRole};

/// Schema errors raised while turning an input table into syllabus rows.
#[derive(Debug, Error)]
pub enum TableError {
    /// None of the accepted learning-outcome headers is present.
    #[error("learning outcomes column not found (expected one of {expected:?}, found {found:?})")]
    MissingColumn {
        /// Accepted header names.
        expected: Vec<String>,
        /// Headers present in the table.
        found: Vec<String>,
    },
}

/// Errors raised while reading a table document.
#[derive(Debug, Error)]
pub enum TableLoadError {
    /// Malformed JSON table document.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One syllabus entry as supplied by the table loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusRow {
    /// Stated learning outcome.
    pub learning_outcome: Option<String>,
    /// Deliverable, if the table has such a column.
    pub deliverable: Option<String>,
    /// Assessment, if the table has such a column.
    pub assessment: Option<String>,
}

impl SyllabusRow {
    /// Row with all three fields present.
    #[must_use]
    pub fn new(
        learning_outcome: impl Into<String>,
        deliverable: impl Into<String>,
        assessment: impl Into<String>,
    ) -> Self {
        Self {
            learning_outcome: Some(learning_outcome.into()),
            deliverable: Some(deliverable.into()),
            assessment: Some(assessment.into()),
        }
    }

    /// Cleans every field; absent fields become empty strings.
    #[must_use]
    pub fn normalized(&self) -> NormalizedRow {
        NormalizedRow {
            outcome: normalize(self.learning_outcome.as_deref()),
            deliverable: normalize(self.deliverable.as_deref()),
            assessment: normalize(self.assessment.as_deref()),
        }
    }
}

/// Row after normalisation, the form consumed by similarity and evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRow {
    outcome: String,
    deliverable: String,
    assessment: String,
}

impl NormalizedRow {
    /// Builds a row from already clean texts.
    #[must_use]
    pub fn new(
        outcome: impl Into<String>,
        deliverable: impl Into<String>,
        assessment: impl Into<String>,
    ) -> Self {
        Self {
            outcome: outcome.into(),
            deliverable: deliverable.into(),
            assessment: assessment.into(),
        }
    }

    /// Text for `role`.
    #[must_use]
    pub fn text(&self, role: TextRole) -> &str {
        match role {
            TextRole::Outcome => &self.outcome,
            TextRole::Deliverable => &self.deliverable,
            TextRole::Assessment => &self.assessment,
        }
    }
}

/// Column-oriented input table with free-form headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyllabusTable {
    /// Headers in first-seen order.
    pub columns: Vec<String>,
    /// Records keyed by header. Missing keys read as empty cells.
    pub records: Vec<IndexMap<String, Value>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TableDocument {
    Records(Vec<IndexMap<String, Value>>),
    Table {
        columns: Vec<String>,
        #[serde(default)]
        records: Vec<IndexMap<String, Value>>,
    },
}

impl SyllabusTable {
    /// Empty table with a fixed schema.
    #[must_use]
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            records: Vec::new(),
        }
    }

    /// Table whose schema is the union of the records' keys.
    #[must_use]
    pub fn from_records(records: Vec<IndexMap<String, Value>>) -> Self {
        Self::with_declared(Vec::new(), records)
    }

    fn with_declared(declared: Vec<String>, records: Vec<IndexMap<String, Value>>) -> Self {
        let mut columns: IndexSet<String> = declared.into_iter().collect();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.insert(key.clone());
                }
            }
        }
        Self {
            columns: columns.into_iter().collect(),
            records,
        }
    }

    /// Parses either an array of objects or `{ "columns": [...], "records": [...] }`.
    pub fn from_json_str(raw: &str) -> Result<Self, TableLoadError> {
        let document: TableDocument = serde_json::from_str(raw)?;
        Ok(match document {
            TableDocument::Records(records) => Self::from_records(records),
            TableDocument::Table { columns, records } => Self::with_declared(columns, records),
        })
    }

    /// Appends a record, extending the schema with unseen keys.
    pub fn push_record(&mut self, record: IndexMap<String, Value>) {
        for key in record.keys() {
            if !self.columns.contains(key) {
                self.columns.push(key.clone());
            }
        }
        self.records.push(record);
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First alias present in the schema. Headers compare after whitespace normalisation.
    #[must_use]
    pub fn resolve_column(&self, aliases: &[String]) -> Option<&str> {
        aliases.iter().find_map(|alias| {
            let wanted = normalize(Some(alias));
            self.columns
                .iter()
                .find(|column| normalize(Some(column)) == wanted)
                .map(String::as_str)
        })
    }

    /// Maps records to rows. Fails only when no outcome column exists.
    pub fn to_rows(&self, aliases: &ColumnAliases) -> Result<Vec<SyllabusRow>, TableError> {
        let outcome = self
            .resolve_column(&aliases.learning_outcome)
            .ok_or_else(|| TableError::MissingColumn {
                expected: aliases.learning_outcome.clone(),
                found: self.columns.clone(),
            })?;
        let deliverable = self.resolve_column(&aliases.deliverable);
        let assessment = self.resolve_column(&aliases.assessment);

        Ok(self
            .records
            .iter()
            .map(|record| SyllabusRow {
                learning_outcome: cell_text(record.get(outcome)),
                deliverable: deliverable.and_then(|column| cell_text(record.get(column))),
                assessment: assessment.and_then(|column| cell_text(record.get(column))),
            })
            .collect())
    }
}

fn cell_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> IndexMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_outcome_column_is_schema_error() {
        let table = SyllabusTable::from_records(vec![record(json!({ "Deliverables": "Quiz" }))]);
        let err = table.to_rows(&ColumnAliases::default()).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn { .. }));
        assert!(err.to_string().contains("Learning Outcomes"));
    }

    #[test]
    fn optional_columns_default_to_absent() {
        let table = SyllabusTable::from_records(vec![record(
            json!({ "Learning Outcomes": "Apply recursion", "Credits": 3 }),
        )]);
        let rows = table.to_rows(&ColumnAliases::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].deliverable, None);
        assert_eq!(rows[0].normalized().text(TextRole::Assessment), "");
    }

    #[test]
    fn first_listed_alias_wins() {
        let table = SyllabusTable::from_records(vec![record(json!({
            "Learning Outcomes": "Analyze data",
            "Assessments": "second alias",
            "Assessment": "first alias",
            "Deliverables/ Outcomes": "multi-line header",
            "Deliverables": "plain header"
        }))]);
        let rows = table.to_rows(&ColumnAliases::default()).unwrap();
        assert_eq!(rows[0].assessment.as_deref(), Some("first alias"));
        assert_eq!(rows[0].deliverable.as_deref(), Some("multi-line header"));
    }

    #[test]
    fn parses_both_json_layouts() {
        let records = SyllabusTable::from_json_str(
            r#"[{"Learning Outcomes": "Explain closures", "Assessment": null}]"#,
        )
        .unwrap();
        assert_eq!(records.columns, vec!["Learning Outcomes", "Assessment"]);
        let rows = records.to_rows(&ColumnAliases::default()).unwrap();
        assert_eq!(rows[0].assessment, None);

        let declared = SyllabusTable::from_json_str(
            r#"{"columns": ["Learning Outcomes", "Deliverables"], "records": []}"#,
        )
        .unwrap();
        assert!(declared.is_empty());
        assert!(declared.to_rows(&ColumnAliases::default()).unwrap().is_empty());
    }

    #[test]
    fn malformed_document_is_a_load_error() {
        let err = SyllabusTable::from_json_str(r#"{"records": 3}"#).unwrap_err();
        assert!(matches!(err, TableLoadError::Json(_)));
    }

    #[test]
    fn numeric_cells_become_text() {
        let mut table = SyllabusTable::new(["Learning Outcomes"]);
        table.push_record(record(json!({ "Learning Outcomes": 42, "Assessment": true })));
        let rows = table.to_rows(&ColumnAliases::default()).unwrap();
        assert_eq!(rows[0].learning_outcome.as_deref(), Some("42"));
        assert_eq!(rows[0].assessment.as_deref(), Some("true"));
        assert_eq!(table.columns.len(), 2);
    }

    #[test]
    fn normalizes_each_field() {
        let row = SyllabusRow {
            learning_outcome: Some("  Design\\n a  parser ".into()),
            deliverable: None,
            assessment: Some("Code review".into()),
        };
        let normalized = row.normalized();
        assert_eq!(normalized.text(TextRole::Outcome), "Design a parser");
        assert_eq!(normalized.text(TextRole::Deliverable), "");
    }
}
