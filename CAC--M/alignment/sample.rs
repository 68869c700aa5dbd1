use indexmap::IndexMap;
use serde_json::Value;

use crate::table::{SyllabusRow, SyllabusTable};

const SAMPLE: [(&str, &str, &str); 5] = [
    (
        "Students will understand the basic concepts of programming",
        "Programming exercises and quizzes",
        "Written quiz on programming concepts",
    ),
    (
        "Analyze different algorithmic approaches to problem solving",
        "Algorithm analysis report",
        "Technical report on algorithm efficiency",
    ),
    (
        "Create and implement software solutions using Python",
        "Software project with documentation",
        "Project demonstration and code review",
    ),
    (
        "Evaluate the effectiveness of different programming paradigms",
        "Comparative analysis presentation",
        "Presentation with peer evaluation",
    ),
    (
        "Apply object-oriented programming principles in software development",
        "Object-oriented programming assignment",
        "Practical programming exam",
    ),
];

/// Five-row introductory programming syllabus.
#[must_use]
pub fn sample_rows() -> Vec<SyllabusRow> {
    SAMPLE
        .iter()
        .map(|(outcome, deliverable, assessment)| {
            SyllabusRow::new(*outcome, *deliverable, *assessment)
        })
        .collect()
}

/// The sample syllabus as a table with the usual headers.
#[must_use]
pub fn sample_table() -> SyllabusTable {
    let mut table = SyllabusTable::new(["Learning Outcomes", "Deliverables", "Assessment"]);
    for (outcome, deliverable, assessment) in SAMPLE {
        let mut record = IndexMap::new();
        record.insert("Learning Outcomes".to_string(), Value::from(outcome));
        record.insert("Deliverables".to_string(), Value::from(deliverable));
        record.insert("Assessment".to_string(), Value::from(assessment));
        table.push_record(record);
    }
    table
}
