use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::AnalyzerConfig,
    evaluator::{AlignmentEvaluator, AlignmentVerdict, BloomAlignment},
    similarity::{SimilarityEngine, TextRole},
    table::{NormalizedRow, SyllabusRow, SyllabusTable, TableError},
    telemetry::AlignmentTelemetry,
};

/// Errors that abort an analysis run. Nothing partial is returned.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The input lacks a learning outcomes column.
    #[error("schema error: {0}")]
    Schema(#[from] TableError),
    /// More rows than the configured cap.
    #[error("{rows} rows exceed the configured limit of {limit}")]
    RowLimit {
        /// Rows supplied.
        rows: usize,
        /// Configured cap.
        limit: usize,
    },
}

/// Result for one syllabus row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 1-based row number.
    pub row: usize,
    /// Outcome preview, truncated with `...`.
    pub learning_outcome: String,
    /// Mean pairwise similarity rounded to three decimals.
    pub semantic_score: f64,
    /// Bloom overlap signal.
    pub bloom_alignment: BloomAlignment,
    /// Fused verdict.
    pub overall_alignment: AlignmentVerdict,
    /// Outcome Bloom levels, comma-joined.
    pub outcome_bloom_levels: String,
    /// Feedback for the course designer.
    pub feedback: String,
}

/// Count and share of rows in one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VerdictTally {
    /// Number of rows.
    pub count: usize,
    /// Share of all rows, 0..=100. Zero for an empty batch.
    pub percentage: f64,
}

impl VerdictTally {
    fn new(count: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / total as f64
        };
        Self { count, percentage }
    }
}

/// Aggregate view over all results of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Rows analysed.
    pub total_entries: usize,
    /// Rows judged aligned.
    pub aligned: VerdictTally,
    /// Rows judged partially aligned.
    pub partially_aligned: VerdictTally,
    /// Rows judged misaligned.
    pub misaligned: VerdictTally,
    /// Mean of the rounded semantic scores, rounded to three decimals.
    pub average_semantic_score: f64,
    /// Rows whose Bloom levels line up.
    pub bloom_aligned: VerdictTally,
}

impl SummaryStatistics {
    /// Derives the summary from per-row results.
    #[must_use]
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        let total = results.len();
        let count_verdict = |verdict: AlignmentVerdict| {
            results
                .iter()
                .filter(|result| result.overall_alignment == verdict)
                .count()
        };
        let bloom = results
            .iter()
            .filter(|result| result.bloom_alignment.is_aligned())
            .count();
        let average_semantic_score = if total == 0 {
            0.0
        } else {
            round3(results.iter().map(|result| result.semantic_score).sum::<f64>() / total as f64)
        };
        Self {
            total_entries: total,
            aligned: VerdictTally::new(count_verdict(AlignmentVerdict::Aligned), total),
            partially_aligned: VerdictTally::new(
                count_verdict(AlignmentVerdict::PartiallyAligned),
                total,
            ),
            misaligned: VerdictTally::new(count_verdict(AlignmentVerdict::Misaligned), total),
            average_semantic_score,
            bloom_aligned: VerdictTally::new(bloom, total),
        }
    }

    /// Tally for `verdict`.
    #[must_use]
    pub const fn tally(&self, verdict: AlignmentVerdict) -> VerdictTally {
        match verdict {
            AlignmentVerdict::Aligned => self.aligned,
            AlignmentVerdict::PartiallyAligned => self.partially_aligned,
            AlignmentVerdict::Misaligned => self.misaligned,
        }
    }
}

/// Output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Run correlation id.
    pub run_id: Uuid,
    /// Completion time.
    pub generated_at: DateTime<Utc>,
    /// Per-row results in input order.
    pub results: Vec<AnalysisResult>,
    /// Aggregates over `results`.
    pub summary: SummaryStatistics,
}

/// Scores every row of a syllabus against one shared similarity space.
#[derive(Debug, Clone)]
pub struct SyllabusAnalyzer {
    config: AnalyzerConfig,
    engine: SimilarityEngine,
    evaluator: AlignmentEvaluator,
    telemetry: Option<AlignmentTelemetry>,
}

impl SyllabusAnalyzer {
    /// Creates an analyzer from an already validated configuration.
    #[must_use]
    pub fn new(config: AnalyzerConfig, telemetry: Option<AlignmentTelemetry>) -> Self {
        let engine = SimilarityEngine::new(config.max_features, telemetry.clone());
        let evaluator = AlignmentEvaluator::new(config.semantic_threshold);
        Self {
            config,
            engine,
            evaluator,
            telemetry,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Resolves the table's columns, then analyses its rows.
    pub fn analyze_table(&self, table: &SyllabusTable) -> Result<AnalysisReport, AnalysisError> {
        let rows = table.to_rows(&self.config.columns).map_err(|err| {
            self.log(
                LogLevel::Error,
                "alignment.analysis.schema_error",
                json!({ "columns": table.columns, "reason": err.to_string() }),
            );
            AnalysisError::from(err)
        })?;
        self.analyze(&rows)
    }

    /// Analyses rows in order. The similarity space is built once for the whole batch.
    pub fn analyze(&self, rows: &[SyllabusRow]) -> Result<AnalysisReport, AnalysisError> {
        if let Some(limit) = self.config.max_rows {
            if rows.len() > limit {
                return Err(AnalysisError::RowLimit {
                    rows: rows.len(),
                    limit,
                });
            }
        }
        let run_id = Uuid::new_v4();
        self.log(
            LogLevel::Info,
            "alignment.analysis.start",
            json!({ "run_id": run_id, "rows": rows.len() }),
        );

        let normalized: Vec<NormalizedRow> = rows.iter().map(SyllabusRow::normalized).collect();
        let similarity = self.engine.compute_for_rows(&normalized);

        let results: Vec<AnalysisResult> = normalized
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let outcome = row.text(TextRole::Outcome);
                let assessment = self.evaluator.evaluate(
                    outcome,
                    row.text(TextRole::Deliverable),
                    row.text(TextRole::Assessment),
                    similarity.pairwise(index),
                );
                AnalysisResult {
                    row: index + 1,
                    learning_outcome: preview(outcome, self.config.preview_chars),
                    semantic_score: round3(assessment.semantic_score),
                    bloom_alignment: assessment.bloom_alignment,
                    overall_alignment: assessment.verdict,
                    outcome_bloom_levels: assessment.outcome_tags.joined(),
                    feedback: assessment.feedback.message().to_string(),
                }
            })
            .collect();
        let summary = SummaryStatistics::from_results(&results);

        self.log(
            LogLevel::Info,
            "alignment.analysis.complete",
            json!({
                "run_id": run_id,
                "rows": summary.total_entries,
                "aligned": summary.aligned.count,
                "partially_aligned": summary.partially_aligned.count,
                "misaligned": summary.misaligned.count,
                "average_semantic_score": summary.average_semantic_score,
            }),
        );
        Ok(AnalysisReport {
            run_id,
            generated_at: Utc::now(),
            results,
            summary,
        })
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }
}

impl Default for SyllabusAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default(), None)
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{evaluator::Feedback, sample};
    use indexmap::IndexMap;
    use proptest::prelude::*;
    use serde_json::Value;
    use shared_logging::MemoryLogger;

    fn field() -> impl Strategy<Value = Option<String>> {
        let words = vec![
            "analyze", "design", "explain", "report", "quiz", "algorithm", "the", "evaluate", "",
        ];
        prop::option::of(
            prop::collection::vec(prop::sample::select(words), 0..5)
                .prop_map(|tokens| tokens.join(" ")),
        )
    }

    fn syllabus() -> impl Strategy<Value = Vec<SyllabusRow>> {
        let row = (field(), field(), field()).prop_map(|(outcome, deliverable, assessment)| {
            SyllabusRow {
                learning_outcome: outcome,
                deliverable,
                assessment,
            }
        });
        prop::collection::vec(row, 0..8)
    }

    #[test]
    fn empty_batch_has_zero_summary() {
        let report = SyllabusAnalyzer::default().analyze(&[]).unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.summary, SummaryStatistics::default());
    }

    #[test]
    fn understanding_quiz_is_bloom_aligned() {
        let rows = [SyllabusRow::new(
            "Students will understand basic concepts",
            "Understanding quiz",
            "Understanding quiz",
        )];
        let report = SyllabusAnalyzer::default().analyze(&rows).unwrap();
        let result = &report.results[0];
        assert_eq!(result.row, 1);
        assert_eq!(result.bloom_alignment, BloomAlignment::Aligned);
        assert!(result.semantic_score > 0.0);
        assert!(matches!(
            result.overall_alignment,
            AlignmentVerdict::Aligned | AlignmentVerdict::PartiallyAligned
        ));
        assert_eq!(result.outcome_bloom_levels, "understanding");
    }

    #[test]
    fn empty_fields_are_misaligned() {
        let rows = [SyllabusRow::new("", "", "")];
        let report = SyllabusAnalyzer::default().analyze(&rows).unwrap();
        let result = &report.results[0];
        assert_eq!(result.semantic_score, 0.0);
        assert_eq!(result.outcome_bloom_levels, "Undetected");
        assert_eq!(result.bloom_alignment, BloomAlignment::Misaligned);
        assert_eq!(result.overall_alignment, AlignmentVerdict::Misaligned);
        assert_eq!(result.feedback, Feedback::NeedsWork.message());
        assert_eq!(report.summary.misaligned.count, 1);
        assert!((report.summary.misaligned.percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn near_duplicates_without_verbs_are_partial() {
        let rows = [SyllabusRow::new(
            "Students will do the thing",
            "Students will do the thing",
            "Students do the thing",
        )];
        let report = SyllabusAnalyzer::default().analyze(&rows).unwrap();
        let result = &report.results[0];
        assert!(result.semantic_score >= 0.3);
        assert_eq!(result.bloom_alignment, BloomAlignment::Misaligned);
        assert_eq!(result.overall_alignment, AlignmentVerdict::PartiallyAligned);
        assert_eq!(result.feedback, Feedback::SemanticOnly.message());
    }

    #[test]
    fn missing_outcome_column_aborts() {
        let mut record = IndexMap::new();
        record.insert("Deliverables".to_string(), Value::from("Report"));
        let table = SyllabusTable::from_records(vec![record]);
        let sink = Arc::new(MemoryLogger::default());
        let telemetry = AlignmentTelemetry::builder("alignment")
            .sink(sink.clone())
            .build()
            .unwrap();
        let analyzer = SyllabusAnalyzer::new(AnalyzerConfig::default(), Some(telemetry));
        let err = analyzer.analyze_table(&table).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Schema(TableError::MissingColumn { .. })
        ));
        assert_eq!(sink.messages(), vec!["alignment.analysis.schema_error"]);
    }

    #[test]
    fn row_cap_is_enforced() {
        let config = AnalyzerConfig {
            max_rows: Some(1),
            ..AnalyzerConfig::default()
        };
        let rows = vec![SyllabusRow::default(); 2];
        let err = SyllabusAnalyzer::new(config, None).analyze(&rows).unwrap_err();
        assert!(matches!(err, AnalysisError::RowLimit { rows: 2, limit: 1 }));
    }

    #[test]
    fn results_are_deterministic_and_in_range() {
        let rows = sample::sample_rows();
        let analyzer = SyllabusAnalyzer::default();
        let first = analyzer.analyze(&rows).unwrap();
        let second = analyzer.analyze(&rows).unwrap();
        assert_eq!(first.results, second.results);
        assert_eq!(first.summary, second.summary);
        assert_ne!(first.run_id, second.run_id);
        for result in &first.results {
            assert!((0.0..=1.0).contains(&result.semantic_score));
        }
        let summary = &first.summary;
        assert_eq!(summary.total_entries, 5);
        assert_eq!(
            summary.aligned.count + summary.partially_aligned.count + summary.misaligned.count,
            5
        );
    }

    #[test]
    fn long_outcomes_are_truncated() {
        let long = "Apply ".repeat(30);
        let rows = [SyllabusRow::new(long, "Apply", "Apply")];
        let report = SyllabusAnalyzer::default().analyze(&rows).unwrap();
        let preview = &report.results[0].learning_outcome;
        assert_eq!(preview.chars().count(), 103);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        assert_eq!(preview("héllo", 2), "hé...");
        assert_eq!(preview("short", 100), "short");
        assert_eq!(preview("exact", 5), "exact");
    }

    #[test]
    fn run_logs_start_and_complete() {
        let sink = Arc::new(MemoryLogger::default());
        let telemetry = AlignmentTelemetry::builder("alignment")
            .sink(sink.clone())
            .build()
            .unwrap();
        let analyzer = SyllabusAnalyzer::new(AnalyzerConfig::default(), Some(telemetry));
        analyzer.analyze(&sample::sample_rows()).unwrap();
        let messages = sink.messages();
        assert_eq!(messages.first().unwrap(), "alignment.analysis.start");
        assert_eq!(messages.last().unwrap(), "alignment.analysis.complete");
    }

    proptest! {
        #[test]
        fn prop_summary_accounts_for_every_row(rows in syllabus()) {
            let analyzer = SyllabusAnalyzer::default();
            let report = analyzer.analyze(&rows).unwrap();
            let summary = &report.summary;
            prop_assert_eq!(report.results.len(), rows.len());
            prop_assert_eq!(summary.total_entries, rows.len());
            prop_assert_eq!(
                summary.aligned.count + summary.partially_aligned.count + summary.misaligned.count,
                rows.len()
            );
            let share = summary.aligned.percentage
                + summary.partially_aligned.percentage
                + summary.misaligned.percentage;
            if rows.is_empty() {
                prop_assert_eq!(share, 0.0);
            } else {
                prop_assert!((share - 100.0).abs() < 1e-9);
            }
            for (index, result) in report.results.iter().enumerate() {
                prop_assert_eq!(result.row, index + 1);
                prop_assert!((0.0..=1.0).contains(&result.semantic_score));
            }
            prop_assert!((0.0..=1.0).contains(&summary.average_semantic_score));

            let again = analyzer.analyze(&rows).unwrap();
            prop_assert_eq!(&again.results, &report.results);
        }
    }
}
