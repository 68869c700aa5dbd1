//! Batch similarity over the outcome, deliverable and assessment texts of a syllabus.

/// Dense similarity matrix.
pub mod matrix;
/// English stop-word list.
pub mod stopwords;
/// TF-IDF term space.
pub mod vectorizer;

pub use matrix::SimilarityMatrix;
pub use vectorizer::{TermMatrix, TfidfVectorizer, VectorizationError};

use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;

use crate::{evaluator::PairwiseScores, table::NormalizedRow, telemetry::AlignmentTelemetry};

/// Role a text plays within a syllabus row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRole {
    /// Stated learning outcome.
    Outcome,
    /// Deliverable produced by students.
    Deliverable,
    /// Assessment instrument.
    Assessment,
}

impl TextRole {
    /// Roles in corpus order.
    pub const ALL: [Self; 3] = [Self::Outcome, Self::Deliverable, Self::Assessment];

    const fn block(self) -> usize {
        match self {
            Self::Outcome => 0,
            Self::Deliverable => 1,
            Self::Assessment => 2,
        }
    }

    /// Corpus index of `row` in this role for a batch of `rows` rows.
    #[must_use]
    pub const fn corpus_index(self, row: usize, rows: usize) -> usize {
        self.block() * rows + row
    }
}

/// Similarity lookups addressed by `(row, role)` instead of flat corpus indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSimilarity {
    rows: usize,
    matrix: SimilarityMatrix,
}

impl RoleSimilarity {
    /// Wraps a matrix built over `rows` rows in role-major order.
    #[must_use]
    pub const fn new(rows: usize, matrix: SimilarityMatrix) -> Self {
        Self { rows, matrix }
    }

    /// Row count the corpus was laid out for.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Underlying matrix.
    #[must_use]
    pub const fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    /// Similarity of two roles of the same row; 0 when the matrix is too small.
    #[must_use]
    pub fn score(&self, row: usize, left: TextRole, right: TextRole) -> f64 {
        self.matrix
            .get(
                left.corpus_index(row, self.rows),
                right.corpus_index(row, self.rows),
            )
            .unwrap_or(0.0)
    }

    /// The three cross-role scores for `row`.
    #[must_use]
    pub fn pairwise(&self, row: usize) -> PairwiseScores {
        PairwiseScores {
            outcome_deliverable: self.score(row, TextRole::Outcome, TextRole::Deliverable),
            outcome_assessment: self.score(row, TextRole::Outcome, TextRole::Assessment),
            deliverable_assessment: self.score(row, TextRole::Deliverable, TextRole::Assessment),
        }
    }
}

/// Builds the TF-IDF space once per batch and scores every pair of texts.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    vectorizer: TfidfVectorizer,
    telemetry: Option<AlignmentTelemetry>,
}

impl SimilarityEngine {
    /// Creates an engine capping the vocabulary at `max_features` terms.
    #[must_use]
    pub fn new(max_features: usize, telemetry: Option<AlignmentTelemetry>) -> Self {
        Self {
            vectorizer: TfidfVectorizer::new(max_features),
            telemetry,
        }
    }

    /// Pairwise similarity of `texts`. Never fails: an unusable corpus yields a zero matrix.
    #[must_use]
    pub fn compute_similarity(&self, texts: &[String]) -> SimilarityMatrix {
        if texts.iter().all(String::is_empty) {
            self.log(
                LogLevel::Debug,
                "alignment.similarity.empty_corpus",
                json!({ "texts": texts.len() }),
            );
            return SimilarityMatrix::zeros(texts.len());
        }
        match self.vectorizer.fit_transform(texts) {
            Ok(terms) => {
                self.log(
                    LogLevel::Debug,
                    "alignment.similarity.vectorized",
                    json!({ "texts": texts.len(), "vocabulary": terms.vocabulary().len() }),
                );
                SimilarityMatrix::from_terms(&terms)
            }
            Err(err) => {
                self.log(
                    LogLevel::Warn,
                    "alignment.similarity.fallback",
                    json!({ "texts": texts.len(), "reason": err.to_string() }),
                );
                SimilarityMatrix::zeros(texts.len())
            }
        }
    }

    /// Lays out outcomes, then deliverables, then assessments and scores them as one corpus.
    #[must_use]
    pub fn compute_for_rows(&self, rows: &[NormalizedRow]) -> RoleSimilarity {
        let corpus: Vec<String> = TextRole::ALL
            .iter()
            .flat_map(|&role| rows.iter().map(move |row| row.text(role).to_string()))
            .collect();
        RoleSimilarity::new(rows.len(), self.compute_similarity(&corpus))
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new(1000, None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use shared_logging::MemoryLogger;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn empty_corpus_yields_zero_matrix() {
        let matrix = SimilarityEngine::default().compute_similarity(&texts(&["", "", ""]));
        assert_eq!(matrix, SimilarityMatrix::zeros(3));
    }

    #[test]
    fn stop_word_corpus_falls_back_and_logs() {
        let sink = Arc::new(MemoryLogger::default());
        let telemetry = AlignmentTelemetry::builder("alignment")
            .sink(sink.clone())
            .build()
            .unwrap();
        let engine = SimilarityEngine::new(1000, Some(telemetry));
        let matrix = engine.compute_similarity(&texts(&["the", "of and"]));
        assert_eq!(matrix, SimilarityMatrix::zeros(2));
        assert!(sink
            .messages()
            .contains(&"alignment.similarity.fallback".to_string()));
    }

    #[test]
    fn output_is_reproducible() {
        let corpus = texts(&[
            "Analyze algorithmic approaches",
            "Algorithm analysis report",
            "Technical report on algorithm efficiency",
        ]);
        let engine = SimilarityEngine::default();
        let first = engine.compute_similarity(&corpus);
        let second = engine.compute_similarity(&corpus);
        let bits = |m: &SimilarityMatrix| {
            m.rows()
                .flat_map(|r| r.iter().map(|v| v.to_bits()))
                .collect::<Vec<_>>()
        };
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn role_lookup_uses_row_major_blocks() {
        let rows = vec![
            NormalizedRow::new("rust ownership", "rust ownership essay", "exam"),
            NormalizedRow::new("python typing", "typing lab", "python typing test"),
        ];
        let similarity = SimilarityEngine::default().compute_for_rows(&rows);
        assert_eq!(similarity.matrix().dimension(), 6);
        assert_eq!(TextRole::Assessment.corpus_index(1, 2), 5);
        let first = similarity.pairwise(0);
        assert!(first.outcome_deliverable > 0.5);
        assert_eq!(first.outcome_assessment, 0.0);
        let second = similarity.pairwise(1);
        assert!(second.outcome_assessment > 0.0);
    }

    #[test]
    fn short_matrix_lookups_degrade_to_zero() {
        let similarity = RoleSimilarity::new(2, SimilarityMatrix::zeros(3));
        assert_eq!(
            similarity.score(1, TextRole::Deliverable, TextRole::Assessment),
            0.0
        );
        assert_eq!(similarity.pairwise(1), PairwiseScores::default());
    }
}
