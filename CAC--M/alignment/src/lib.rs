#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! Constructive alignment checker: scores how well a syllabus's learning
//! outcomes, deliverables and assessments agree in content and in Bloom level.

/// Free-text cleanup applied to every table cell.
#[path = "../normalizer.rs"]
pub mod normalizer;

/// Keyword-based Bloom's taxonomy classification.
#[path = "../bloom.rs"]
pub mod bloom;

/// TF-IDF vector space and pairwise cosine similarity.
#[path = "../similarity/main.rs"]
pub mod similarity;

/// Verdict fusion and canned feedback.
#[path = "../evaluator.rs"]
pub mod evaluator;

/// Input table model and column resolution.
#[path = "../table.rs"]
pub mod table;

/// Analyzer configuration surfaced to operators.
#[path = "../config.rs"]
pub mod config;

/// Telemetry wrapper over the shared logging sinks.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Whole-syllabus analysis entry point.
#[path = "../main.rs"]
pub mod analyzer;

/// Text and JSON rendering of analysis reports.
#[path = "../report.rs"]
pub mod report;

/// Built-in demonstration syllabus.
#[path = "../sample.rs"]
pub mod sample;

pub use analyzer::{
    AnalysisError, AnalysisReport, AnalysisResult, SummaryStatistics, SyllabusAnalyzer,
    VerdictTally,
};
pub use bloom::{BloomClassifier, BloomLevel, BloomTagSet};
pub use config::{AnalyzerConfig, ColumnAliases};
pub use evaluator::{
    AlignmentAssessment, AlignmentEvaluator, AlignmentVerdict, BloomAlignment, Feedback,
    PairwiseScores,
};
pub use normalizer::normalize;
pub use report::{render, render_json, render_text, ReportFormat};
pub use similarity::{
    RoleSimilarity, SimilarityEngine, SimilarityMatrix, TextRole, VectorizationError,
};
pub use table::{NormalizedRow, SyllabusRow, SyllabusTable, TableError, TableLoadError};
pub use telemetry::{AlignmentTelemetry, AlignmentTelemetryBuilder};
