//! Presentation of analysis reports. The analyzer itself never prints.

use crate::{
    analyzer::{AnalysisReport, AnalysisResult, SummaryStatistics},
    evaluator::AlignmentVerdict,
};

/// Output format accepted by [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Plain-text table and summary.
    #[default]
    Text,
    /// Pretty-printed JSON of the whole report.
    Json,
}

impl ReportFormat {
    /// Parses `text` or `json`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Renders `report` in `format`.
pub fn render(report: &AnalysisReport, format: ReportFormat) -> serde_json::Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => render_json(report),
    }
}

/// Pretty JSON including run metadata.
pub fn render_json(report: &AnalysisReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Human-readable results followed by the summary block.
#[must_use]
pub fn render_text(report: &AnalysisReport) -> String {
    let mut lines = vec!["ANALYSIS RESULTS".to_string(), "-".repeat(50)];
    if report.results.is_empty() {
        lines.push("(no syllabus entries)".to_string());
    }
    for result in &report.results {
        lines.extend(result_lines(result));
    }
    lines.push(String::new());
    lines.extend(summary_lines(&report.summary));
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn result_lines(result: &AnalysisResult) -> Vec<String> {
    vec![
        format!(
            "Row {} [{}] semantic {:.3} | Bloom {} ({})",
            result.row,
            result.overall_alignment,
            result.semantic_score,
            result.bloom_alignment,
            result.outcome_bloom_levels
        ),
        format!("  Outcome: {}", result.learning_outcome),
        format!("  Feedback: {}", result.feedback),
    ]
}

/// Summary block: verdict counts with shares, mean score and Bloom alignment.
#[must_use]
pub fn summary_lines(summary: &SummaryStatistics) -> Vec<String> {
    let mut lines = vec![
        "SUMMARY STATISTICS".to_string(),
        "-".repeat(40),
        format!("Total Entries: {}", summary.total_entries),
    ];
    for verdict in AlignmentVerdict::ALL {
        let tally = summary.tally(verdict);
        lines.push(format!("{verdict}: {} ({:.1}%)", tally.count, tally.percentage));
    }
    lines.push(String::new());
    lines.push(format!(
        "Average Semantic Score: {:.3}",
        summary.average_semantic_score
    ));
    lines.push(format!(
        "Bloom's Taxonomy Alignment: {}/{} ({:.1}%)",
        summary.bloom_aligned.count, summary.total_entries, summary.bloom_aligned.percentage
    ));
    lines
}
