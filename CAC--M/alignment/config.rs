use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::evaluator::DEFAULT_SEMANTIC_THRESHOLD;

/// Accepted header names per text role, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnAliases {
    /// Learning outcome headers. At least one is required in the input.
    pub learning_outcome: Vec<String>,
    /// Deliverable headers.
    pub deliverable: Vec<String>,
    /// Assessment headers.
    pub assessment: Vec<String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            learning_outcome: vec!["Learning Outcomes".into()],
            deliverable: vec!["Deliverables/\nOutcomes".into(), "Deliverables".into()],
            assessment: vec!["Assessment".into(), "Assessments".into()],
        }
    }
}

/// Tunables for a syllabus analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Mean similarity at or above which content counts as aligned.
    pub semantic_threshold: f64,
    /// Vocabulary cap for the TF-IDF space.
    pub max_features: usize,
    /// Characters of the outcome kept in result previews.
    pub preview_chars: usize,
    /// Optional cap on rows per run.
    pub max_rows: Option<usize>,
    /// Header aliases.
    pub columns: ColumnAliases,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
            max_features: 1000,
            preview_chars: 100,
            max_rows: None,
            columns: ColumnAliases::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Loads configuration from a TOML file; missing keys take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading analyzer config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.semantic_threshold) {
            bail!(
                "semantic_threshold must be within [0, 1], got {}",
                self.semantic_threshold
            );
        }
        if self.max_features == 0 {
            bail!("max_features must be positive");
        }
        if self.preview_chars == 0 {
            bail!("preview_chars must be positive");
        }
        if self.max_rows == Some(0) {
            bail!("max_rows must be positive when set");
        }
        if self.columns.learning_outcome.is_empty() {
            bail!("columns.learning_outcome needs at least one header name");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cac.toml");
        fs::write(
            &path,
            "semantic_threshold = 0.4\nmax_rows = 500\n\n[columns]\nassessment = [\"Evaluation\"]\n",
        )
        .unwrap();
        let config = AnalyzerConfig::load(&path).unwrap();
        assert!((config.semantic_threshold - 0.4).abs() < f64::EPSILON);
        assert_eq!(config.max_features, 1000);
        assert_eq!(config.max_rows, Some(500));
        assert_eq!(config.columns.assessment, vec!["Evaluation".to_string()]);
        assert_eq!(
            config.columns.learning_outcome,
            vec!["Learning Outcomes".to_string()]
        );
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let err = AnalyzerConfig::from_toml_str("semantic_threshold = 1.5").unwrap_err();
        assert!(err.to_string().contains("semantic_threshold"));
    }

    #[test]
    fn rejects_empty_outcome_aliases() {
        assert!(AnalyzerConfig::from_toml_str("[columns]\nlearning_outcome = []").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AnalyzerConfig::load("/nonexistent/cac.toml").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/cac.toml"));
    }
}
