use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bloom::{BloomClassifier, BloomTagSet};

/// Default semantic threshold separating aligned from unaligned content.
pub const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.3;

/// Cross-role similarities for one syllabus row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PairwiseScores {
    /// Outcome vs deliverable.
    pub outcome_deliverable: f64,
    /// Outcome vs assessment.
    pub outcome_assessment: f64,
    /// Deliverable vs assessment.
    pub deliverable_assessment: f64,
}

impl PairwiseScores {
    /// Arithmetic mean of the three scores.
    #[must_use]
    pub fn mean(&self) -> f64 {
        (self.outcome_deliverable + self.outcome_assessment + self.deliverable_assessment) / 3.0
    }
}

/// Whether the outcome shares a Bloom level with a deliverable or assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloomAlignment {
    /// At least one shared level.
    Aligned,
    /// No shared level.
    Misaligned,
}

impl BloomAlignment {
    /// Report label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Aligned => "Aligned",
            Self::Misaligned => "Misaligned",
        }
    }

    /// True for [`BloomAlignment::Aligned`].
    #[must_use]
    pub const fn is_aligned(self) -> bool {
        matches!(self, Self::Aligned)
    }
}

impl fmt::Display for BloomAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Overall verdict for a syllabus row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlignmentVerdict {
    /// Semantic and cognitive signals both pass.
    Aligned,
    /// Exactly one signal passes.
    PartiallyAligned,
    /// Neither signal passes.
    Misaligned,
}

impl AlignmentVerdict {
    /// Verdicts in report order.
    pub const ALL: [Self; 3] = [Self::Aligned, Self::PartiallyAligned, Self::Misaligned];

    /// Fuses the two boolean signals.
    #[must_use]
    pub const fn fuse(semantic_aligned: bool, bloom_aligned: bool) -> Self {
        match (semantic_aligned, bloom_aligned) {
            (true, true) => Self::Aligned,
            (true, false) | (false, true) => Self::PartiallyAligned,
            (false, false) => Self::Misaligned,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Aligned => "Aligned",
            Self::PartiallyAligned => "Partially Aligned",
            Self::Misaligned => "Misaligned",
        }
    }
}

impl fmt::Display for AlignmentVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canned feedback, one per combination of the two signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    /// Both signals pass.
    Excellent,
    /// Content matches, Bloom levels do not.
    SemanticOnly,
    /// Bloom levels match, content does not.
    BloomOnly,
    /// Neither passes.
    NeedsWork,
}

impl Feedback {
    /// Picks the message for the signal combination.
    #[must_use]
    pub const fn select(semantic_aligned: bool, bloom_aligned: bool) -> Self {
        match (semantic_aligned, bloom_aligned) {
            (true, true) => Self::Excellent,
            (true, false) => Self::SemanticOnly,
            (false, true) => Self::BloomOnly,
            (false, false) => Self::NeedsWork,
        }
    }

    /// Message shown to the course designer.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Excellent => {
                "Excellent alignment! Both semantic content and cognitive levels are well-matched."
            }
            Self::SemanticOnly => {
                "Good semantic alignment, but cognitive levels may need adjustment. Consider revising Bloom's verbs."
            }
            Self::BloomOnly => {
                "Cognitive levels are appropriate, but content relevance could be improved."
            }
            Self::NeedsWork => {
                "Both semantic and cognitive alignment need improvement. Review content and learning objectives."
            }
        }
    }
}

/// Per-row output of the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentAssessment {
    /// Mean of the pairwise similarities, unrounded.
    pub semantic_score: f64,
    /// Bloom overlap signal.
    pub bloom_alignment: BloomAlignment,
    /// Fused verdict.
    pub verdict: AlignmentVerdict,
    /// Selected feedback.
    pub feedback: Feedback,
    /// Levels detected in the outcome.
    pub outcome_tags: BloomTagSet,
    /// Levels detected in the deliverable.
    pub deliverable_tags: BloomTagSet,
    /// Levels detected in the assessment.
    pub assessment_tags: BloomTagSet,
}

/// Fuses semantic similarity and Bloom overlap into a verdict.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentEvaluator {
    classifier: BloomClassifier,
    semantic_threshold: f64,
}

impl AlignmentEvaluator {
    /// Creates an evaluator; `semantic_threshold` is compared with `>=`.
    #[must_use]
    pub const fn new(semantic_threshold: f64) -> Self {
        Self {
            classifier: BloomClassifier::new(),
            semantic_threshold,
        }
    }

    /// Threshold in use.
    #[must_use]
    pub const fn semantic_threshold(&self) -> f64 {
        self.semantic_threshold
    }

    /// Evaluates one row from its three normalised texts and pairwise similarities.
    #[must_use]
    pub fn evaluate(
        &self,
        outcome: &str,
        deliverable: &str,
        assessment: &str,
        scores: PairwiseScores,
    ) -> AlignmentAssessment {
        let semantic_score = scores.mean();
        let outcome_tags = self.classifier.classify(outcome);
        let deliverable_tags = self.classifier.classify(deliverable);
        let assessment_tags = self.classifier.classify(assessment);

        let bloom_alignment = if outcome_tags.intersects(&deliverable_tags)
            || outcome_tags.intersects(&assessment_tags)
        {
            BloomAlignment::Aligned
        } else {
            BloomAlignment::Misaligned
        };
        let semantic_aligned = semantic_score >= self.semantic_threshold;
        let bloom_aligned = bloom_alignment.is_aligned();

        AlignmentAssessment {
            semantic_score,
            bloom_alignment,
            verdict: AlignmentVerdict::fuse(semantic_aligned, bloom_aligned),
            feedback: Feedback::select(semantic_aligned, bloom_aligned),
            outcome_tags,
            deliverable_tags,
            assessment_tags,
        }
    }
}

impl Default for AlignmentEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_SEMANTIC_THRESHOLD)
    }
}
