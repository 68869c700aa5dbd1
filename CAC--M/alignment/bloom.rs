use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

/// Label rendered for a field in which no trigger verb was found.
pub const UNDETECTED: &str = "Undetected";

/// Cognitive levels of Bloom's taxonomy, lowest demand first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BloomLevel {
    /// Recall of facts.
    Remembering,
    /// Explaining ideas.
    Understanding,
    /// Using knowledge in new situations.
    Applying,
    /// Drawing connections among ideas.
    Analyzing,
    /// Justifying a stand or decision.
    Evaluating,
    /// Producing new or original work.
    Creating,
}

impl BloomLevel {
    /// All levels in taxonomy order.
    pub const ALL: [Self; 6] = [
        Self::Remembering,
        Self::Understanding,
        Self::Applying,
        Self::Analyzing,
        Self::Evaluating,
        Self::Creating,
    ];

    /// Lower-case label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Remembering => "remembering",
            Self::Understanding => "understanding",
            Self::Applying => "applying",
            Self::Analyzing => "analyzing",
            Self::Evaluating => "evaluating",
            Self::Creating => "creating",
        }
    }

    /// Trigger verbs for the level.
    #[must_use]
    pub const fn verbs(self) -> &'static [&'static str] {
        match self {
            Self::Remembering => &["remember", "recall", "list", "identify", "name", "state", "define"],
            Self::Understanding => &["understand", "explain", "describe", "summarize", "interpret", "classify"],
            Self::Applying => &["apply", "use", "implement", "demonstrate", "solve", "execute", "operate"],
            Self::Analyzing => &["analyze", "examine", "compare", "contrast", "categorize", "differentiate"],
            Self::Evaluating => &["evaluate", "assess", "judge", "critique", "justify", "defend", "support"],
            Self::Creating => &["create", "design", "develop", "construct", "produce", "generate", "compose"],
        }
    }
}

impl fmt::Display for BloomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Distinct Bloom levels detected in one text field.
///
/// An empty set is reported as [`UNDETECTED`] but never intersects another set,
/// so two fields without trigger verbs do not count as aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomTagSet {
    levels: BTreeSet<BloomLevel>,
}

impl BloomTagSet {
    /// Builds a set from detected levels.
    #[must_use]
    pub fn from_levels(levels: impl IntoIterator<Item = BloomLevel>) -> Self {
        Self {
            levels: levels.into_iter().collect(),
        }
    }

    /// True when no trigger verb was found.
    #[must_use]
    pub fn is_undetected(&self) -> bool {
        self.levels.is_empty()
    }

    /// True when both sets share at least one real level.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.levels.intersection(&other.levels).next().is_some()
    }

    /// Whether `level` was detected.
    #[must_use]
    pub fn contains(&self, level: BloomLevel) -> bool {
        self.levels.contains(&level)
    }

    /// Detected levels in taxonomy order.
    pub fn levels(&self) -> impl Iterator<Item = BloomLevel> + '_ {
        self.levels.iter().copied()
    }

    /// Labels in taxonomy order, or the single `Undetected` sentinel.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        if self.levels.is_empty() {
            vec![UNDETECTED]
        } else {
            self.levels.iter().map(|level| level.label()).collect()
        }
    }

    /// Comma-joined labels, e.g. `"understanding, applying"`.
    #[must_use]
    pub fn joined(&self) -> String {
        self.labels().join(", ")
    }
}

/// Maps free text to Bloom levels by substring lookup of trigger verbs.
///
/// Matching is deliberately not tokenised: `"use"` fires inside `"because"`.
/// Tokenised matching would change verdicts on existing syllabi.
#[derive(Debug, Clone, Copy, Default)]
pub struct BloomClassifier;

impl BloomClassifier {
    /// Creates the classifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Every `(verb, level)` pair whose verb occurs in `text`, in table order.
    #[must_use]
    pub fn extract_verbs(&self, text: &str) -> Vec<(&'static str, BloomLevel)> {
        if text.is_empty() {
            return Vec::new();
        }
        let lowered = text.to_lowercase();
        BloomLevel::ALL
            .iter()
            .flat_map(|&level| level.verbs().iter().map(move |&verb| (verb, level)))
            .filter(|(verb, _)| lowered.contains(verb))
            .collect()
    }

    /// Distinct levels found in `text`.
    #[must_use]
    pub fn classify(&self, text: &str) -> BloomTagSet {
        BloomTagSet::from_levels(self.extract_verbs(text).into_iter().map(|(_, level)| level))
    }
}
