use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::stopwords::is_stop_word;

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern compiles"));

/// Failures while building the term space.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VectorizationError {
    /// Every document was empty or contained only stop words.
    #[error("empty vocabulary; documents contain only stop words or no tokens")]
    EmptyVocabulary,
    /// The vocabulary cap was zero.
    #[error("max_features must be positive")]
    ZeroFeatureCap,
}

/// Sparse row: `(column, weight)` pairs with ascending columns.
pub type SparseRow = Vec<(usize, f64)>;

/// L2-normalised TF-IDF document vectors.
#[derive(Debug, Clone)]
pub struct TermMatrix {
    vocabulary: BTreeMap<String, usize>,
    rows: Vec<SparseRow>,
}

impl TermMatrix {
    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no documents were vectorised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Term to column mapping, alphabetical.
    #[must_use]
    pub const fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// Sparse vector for document `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&SparseRow> {
        self.rows.get(index)
    }

    /// Cosine similarity of two documents. Rows are unit length, so this is the dot product.
    #[must_use]
    pub fn cosine(&self, a: usize, b: usize) -> f64 {
        match (self.rows.get(a), self.rows.get(b)) {
            (Some(left), Some(right)) => sparse_dot(left, right),
            _ => 0.0,
        }
    }
}

fn sparse_dot(left: &SparseRow, right: &SparseRow) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < left.len() && j < right.len() {
        let (lc, lw) = left[i];
        let (rc, rw) = right[j];
        match lc.cmp(&rc) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += lw * rw;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// Lower-cases `text` and returns its non-stop-word tokens of two or more word characters.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// TF-IDF vectoriser with raw term counts, smoothed idf and a frequency-capped vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct TfidfVectorizer {
    max_features: usize,
}

impl TfidfVectorizer {
    /// Creates a vectoriser keeping at most `max_features` terms.
    #[must_use]
    pub const fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    /// Learns the vocabulary and idf weights from `documents` and vectorises them.
    pub fn fit_transform(&self, documents: &[String]) -> Result<TermMatrix, VectorizationError> {
        if self.max_features == 0 {
            return Err(VectorizationError::ZeroFeatureCap);
        }
        let counts: Vec<BTreeMap<String, usize>> = documents
            .iter()
            .map(|doc| {
                let mut tf = BTreeMap::new();
                for token in tokenize(doc) {
                    *tf.entry(token).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
        for tf in &counts {
            for (term, count) in tf {
                *totals.entry(term.as_str()).or_insert(0) += count;
            }
        }
        if totals.is_empty() {
            return Err(VectorizationError::EmptyVocabulary);
        }

        // Highest corpus frequency first; alphabetical among ties.
        let mut ranked: Vec<(&str, usize)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);
        let mut kept: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort_unstable();
        let vocabulary: BTreeMap<String, usize> = kept
            .into_iter()
            .enumerate()
            .map(|(column, term)| (term.to_string(), column))
            .collect();

        let mut doc_freq = vec![0usize; vocabulary.len()];
        for tf in &counts {
            for term in tf.keys() {
                if let Some(&column) = vocabulary.get(term) {
                    doc_freq[column] += 1;
                }
            }
        }
        let n_docs = documents.len() as f64;
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .iter()
            .map(|tf| {
                let mut row: SparseRow = tf
                    .iter()
                    .filter_map(|(term, &count)| {
                        vocabulary
                            .get(term)
                            .map(|&column| (column, count as f64 * idf[column]))
                    })
                    .collect();
                let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, weight) in &mut row {
                        *weight /= norm;
                    }
                }
                row
            })
            .collect();

        Ok(TermMatrix { vocabulary, rows })
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn tokenizer_drops_stop_words_and_single_chars() {
        assert_eq!(
            tokenize("Students will do the thing, a C++ quiz"),
            vec!["students", "thing", "quiz"]
        );
    }

    #[test]
    fn only_stop_words_is_empty_vocabulary() {
        let err = TfidfVectorizer::default()
            .fit_transform(&docs(&["the and of", ""]))
            .unwrap_err();
        assert_eq!(err, VectorizationError::EmptyVocabulary);
    }

    #[test]
    fn zero_cap_is_rejected() {
        let err = TfidfVectorizer::new(0)
            .fit_transform(&docs(&["rust"]))
            .unwrap_err();
        assert_eq!(err, VectorizationError::ZeroFeatureCap);
    }

    #[test]
    fn vocabulary_cap_keeps_most_frequent_terms() {
        let matrix = TfidfVectorizer::new(2)
            .fit_transform(&docs(&["rust rust rust python", "rust java java", "python"]))
            .unwrap();
        let terms: Vec<&str> = matrix.vocabulary().keys().map(String::as_str).collect();
        // rust=4, java=2, python=2; alphabetical tie-break keeps java.
        assert_eq!(terms, vec!["java", "rust"]);
    }

    #[test]
    fn rows_are_unit_length_and_identical_docs_match() {
        let matrix = TfidfVectorizer::default()
            .fit_transform(&docs(&["project report", "project report", "exam"]))
            .unwrap();
        for index in 0..matrix.len() {
            let norm: f64 = matrix
                .row(index)
                .unwrap()
                .iter()
                .map(|(_, w)| w * w)
                .sum::<f64>()
                .sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
        assert!((matrix.cosine(0, 1) - 1.0).abs() < 1e-12);
        assert_eq!(matrix.cosine(0, 2), 0.0);
        assert_eq!(matrix.cosine(0, 99), 0.0);
    }

    #[test]
    fn smoothed_idf_weights_rare_terms_higher() {
        let matrix = TfidfVectorizer::default()
            .fit_transform(&docs(&["common rare", "common", "common"]))
            .unwrap();
        let vocab = matrix.vocabulary();
        let row = matrix.row(0).unwrap();
        let weight = |term: &str| {
            let column = vocab[term];
            row.iter().find(|(c, _)| *c == column).unwrap().1
        };
        assert!(weight("rare") > weight("common"));
    }
}
