use serde::{Deserialize, Serialize};

use super::vectorizer::TermMatrix;

/// Square pairwise similarity matrix over one corpus snapshot, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// All-zero matrix, the fallback for corpora with no usable vocabulary.
    #[must_use]
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Cosine matrix over vectorised documents.
    ///
    /// Entries are clamped to `[0, 1]`, the diagonal is exactly 1 and the lower
    /// triangle mirrors the upper one.
    #[must_use]
    pub fn from_terms(terms: &TermMatrix) -> Self {
        let size = terms.len();
        let mut matrix = Self::zeros(size);
        for i in 0..size {
            matrix.values[i * size + i] = 1.0;
            for j in (i + 1)..size {
                let score = terms.cosine(i, j).clamp(0.0, 1.0);
                matrix.values[i * size + j] = score;
                matrix.values[j * size + i] = score;
            }
        }
        matrix
    }

    /// Number of texts covered.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.size
    }

    /// Similarity between texts `i` and `j`, `None` when out of bounds.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.size && j < self.size {
            self.values.get(i * self.size + j).copied()
        } else {
            None
        }
    }

    /// Iterates rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks(self.size.max(1)).take(self.size)
    }
}
