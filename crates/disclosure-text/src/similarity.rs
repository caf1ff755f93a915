//! Year-over-year similarity.
//!
//! Two comparisons are offered. [`yoy_similarity`] works on combined filing
//! texts with long word n-grams (4 to 6), which only overlap when sentences
//! are carried over verbatim. [`section_similarity`] compares a single item
//! between two years on stop-word-filtered unigrams.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tfidf::{TfidfVectorizer, cosine_similarity};

/// N-gram range used for copy-paste detection.
pub const YOY_NGRAM_RANGE: (usize, usize) = (4, 6);

/// Rounds to 4 decimal places.
#[must_use]
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Cosine similarity between this year's and last year's combined text.
///
/// Returns `None` when either text is missing or empty, or when neither text
/// has enough tokens to form a 4-gram.
#[must_use]
pub fn yoy_similarity(current: Option<&str>, previous: Option<&str>) -> Option<f64> {
    let current = current.filter(|t| !t.is_empty())?;
    let previous = previous.filter(|t| !t.is_empty())?;

    let matrix = TfidfVectorizer::new()
        .with_ngram_range(YOY_NGRAM_RANGE.0, YOY_NGRAM_RANGE.1)
        .fit_transform(&[current, previous]);
    if matrix.is_empty() {
        return None;
    }

    Some(round4(cosine_similarity(&matrix.rows[0], &matrix.rows[1])))
}

/// Unigram similarity of one item between two years, English stop words removed.
///
/// Returns `None` when the texts share no usable vocabulary at all.
#[must_use]
pub fn section_similarity(older: &str, newer: &str) -> Option<f64> {
    let matrix = TfidfVectorizer::new()
        .with_english_stop_words()
        .fit_transform(&[older, newer]);
    if matrix.is_empty() {
        return None;
    }
    Some(cosine_similarity(&matrix.rows[0], &matrix.rows[1]))
}

/// Terms whose TF-IDF weight grew the most from `older` to `newer`.
///
/// Uses unigrams and bigrams with English stop words. At most `n` terms are
/// returned, all with a positive increase, largest first.
#[must_use]
pub fn top_new_terms(older: &str, newer: &str, n: usize) -> Vec<String> {
    let matrix = TfidfVectorizer::new()
        .with_ngram_range(1, 2)
        .with_english_stop_words()
        .fit_transform(&[older, newer]);
    if matrix.is_empty() {
        return Vec::new();
    }

    let mut diffs: Vec<(usize, f64)> = (0..matrix.vocabulary.len())
        .map(|col| (col, matrix.rows[1].get(col) - matrix.rows[0].get(col)))
        .collect();
    // Ties resolve to the later column first.
    diffs.sort_by(|a, b| b.1.total_cmp(&a.1).then(b.0.cmp(&a.0)));

    diffs
        .into_iter()
        .take(n)
        .filter(|(_, d)| *d > 0.0)
        .map(|(col, _)| matrix.vocabulary[col].clone())
        .collect()
}

/// Classification of a similarity score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SimilarityCategory {
    /// Above 0.98: the text barely changed.
    Boilerplate,
    /// Above 0.90: incremental edits.
    Adaptive,
    /// Everything else.
    Dynamic,
}

impl SimilarityCategory {
    /// Classifies a score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > 0.98 {
            Self::Boilerplate
        } else if score > 0.90 {
            Self::Adaptive
        } else {
            Self::Dynamic
        }
    }

    /// Label with its sort prefix, as used in reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Boilerplate => "1. Boilerplate",
            Self::Adaptive => "2. Adaptive",
            Self::Dynamic => "3. Dynamic",
        }
    }
}

impl fmt::Display for SimilarityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
