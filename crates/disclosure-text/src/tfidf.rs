//! Word n-gram TF-IDF vectorization.
//!
//! Follows scikit-learn's `TfidfVectorizer` defaults so scores line up with
//! the reference analysis:
//!
//! - lowercase, tokens matching `\b\w\w+\b`
//! - stop words removed before n-grams are formed
//! - raw term counts, smooth IDF `ln((1 + n) / (1 + df)) + 1`
//! - L2 row normalization

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use crate::stop_words::ENGLISH_STOP_WORDS;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid token pattern"));

/// A sparse row vector as sorted `(column, value)` pairs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// Builds a vector from `(column, value)` pairs; zeros are dropped.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let mut entries: Vec<(usize, f64)> = pairs.into_iter().filter(|(_, v)| *v != 0.0).collect();
        entries.sort_by_key(|(i, _)| *i);
        Self { entries }
    }

    /// Non-zero entries in column order.
    #[must_use]
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Value at `column`, or 0.
    #[must_use]
    pub fn get(&self, column: usize) -> f64 {
        self.entries
            .binary_search_by_key(&column, |(i, _)| *i)
            .map_or(0.0, |pos| self.entries[pos].1)
    }

    /// Euclidean norm.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }

    /// Dot product with another sparse vector.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (ci, vi) = self.entries[i];
            let (cj, vj) = other.entries[j];
            match ci.cmp(&cj) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += vi * vj;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Cosine similarity of two sparse vectors; 0 when either norm is 0.
#[must_use]
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 { 0.0 } else { a.dot(b) / denom }
}

/// Result of [`TfidfVectorizer::fit_transform`].
#[derive(Clone, Debug, Default)]
pub struct TfidfMatrix {
    /// Feature names in column order (sorted).
    pub vocabulary: Vec<String>,
    /// One L2-normalized row per input document.
    pub rows: Vec<SparseVector>,
}

impl TfidfMatrix {
    /// Returns true if no features were extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }
}

/// Word n-gram TF-IDF vectorizer.
#[derive(Clone, Debug)]
pub struct TfidfVectorizer {
    ngram_range: (usize, usize),
    stop_words: Option<&'static [&'static str]>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TfidfVectorizer {
    /// Unigrams, no stop words.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ngram_range: (1, 1),
            stop_words: None,
        }
    }

    /// Sets the inclusive n-gram range. A zero lower bound is treated as 1.
    #[must_use]
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        let min_n = min_n.max(1);
        self.ngram_range = (min_n, max_n.max(min_n));
        self
    }

    /// Sets a sorted stop word list.
    #[must_use]
    pub const fn with_stop_words(mut self, stop_words: &'static [&'static str]) -> Self {
        self.stop_words = Some(stop_words);
        self
    }

    /// Uses [`ENGLISH_STOP_WORDS`].
    #[must_use]
    pub const fn with_english_stop_words(self) -> Self {
        self.with_stop_words(&ENGLISH_STOP_WORDS)
    }

    /// Splits a document into its n-gram terms.
    #[must_use]
    pub fn analyze(&self, doc: &str) -> Vec<String> {
        let lowered = doc.to_lowercase();
        let tokens: Vec<&str> = TOKEN_PATTERN
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| {
                self.stop_words
                    .is_none_or(|words| words.binary_search(t).is_err())
            })
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    /// Learns the vocabulary and IDF weights and returns the document rows.
    ///
    /// The vocabulary is empty when no document produced a term.
    #[must_use]
    pub fn fit_transform<S: AsRef<str>>(&self, docs: &[S]) -> TfidfMatrix {
        let counts: Vec<HashMap<String, usize>> = docs
            .iter()
            .map(|doc| {
                let mut tf = HashMap::new();
                for term in self.analyze(doc.as_ref()) {
                    *tf.entry(term).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let vocabulary: Vec<String> = counts
            .iter()
            .flat_map(|tf| tf.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.as_str(), i))
            .collect();

        let mut df = vec![0usize; vocabulary.len()];
        for tf in &counts {
            for term in tf.keys() {
                df[index[term.as_str()]] += 1;
            }
        }

        let n = docs.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .iter()
            .map(|tf| {
                let weighted: BTreeMap<usize, f64> = tf
                    .iter()
                    .map(|(term, &c)| {
                        let col = index[term.as_str()];
                        (col, c as f64 * idf[col])
                    })
                    .collect();
                let norm = weighted.values().map(|v| v * v).sum::<f64>().sqrt();
                SparseVector::from_pairs(
                    weighted
                        .into_iter()
                        .map(|(col, v)| (col, if norm > 0.0 { v / norm } else { v })),
                )
            })
            .collect();

        TfidfMatrix { vocabulary, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_tokens_and_ngrams() {
        let vectorizer = TfidfVectorizer::new().with_ngram_range(1, 2);
        assert_eq!(
            vectorizer.analyze("We use MFA, a SIEM."),
            vec!["we", "use", "mfa", "siem", "we use", "use mfa", "mfa siem"]
        );
    }

    #[test]
    fn test_stop_words_removed_before_ngrams() {
        let vectorizer = TfidfVectorizer::new()
            .with_ngram_range(2, 2)
            .with_english_stop_words();
        assert_eq!(
            vectorizer.analyze("the board of directors oversees risk"),
            vec!["board directors", "directors oversees", "oversees risk"]
        );
    }

    #[test]
    fn test_identical_documents_are_similar() {
        let m = TfidfVectorizer::new().fit_transform(&["zero trust network", "zero trust network"]);
        assert_eq!(m.vocabulary, vec!["network", "trust", "zero"]);
        assert!((cosine_similarity(&m.rows[0], &m.rows[1]) - 1.0).abs() < 1e-12);
        assert!((m.rows[0].norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_smooth_idf_matches_reference() {
        // docs: ["aa bb", "aa cc"]; idf(aa) = 1, idf(bb) = idf(cc) = ln(1.5) + 1.
        let m = TfidfVectorizer::new().fit_transform(&["aa bb", "aa cc"]);
        let w = 1.5f64.ln() + 1.0;
        let norm = (1.0 + w * w).sqrt();
        assert!((m.rows[0].get(0) - 1.0 / norm).abs() < 1e-12);
        assert!((m.rows[0].get(1) - w / norm).abs() < 1e-12);
        assert_eq!(m.rows[0].get(2), 0.0);
        let expected = 1.0 / (norm * norm);
        assert!((cosine_similarity(&m.rows[0], &m.rows[1]) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_empty_vocabulary() {
        let m = TfidfVectorizer::new()
            .with_ngram_range(4, 6)
            .fit_transform(&["too short", "a b c"]);
        assert!(m.is_empty());
        assert_eq!(cosine_similarity(&m.rows[0], &m.rows[1]), 0.0);
    }
}
