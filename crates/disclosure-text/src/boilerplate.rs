//! Boilerplate phrase detection.
//!
//! A filing's boilerplate ratio is the number of distinct stock phrases it
//! contains divided by its word count.

use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, preprocess, word_count};

/// Stock phrases that signal generic, non-specific disclosure language.
pub const BOILERPLATE_PHRASES: [&str; 41] = [
    // Hedging and uncertainty
    "we cannot guarantee",
    "we cannot assure",
    "we may be subject to",
    "we may experience",
    "there can be no assurance",
    "we cannot predict",
    "from time to time",
    "could adversely affect",
    "may adversely affect",
    "might adversely affect",
    "could have a material adverse effect",
    "may not be sufficient",
    // Generic threat acknowledgment
    "evolving threat landscape",
    "increasingly sophisticated attacks",
    "cybersecurity threats continue to evolve",
    "growing number of cyber threats",
    "threat actors",
    "malicious actors",
    "unauthorized access to our systems",
    "we face risks from cyberattacks",
    "cybersecurity incidents could affect",
    // Vague controls
    "appropriate technical measures",
    "reasonable security measures",
    "industry standard practices",
    "security measures in place",
    "we have implemented controls",
    "we maintain security policies",
    "security measures may not be effective",
    "we regularly review our security",
    // Regulatory
    "applicable laws and regulations",
    "evolving regulatory landscape",
    "we monitor regulatory developments",
    "compliance with applicable requirements",
    "subject to various laws and regulations",
    "regulatory requirements continue to evolve",
    // Effort without specificity
    "we take cybersecurity seriously",
    "cybersecurity is a priority",
    "we are committed to protecting",
    "we devote significant resources",
    "we continue to invest in cybersecurity",
    "we have a dedicated team",
];

/// Result of boilerplate detection on one text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoilerplateScore {
    /// Number of distinct phrases found (B).
    pub count: usize,
    /// Word count after preprocessing (N).
    pub word_count: usize,
    /// B / N, or 0 when N is 0.
    pub ratio: f64,
    /// Phrases that matched, in dictionary order.
    pub matched: Vec<String>,
}

impl BoilerplateScore {
    /// Ratio scaled to phrases per 10,000 words.
    #[must_use]
    pub fn ratio_per_10k(&self) -> f64 {
        self.ratio * 10_000.0
    }
}

/// Matches a phrase dictionary against normalized text.
#[derive(Clone, Debug)]
pub struct BoilerplateDetector {
    /// (original phrase, normalized phrase)
    phrases: Vec<(String, String)>,
}

impl Default for BoilerplateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BoilerplateDetector {
    /// Creates a detector using [`BOILERPLATE_PHRASES`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_phrases(BOILERPLATE_PHRASES)
    }

    /// Creates a detector with a custom phrase list.
    #[must_use]
    pub fn with_phrases<S: AsRef<str>>(phrases: impl IntoIterator<Item = S>) -> Self {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| (p.as_ref().to_string(), normalize(p.as_ref())))
                .filter(|(_, normalized)| !normalized.is_empty())
                .collect(),
        }
    }

    /// Number of phrases in the dictionary.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    /// Returns true if the dictionary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Scores a text. Each phrase counts at most once.
    #[must_use]
    pub fn compute(&self, text: &str) -> BoilerplateScore {
        if text.is_empty() {
            return BoilerplateScore::default();
        }

        let normalized = normalize(text);
        let matched: Vec<String> = self
            .phrases
            .iter()
            .filter(|(_, phrase)| normalized.contains(phrase.as_str()))
            .map(|(original, _)| original.clone())
            .collect();

        let count = matched.len();
        let words = word_count(&preprocess(text));
        let ratio = if words > 0 {
            count as f64 / words as f64
        } else {
            0.0
        };

        BoilerplateScore {
            count,
            word_count: words,
            ratio,
            matched,
        }
    }
}
