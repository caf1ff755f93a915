#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/disclosure/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Section extraction and text metrics for 10-K disclosures.
//!
//! Everything in this crate is synchronous and side-effect free:
//!
//! - [`sections`] - HTML to text, Item 1A / Item 1C extraction, combined-text splitting
//! - [`normalize`] - Normalization and word counting
//! - [`boilerplate`] - Boilerplate phrase ratio
//! - [`length`] - Per-section word counts
//! - [`tfidf`] - Word n-gram TF-IDF and cosine similarity
//! - [`similarity`] - Year-over-year similarity, categories and new terms
//! - [`specificity`] - Specificity prompt and response parsing

/// Boilerplate phrase detection.
pub mod boilerplate;
/// Per-section word counts.
pub mod length;
/// Text normalization helpers.
pub mod normalize;
/// Section extraction from 10-K documents.
pub mod sections;
/// Year-over-year similarity.
pub mod similarity;
/// Specificity prompt and response handling.
pub mod specificity;
/// English stop words.
pub mod stop_words;
/// TF-IDF vectorization.
pub mod tfidf;

pub use boilerplate::{BOILERPLATE_PHRASES, BoilerplateDetector, BoilerplateScore};
pub use length::{SectionLengths, section_lengths};
pub use normalize::{normalize, preprocess, word_count};
pub use sections::{
    MIN_SECTION_WORDS, extract_section, extract_sections, html_to_text, split_combined,
};
pub use similarity::{
    SimilarityCategory, YOY_NGRAM_RANGE, round4, section_similarity, top_new_terms,
    yoy_similarity,
};
pub use specificity::{
    MAX_PROMPT_TEXT_CHARS, MIN_SCORABLE_CHARS, SPECIFICITY_PROMPT, assessment, build_prompt,
    failed_assessment, parse_response, specificity_score,
};
pub use stop_words::{ENGLISH_STOP_WORDS, is_stop_word};
pub use tfidf::{SparseVector, TfidfMatrix, TfidfVectorizer, cosine_similarity};
