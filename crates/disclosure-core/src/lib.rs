#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/disclosure/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the 10-K cybersecurity disclosure pipeline.
//!
//! This crate provides the foundational abstractions shared by every stage:
//!
//! - [`FilingSource`](provider::FilingSource) - Anything that can produce 10-K sections
//! - [`CompletionClient`](provider::CompletionClient) - Text completion backend for specificity scoring
//! - [`DisclosureCache`](cache::DisclosureCache) - Caching abstraction
//! - [`Universe`](universe::Universe) - Sectors, tickers and fiscal years under study

/// Cache trait for storing fetched filings and assessments.
pub mod cache;
/// Error types for pipeline operations.
pub mod error;
/// Source traits for fetching filings and completions.
pub mod provider;
/// Core data types (Ticker, FilingSections, FilingRecord, etc.).
pub mod types;
/// Study universe and fiscal year rules.
pub mod universe;

// Re-export commonly used items at crate root
pub use cache::DisclosureCache;
pub use error::{DisclosureError, Result};
pub use provider::{CompletionClient, FilingSource, SourceInfo};
pub use types::{
    CategoryJudgment, FilingDocument, FilingRecord, FilingSections, ITEM_1C_DELIMITER,
    ITEM_1C_MARKER, SectionKind, SpecificityAssessment, SpecificityCategory, Ticker,
};
pub use universe::{FIRST_CYBERSECURITY_ITEM_YEAR, Universe, cybersecurity_item_expected};
