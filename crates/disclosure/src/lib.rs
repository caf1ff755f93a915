#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/disclosure/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! 10-K cybersecurity disclosure pipeline.
//!
//! This crate ties the pipeline together. It re-exports core types, text
//! metrics and source implementations, and provides:
//!
//! - [`FilingRegistry`] - Filing sources with fallback, caching and universe collection
//! - [`analysis`] - Boilerplate, year-over-year similarity and length stages
//! - [`frames`] - Polars tables
//! - [`summary`] - Per-year statistics, Item 1C adoption and similarity split
//! - [`SpecificityScorer`] - Resumable specificity scoring through a completion backend
//!
//! # Features
//!
//! - `edgar` - SEC EDGAR source
//! - `local` - Extraction archive and flat text directory sources
//! - `cache-sqlite` - SQLite-based caching
//!
//! # Example
//!
//! ```rust,ignore
//! use std::collections::HashMap;
//! use disclosure::{FilingRegistry, Universe, analyze, metrics_frame};
//!
//! #[tokio::main]
//! async fn main() -> disclosure::Result<()> {
//!     let registry = FilingRegistry::new()
//!         .with_archive("extractions")
//!         .with_edgar("MyApp/1.0 (contact@example.com)");
//!
//!     let records = registry.collect(&Universe::research_default()).await?;
//!     let metrics = analyze(&records, &HashMap::new());
//!     println!("{:?}", metrics_frame(&metrics)?);
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use disclosure_core::*;

// Text metrics
pub use disclosure_text::{
    BoilerplateDetector, BoilerplateScore, SectionLengths, SimilarityCategory, TfidfVectorizer,
    extract_sections, html_to_text, section_lengths, split_combined, yoy_similarity,
};

// Cache implementations
#[cfg(feature = "cache-sqlite")]
pub use disclosure_cache::SqliteCache;
pub use disclosure_cache::{InMemoryCache, NoopCache};

// Sources
#[cfg(feature = "edgar")]
pub use disclosure_edgar::EdgarSource;
#[cfg(feature = "local")]
pub use disclosure_local::{ExtractionArchive, FlatTextDirectory};

/// Analysis stages over the filings table.
pub mod analysis;
/// Polars tables for pipeline outputs.
pub mod frames;
/// Per-year descriptive statistics.
pub mod summary;

mod registry;
mod scoring;

pub use analysis::{
    BoilerplateRow, CompanyMetadata, DisclosureMetrics, LengthRow, SectionSimilarityRow,
    SimilarityRow, analyze, boilerplate_stage, length_stage, load_metadata, merge_metrics,
    metadata_from_json_str, section_similarity_stage, similarity_stage,
};
pub use frames::{
    LengthGrouping, assessments_frame, length_summary, metrics_frame, records_frame,
    section_similarity_frame,
};
pub use registry::{CollectOptions, FilingRegistry};
pub use scoring::{DEFAULT_MAX_ATTEMPTS, SpecificityScorer};
pub use summary::{
    AdoptionRate, HIGH_SIMILARITY_THRESHOLD, Metric, SimilaritySplit, YearStats,
    adoption_by_year, describe_by_year, similarity_split_by_year,
};
