#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/disclosure/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! On-disk filing sources.
//!
//! - [`ExtractionArchive`] - Per-section text files grouped by sector, company and year
//! - [`FlatTextDirectory`] - One combined text file per ticker and year

/// Sector/company/year section archive.
pub mod archive;
/// Flat `TICKER_YEAR.txt` directory.
pub mod flat;

pub use archive::{ExtractionArchive, clean_company_name};
pub use flat::{FlatEntry, FlatTextDirectory};
