//! Core data types for disclosure analysis.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Ticker`] - Trading symbol/ticker
//! - [`SectionKind`] - Item 1A or Item 1C
//! - [`FilingSections`] - Extracted section texts for one 10-K
//! - [`FilingDocument`] - A source's answer for one ticker and fiscal year
//! - [`FilingRecord`] - One row of the filings table
//! - [`SpecificityCategory`] / [`SpecificityAssessment`] - LLM-based specificity judgments

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Marker inserted between Item 1A and Item 1C in a combined text.
pub const ITEM_1C_MARKER: &str = "--- ITEM 1C ---";

/// Delimiter used to join Item 1A and Item 1C into one combined text.
pub const ITEM_1C_DELIMITER: &str = "\n\n--- ITEM 1C ---\n\n";

/// A trading symbol/ticker.
///
/// Tickers are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Creates a new ticker from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Ticker {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Ticker> for String {
    fn from(t: Ticker) -> Self {
        t.0
    }
}

/// A 10-K disclosure section under study.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    /// Item 1A, "Risk Factors".
    RiskFactors,
    /// Item 1C, "Cybersecurity" (required from fiscal 2023).
    Cybersecurity,
}

impl SectionKind {
    /// All section kinds in filing order.
    pub const ALL: [Self; 2] = [Self::RiskFactors, Self::Cybersecurity];

    /// Short item label ("1A" or "1C").
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::RiskFactors => "1A",
            Self::Cybersecurity => "1C",
        }
    }

    /// File stem used when the section is archived as text.
    #[must_use]
    pub const fn archive_stem(&self) -> &'static str {
        match self {
            Self::RiskFactors => "Item_1A_RiskFactors",
            Self::Cybersecurity => "Item_1C_Cybersecurity",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item {}", self.label())
    }
}

/// Extracted section texts of a single 10-K.
///
/// Empty or whitespace-only texts are treated as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingSections {
    /// Item 1A text.
    pub risk_factors: Option<String>,
    /// Item 1C text.
    pub cybersecurity: Option<String>,
}

impl FilingSections {
    /// Creates sections, dropping blank texts.
    #[must_use]
    pub fn new(risk_factors: Option<String>, cybersecurity: Option<String>) -> Self {
        Self {
            risk_factors: risk_factors.filter(|t| !t.trim().is_empty()),
            cybersecurity: cybersecurity.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Returns the text of one section.
    #[must_use]
    pub fn get(&self, kind: SectionKind) -> Option<&str> {
        match kind {
            SectionKind::RiskFactors => self.risk_factors.as_deref(),
            SectionKind::Cybersecurity => self.cybersecurity.as_deref(),
        }
    }

    /// Returns true if Item 1C is present.
    #[must_use]
    pub const fn has_cybersecurity(&self) -> bool {
        self.cybersecurity.is_some()
    }

    /// Returns true if neither section is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.risk_factors.is_none() && self.cybersecurity.is_none()
    }

    /// Joins the sections into one text.
    ///
    /// When both are present they are separated by [`ITEM_1C_DELIMITER`] so the
    /// text can be split back apart later.
    #[must_use]
    pub fn combined_text(&self) -> Option<String> {
        match (&self.risk_factors, &self.cybersecurity) {
            (Some(a), Some(c)) => Some(format!("{a}{ITEM_1C_DELIMITER}{c}")),
            (Some(a), None) => Some(a.clone()),
            (None, Some(c)) => Some(c.clone()),
            (None, None) => None,
        }
    }
}

/// Sections of one 10-K as returned by a [`FilingSource`](crate::FilingSource).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingDocument {
    /// Company ticker.
    pub ticker: Ticker,
    /// Registrant name as reported by the source.
    pub company_name: String,
    /// Fiscal year of the report (year of the period of report).
    pub year: i32,
    /// End of the reporting period, if known.
    pub report_date: Option<NaiveDate>,
    /// Date the filing was submitted, if known.
    pub filing_date: Option<NaiveDate>,
    /// Extracted sections.
    pub sections: FilingSections,
}

impl FilingDocument {
    /// Creates a document with required fields.
    #[must_use]
    pub fn new(
        ticker: Ticker,
        company_name: impl Into<String>,
        year: i32,
        sections: FilingSections,
    ) -> Self {
        Self {
            ticker,
            company_name: company_name.into(),
            year,
            report_date: None,
            filing_date: None,
            sections,
        }
    }

    /// Sets the report and filing dates.
    #[must_use]
    pub const fn with_dates(
        mut self,
        report_date: Option<NaiveDate>,
        filing_date: Option<NaiveDate>,
    ) -> Self {
        self.report_date = report_date;
        self.filing_date = filing_date;
        self
    }

    /// Converts the document into a filings table row.
    #[must_use]
    pub fn into_record(self, sector: impl Into<String>) -> FilingRecord {
        FilingRecord {
            combined_text: self.sections.combined_text(),
            has_1c: self.sections.has_cybersecurity(),
            ticker: self.ticker,
            company_name: self.company_name,
            sector: sector.into(),
            year: self.year,
        }
    }
}

/// One row of the filings table, keyed by (ticker, year).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRecord {
    /// Company ticker.
    pub ticker: Ticker,
    /// Registrant name.
    pub company_name: String,
    /// Sector the ticker was sampled from.
    pub sector: String,
    /// Fiscal year.
    pub year: i32,
    /// Whether Item 1C was found.
    pub has_1c: bool,
    /// Item 1A and Item 1C joined by [`ITEM_1C_DELIMITER`].
    pub combined_text: Option<String>,
}

/// Disclosure categories judged by the completion model.
///
/// The first six are specificity markers. [`Self::LlmBoilerplate`] is recorded
/// for reference but never counts towards the specificity score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecificityCategory {
    /// Named industry frameworks (NIST CSF, ISO 27001, SOC 2, ...).
    Frameworks,
    /// Concrete controls (MFA, EDR, SIEM, penetration testing, ...).
    SpecificControls,
    /// Named roles, people or committees.
    NamedIndividuals,
    /// Cyber-related figures and metrics.
    QuantitativeData,
    /// Security product or platform names.
    ProductNames,
    /// Granular technical descriptions.
    TechnicalDetails,
    /// Model-judged amount of boilerplate.
    LlmBoilerplate,
}

impl SpecificityCategory {
    /// The six specificity markers.
    pub const MARKERS: [Self; 6] = [
        Self::Frameworks,
        Self::SpecificControls,
        Self::NamedIndividuals,
        Self::QuantitativeData,
        Self::ProductNames,
        Self::TechnicalDetails,
    ];

    /// Every judged category, markers first.
    pub const ALL: [Self; 7] = [
        Self::Frameworks,
        Self::SpecificControls,
        Self::NamedIndividuals,
        Self::QuantitativeData,
        Self::ProductNames,
        Self::TechnicalDetails,
        Self::LlmBoilerplate,
    ];

    /// Key used in model responses and table columns.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Frameworks => "frameworks",
            Self::SpecificControls => "specific_controls",
            Self::NamedIndividuals => "named_individuals",
            Self::QuantitativeData => "quantitative_data",
            Self::ProductNames => "product_names",
            Self::TechnicalDetails => "technical_details",
            Self::LlmBoilerplate => "llm_boilerplate",
        }
    }

    /// Returns true for the six categories that make up the specificity score.
    #[must_use]
    pub const fn is_marker(&self) -> bool {
        !matches!(self, Self::LlmBoilerplate)
    }
}

impl fmt::Display for SpecificityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single category judgment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryJudgment {
    /// Score (0/1 for markers, a phrase count for boilerplate).
    pub score: Option<i64>,
    /// Evidence quoted by the model.
    pub rationale: Option<String>,
}

/// Specificity judgments for one filing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecificityAssessment {
    /// Company ticker.
    pub ticker: Ticker,
    /// Fiscal year.
    pub year: i32,
    /// Judgments keyed by category; missing categories were not returned.
    pub judgments: BTreeMap<SpecificityCategory, CategoryJudgment>,
    /// Sum of marker scores divided by the number of markers.
    pub specificity_score: f64,
}

impl SpecificityAssessment {
    /// Returns the score of one category, if judged.
    #[must_use]
    pub fn score(&self, category: SpecificityCategory) -> Option<i64> {
        self.judgments.get(&category).and_then(|j| j.score)
    }

    /// Returns true if the model produced no judgment at all.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.judgments.values().all(|j| j.score.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_uppercases() {
        assert_eq!(Ticker::new(" crwd ").as_str(), "CRWD");
        let t: Ticker = "aapl".parse().unwrap();
        assert_eq!(t, Ticker::from("AAPL"));
    }

    #[test]
    fn test_ticker_serde_is_plain_string() {
        let json = serde_json::to_string(&Ticker::new("nke")).unwrap();
        assert_eq!(json, "\"NKE\"");
        let back: Ticker = serde_json::from_str("\"pep\"").unwrap();
        assert_eq!(back.as_str(), "PEP");
    }

    #[test]
    fn test_combined_text_with_both_sections() {
        let sections = FilingSections::new(Some("risk".into()), Some("cyber".into()));
        assert_eq!(
            sections.combined_text().as_deref(),
            Some("risk\n\n--- ITEM 1C ---\n\ncyber")
        );
        assert!(sections.has_cybersecurity());
    }

    #[test]
    fn test_combined_text_single_or_none() {
        let only_1a = FilingSections::new(Some("risk".into()), None);
        assert_eq!(only_1a.combined_text().as_deref(), Some("risk"));

        let only_1c = FilingSections::new(None, Some("cyber".into()));
        assert_eq!(only_1c.combined_text().as_deref(), Some("cyber"));

        let blank = FilingSections::new(Some("   ".into()), Some(String::new()));
        assert!(blank.is_empty());
        assert_eq!(blank.combined_text(), None);
    }

    #[test]
    fn test_into_record() {
        let doc = FilingDocument::new(
            Ticker::new("S"),
            "SentinelOne, Inc.",
            2024,
            FilingSections::new(Some("a".into()), Some("c".into())),
        );
        let record = doc.into_record("Cybersecurity");
        assert_eq!(record.sector, "Cybersecurity");
        assert!(record.has_1c);
        assert_eq!(record.year, 2024);
        assert!(record.combined_text.unwrap().contains(ITEM_1C_MARKER));
    }

    #[test]
    fn test_category_keys_round_trip_through_serde() {
        for category in SpecificityCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.key()));
        }
        assert_eq!(
            SpecificityCategory::MARKERS
                .iter()
                .filter(|c| c.is_marker())
                .count(),
            6
        );
        assert!(!SpecificityCategory::LlmBoilerplate.is_marker());
    }

    #[test]
    fn test_section_labels() {
        assert_eq!(SectionKind::RiskFactors.label(), "1A");
        assert_eq!(
            SectionKind::Cybersecurity.archive_stem(),
            "Item_1C_Cybersecurity"
        );
        assert_eq!(SectionKind::Cybersecurity.to_string(), "Item 1C");
    }
}
