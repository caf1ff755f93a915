//! Analysis stages over the filings table.
//!
//! Each stage reads [`FilingRecord`]s and produces one row per (ticker, year).
//! [`merge_metrics`] joins the stage outputs into a single table.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use disclosure_core::{
    DisclosureError, FilingDocument, FilingRecord, Result, SectionKind, Ticker,
};
use disclosure_text::{
    BoilerplateDetector, BoilerplateScore, SectionLengths, SimilarityCategory, round4,
    section_lengths, section_similarity, top_new_terms, yoy_similarity,
};

/// New terms reported per section comparison.
pub const TOP_NEW_TERMS: usize = 5;

/// Boilerplate detection result for one filing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoilerplateRow {
    /// Company ticker.
    pub ticker: Ticker,
    /// Registrant name.
    pub company_name: String,
    /// Sector.
    pub sector: String,
    /// Fiscal year.
    pub year: i32,
    /// Whether Item 1C was found.
    pub has_1c: bool,
    /// Phrase count, word count, ratio and matched phrases.
    pub score: BoilerplateScore,
}

/// Year-over-year similarity of one filing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRow {
    /// Company ticker.
    pub ticker: Ticker,
    /// Registrant name.
    pub company_name: String,
    /// Sector.
    pub sector: String,
    /// Fiscal year.
    pub year: i32,
    /// Whether Item 1C was found.
    pub has_1c: bool,
    /// Similarity to the previous fiscal year; `None` without one.
    pub yoy_similarity: Option<f64>,
}

/// Size class and market capitalization of a company.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyMetadata {
    /// Size class, e.g. "Large", "Medium" or "Small".
    #[serde(default)]
    pub size: Option<String>,
    /// Market capitalization.
    #[serde(default)]
    pub market_cap: Option<f64>,
}

/// Parses company metadata from a JSON object keyed by ticker.
///
/// ```
/// let metadata = disclosure::metadata_from_json_str(
///     r#"{"nke": {"size": "Large", "market_cap": 1.2e11}, "MCFT": {"size": "Small"}}"#,
/// ).unwrap();
/// assert_eq!(metadata.len(), 2);
/// ```
pub fn metadata_from_json_str(json: &str) -> Result<HashMap<Ticker, CompanyMetadata>> {
    serde_json::from_str(json)
        .map_err(|e| DisclosureError::Parse(format!("Invalid company metadata: {e}")))
}

/// Reads company metadata from a JSON file.
pub fn load_metadata(path: impl AsRef<Path>) -> Result<HashMap<Ticker, CompanyMetadata>> {
    let json = std::fs::read_to_string(path.as_ref())?;
    metadata_from_json_str(&json)
}

/// Section word counts of one filing with company metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LengthRow {
    /// Company ticker.
    pub ticker: Ticker,
    /// Registrant name.
    pub company_name: String,
    /// Sector.
    pub sector: String,
    /// Fiscal year.
    pub year: i32,
    /// Whether Item 1C was found.
    pub has_1c: bool,
    /// Size class from the metadata, if known.
    pub size: Option<String>,
    /// Market capitalization from the metadata, if known.
    pub market_cap: Option<f64>,
    /// Word counts.
    pub lengths: SectionLengths,
}

/// Similarity of one item between two consecutive available years.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionSimilarityRow {
    /// Sector.
    pub sector: String,
    /// Company ticker.
    pub ticker: Ticker,
    /// Compared item.
    pub item: SectionKind,
    /// Years compared, formatted as `"2023-2024"`.
    pub window: String,
    /// Similarity rounded to four decimals.
    pub score: f64,
    /// Classification of the score.
    pub category: SimilarityCategory,
    /// Terms that gained the most weight in the newer year.
    pub new_terms: Vec<String>,
}

/// All metrics of one filing, joined on (ticker, year).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisclosureMetrics {
    /// Company ticker.
    pub ticker: Ticker,
    /// Registrant name.
    pub company_name: String,
    /// Sector.
    pub sector: String,
    /// Fiscal year.
    pub year: i32,
    /// Whether Item 1C was found.
    pub has_1c: bool,
    /// Boilerplate phrases found.
    pub boilerplate_count: Option<usize>,
    /// Boilerplate phrases per word.
    pub boilerplate_ratio: Option<f64>,
    /// Similarity to the previous year.
    pub yoy_similarity: Option<f64>,
    /// Size class.
    pub size: Option<String>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Words in Item 1A.
    pub len_1a: Option<usize>,
    /// Words in Item 1C.
    pub len_1c: Option<usize>,
    /// Words in both items.
    pub len_combined: Option<usize>,
}

/// Runs the boilerplate detector over every record.
#[must_use]
pub fn boilerplate_stage(records: &[FilingRecord]) -> Vec<BoilerplateRow> {
    let detector = BoilerplateDetector::new();
    records
        .iter()
        .map(|r| BoilerplateRow {
            ticker: r.ticker.clone(),
            company_name: r.company_name.clone(),
            sector: r.sector.clone(),
            year: r.year,
            has_1c: r.has_1c,
            score: detector.compute(r.combined_text.as_deref().unwrap_or_default()),
        })
        .collect()
}

/// Compares each record with the same ticker's record for the previous year.
#[must_use]
pub fn similarity_stage(records: &[FilingRecord]) -> Vec<SimilarityRow> {
    let texts: HashMap<(&Ticker, i32), Option<&str>> = records
        .iter()
        .map(|r| ((&r.ticker, r.year), r.combined_text.as_deref()))
        .collect();

    let mut rows: Vec<SimilarityRow> = records
        .iter()
        .map(|r| {
            let previous = texts.get(&(&r.ticker, r.year - 1)).copied().flatten();
            SimilarityRow {
                ticker: r.ticker.clone(),
                company_name: r.company_name.clone(),
                sector: r.sector.clone(),
                year: r.year,
                has_1c: r.has_1c,
                yoy_similarity: yoy_similarity(r.combined_text.as_deref(), previous),
            }
        })
        .collect();
    rows.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.year.cmp(&b.year)));

    debug!(
        rows = rows.len(),
        scored = rows.iter().filter(|r| r.yoy_similarity.is_some()).count(),
        "Computed year-over-year similarity"
    );
    rows
}

/// Counts section words and attaches company metadata.
#[must_use]
pub fn length_stage<S: std::hash::BuildHasher>(
    records: &[FilingRecord],
    metadata: &HashMap<Ticker, CompanyMetadata, S>,
) -> Vec<LengthRow> {
    records
        .iter()
        .map(|r| {
            let meta = metadata.get(&r.ticker).cloned().unwrap_or_default();
            LengthRow {
                ticker: r.ticker.clone(),
                company_name: r.company_name.clone(),
                sector: r.sector.clone(),
                year: r.year,
                has_1c: r.has_1c,
                size: meta.size,
                market_cap: meta.market_cap,
                lengths: section_lengths(r.combined_text.as_deref(), r.has_1c),
            }
        })
        .collect()
}

/// Compares Item 1A and Item 1C of each company between adjacent filing years.
///
/// Documents are grouped by (sector, ticker) and ordered by year. A window is
/// emitted for an item only when both adjacent filings contain it, so a year
/// without Item 1C breaks the 1C chain instead of being skipped over.
#[must_use]
pub fn section_similarity_stage(
    documents: &[(String, FilingDocument)],
) -> Vec<SectionSimilarityRow> {
    let mut companies: BTreeMap<(&str, &Ticker), Vec<&FilingDocument>> = BTreeMap::new();
    for (sector, doc) in documents {
        companies
            .entry((sector.as_str(), &doc.ticker))
            .or_default()
            .push(doc);
    }

    let mut rows = Vec::new();
    for ((sector, ticker), mut docs) in companies {
        docs.sort_by_key(|d| d.year);

        for item in SectionKind::ALL {
            for pair in docs.windows(2) {
                let (older_year, newer_year) = (pair[0].year, pair[1].year);
                let (Some(older), Some(newer)) =
                    (pair[0].sections.get(item), pair[1].sections.get(item))
                else {
                    continue;
                };
                let Some(score) = section_similarity(older, newer) else {
                    continue;
                };
                let score = round4(score);
                rows.push(SectionSimilarityRow {
                    sector: sector.to_string(),
                    ticker: ticker.clone(),
                    item,
                    window: format!("{older_year}-{newer_year}"),
                    score,
                    category: SimilarityCategory::from_score(score),
                    new_terms: top_new_terms(older, newer, TOP_NEW_TERMS),
                });
            }
        }
    }
    rows
}

/// Left-joins similarity and length rows onto the boilerplate rows by (ticker, year).
#[must_use]
pub fn merge_metrics(
    boilerplate: &[BoilerplateRow],
    similarity: &[SimilarityRow],
    lengths: &[LengthRow],
) -> Vec<DisclosureMetrics> {
    let similarity: HashMap<(&Ticker, i32), &SimilarityRow> =
        similarity.iter().map(|r| ((&r.ticker, r.year), r)).collect();
    let lengths: HashMap<(&Ticker, i32), &LengthRow> =
        lengths.iter().map(|r| ((&r.ticker, r.year), r)).collect();

    boilerplate
        .iter()
        .map(|b| {
            let key = (&b.ticker, b.year);
            let sim = similarity.get(&key);
            let len = lengths.get(&key);
            DisclosureMetrics {
                ticker: b.ticker.clone(),
                company_name: b.company_name.clone(),
                sector: b.sector.clone(),
                year: b.year,
                has_1c: b.has_1c,
                boilerplate_count: Some(b.score.count),
                boilerplate_ratio: Some(b.score.ratio),
                yoy_similarity: sim.and_then(|s| s.yoy_similarity),
                size: len.and_then(|l| l.size.clone()),
                market_cap: len.and_then(|l| l.market_cap),
                len_1a: len.map(|l| l.lengths.len_1a),
                len_1c: len.map(|l| l.lengths.len_1c),
                len_combined: len.map(|l| l.lengths.len_combined),
            }
        })
        .collect()
}

/// Runs the boilerplate, similarity and length stages and merges their output.
#[must_use]
pub fn analyze<S: std::hash::BuildHasher>(
    records: &[FilingRecord],
    metadata: &HashMap<Ticker, CompanyMetadata, S>,
) -> Vec<DisclosureMetrics> {
    merge_metrics(
        &boilerplate_stage(records),
        &similarity_stage(records),
        &length_stage(records, metadata),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use disclosure_core::{FilingSections, ITEM_1C_DELIMITER};

    const RISK_2022: &str = "Our business depends on the continued availability of our \
        information systems and we may be subject to cyber attacks that could disrupt \
        operations and harm our reputation with customers and partners across markets.";
    const RISK_2023: &str = "Our business depends on the continued availability of our \
        information systems and we may be subject to cyber attacks that could disrupt \
        operations and harm our reputation with customers and suppliers in every region.";

    fn record(ticker: &str, year: i32, text: Option<&str>, has_1c: bool) -> FilingRecord {
        FilingRecord {
            ticker: Ticker::new(ticker),
            company_name: format!("{ticker} Inc"),
            sector: "Consumer Goods".into(),
            year,
            has_1c,
            combined_text: text.map(str::to_string),
        }
    }

    fn document(
        ticker: &str,
        year: i32,
        risk: &str,
        cyber: Option<&str>,
    ) -> (String, FilingDocument) {
        (
            "Technology".into(),
            FilingDocument::new(
                Ticker::new(ticker),
                ticker,
                year,
                FilingSections::new(Some(risk.into()), cyber.map(str::to_string)),
            ),
        )
    }

    #[test]
    fn test_boilerplate_stage() {
        let rows = boilerplate_stage(&[
            record("ELF", 2023, Some("We face an evolving threat landscape every day."), false),
            record("ELF", 2024, None, false),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].score.count, 1);
        assert!(rows[0].score.ratio > 0.0);
        assert_eq!(rows[1].score.count, 0);
        assert_eq!(rows[1].score.ratio, 0.0);
    }

    #[test]
    fn test_similarity_stage_uses_previous_calendar_year() {
        let rows = similarity_stage(&[
            record("WGO", 2024, Some(RISK_2023), false),
            record("WGO", 2022, Some(RISK_2022), false),
            record("WGO", 2023, Some(RISK_2023), false),
        ]);
        let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2022, 2023, 2024]);

        assert_eq!(rows[0].yoy_similarity, None);
        let partial = rows[1].yoy_similarity.unwrap();
        assert!(partial > 0.0 && partial < 1.0);
        assert_eq!(rows[2].yoy_similarity, Some(1.0));
    }

    #[test]
    fn test_similarity_stage_skips_gap_years() {
        let rows = similarity_stage(&[
            record("CROX", 2022, Some(RISK_2022), false),
            record("CROX", 2024, Some(RISK_2022), false),
        ]);
        assert!(rows.iter().all(|r| r.yoy_similarity.is_none()));
    }

    #[test]
    fn test_length_stage_joins_metadata() {
        let metadata = metadata_from_json_str(r#"{"pep": {"size": "Large", "market_cap": 2.0e11}}"#)
            .unwrap();
        let text = format!("one two three{ITEM_1C_DELIMITER}four five");
        let rows = length_stage(
            &[
                record("PEP", 2024, Some(&text), true),
                record("MCFT", 2024, Some("a b"), false),
            ],
            &metadata,
        );

        assert_eq!(rows[0].size.as_deref(), Some("Large"));
        assert_eq!(rows[0].market_cap, Some(2.0e11));
        assert_eq!(rows[0].lengths.len_1a, 3);
        assert_eq!(rows[0].lengths.len_1c, 2);
        assert_eq!(rows[1].size, None);
        assert_eq!(rows[1].lengths.len_combined, 2);
    }

    #[test]
    fn test_metadata_rejects_bad_json() {
        let err = metadata_from_json_str("[]").unwrap_err();
        assert!(matches!(err, DisclosureError::Parse(_)));
    }

    #[test]
    fn test_section_similarity_stage() {
        let docs = vec![
            document("MSFT", 2024, RISK_2023, Some("We adopted zero trust segmentation controls.")),
            document("MSFT", 2022, RISK_2022, None),
            document("MSFT", 2023, RISK_2023, Some("Our CISO reports to the audit committee.")),
        ];
        let rows = section_similarity_stage(&docs);

        let windows: Vec<(SectionKind, &str)> =
            rows.iter().map(|r| (r.item, r.window.as_str())).collect();
        assert_eq!(
            windows,
            vec![
                (SectionKind::RiskFactors, "2022-2023"),
                (SectionKind::RiskFactors, "2023-2024"),
                (SectionKind::Cybersecurity, "2023-2024"),
            ]
        );

        assert_eq!(rows[1].score, 1.0);
        assert_eq!(rows[1].category, SimilarityCategory::Boilerplate);
        assert!(rows[1].new_terms.is_empty());

        assert!(rows[2].score < 0.5);
        assert_eq!(rows[2].category, SimilarityCategory::Dynamic);
        assert!(!rows[2].new_terms.is_empty());
        assert!(rows[2].new_terms.len() <= TOP_NEW_TERMS);
    }

    #[test]
    fn test_section_similarity_gap_year_breaks_chain() {
        let docs = vec![
            document("MSFT", 2023, RISK_2023, Some("Our CISO reports to the audit committee.")),
            document("MSFT", 2024, RISK_2023, None),
            document("MSFT", 2025, RISK_2023, Some("Our CISO reports to the audit committee.")),
        ];
        let windows: Vec<(SectionKind, String)> = section_similarity_stage(&docs)
            .into_iter()
            .map(|r| (r.item, r.window))
            .collect();
        assert_eq!(
            windows,
            vec![
                (SectionKind::RiskFactors, "2023-2024".to_string()),
                (SectionKind::RiskFactors, "2024-2025".to_string()),
            ]
        );
    }

    #[test]
    fn test_merge_metrics_left_join() {
        let records = vec![
            record("NKE", 2023, Some(RISK_2022), false),
            record("NKE", 2024, Some(RISK_2023), false),
        ];
        let boilerplate = boilerplate_stage(&records);
        let similarity = similarity_stage(&records[1..]);
        let lengths = length_stage(&records[..1], &HashMap::new());

        let merged = merge_metrics(&boilerplate, &similarity, &lengths);
        assert_eq!(merged.len(), 2);
        assert!(merged[0].len_1a.is_some());
        assert_eq!(merged[1].len_1a, None);
        // NKE 2024 was compared without its 2023 record, so nothing to report.
        assert_eq!(merged[1].yoy_similarity, None);
        // "we may be subject to"
        assert_eq!(merged[0].boilerplate_count, Some(1));
    }

    #[test]
    fn test_analyze() {
        let records = vec![
            record("NKE", 2023, Some(RISK_2022), false),
            record("NKE", 2024, Some(RISK_2023), false),
        ];
        let metrics = analyze(&records, &HashMap::new());
        assert_eq!(metrics.len(), 2);
        assert!(metrics[1].yoy_similarity.is_some());
    }
}
