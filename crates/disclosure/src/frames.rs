//! Polars tables for pipeline outputs.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use disclosure_core::{DisclosureError, FilingRecord, SpecificityAssessment, SpecificityCategory};

use crate::analysis::{DisclosureMetrics, SectionSimilarityRow};

fn frame_err(e: PolarsError) -> DisclosureError {
    DisclosureError::Other(e.to_string())
}

fn counts(values: impl Iterator<Item = Option<usize>>) -> Vec<Option<u64>> {
    values.map(|v| v.map(|n| n as u64)).collect()
}

/// Filings table: one row per (ticker, year).
///
/// Columns: `ticker`, `company_name`, `sector`, `year`, `has_1c`, `combined_text`.
pub fn records_frame(records: &[FilingRecord]) -> disclosure_core::Result<DataFrame> {
    DataFrame::new(vec![
        Column::new(
            "ticker".into(),
            records.iter().map(|r| r.ticker.to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "company_name".into(),
            records.iter().map(|r| r.company_name.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "sector".into(),
            records.iter().map(|r| r.sector.clone()).collect::<Vec<_>>(),
        ),
        Column::new("year".into(), records.iter().map(|r| r.year).collect::<Vec<_>>()),
        Column::new("has_1c".into(), records.iter().map(|r| r.has_1c).collect::<Vec<_>>()),
        Column::new(
            "combined_text".into(),
            records
                .iter()
                .map(|r| r.combined_text.clone())
                .collect::<Vec<_>>(),
        ),
    ])
    .map_err(frame_err)
}

/// Merged metrics table.
pub fn metrics_frame(metrics: &[DisclosureMetrics]) -> disclosure_core::Result<DataFrame> {
    DataFrame::new(vec![
        Column::new(
            "ticker".into(),
            metrics.iter().map(|m| m.ticker.to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "company_name".into(),
            metrics.iter().map(|m| m.company_name.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "sector".into(),
            metrics.iter().map(|m| m.sector.clone()).collect::<Vec<_>>(),
        ),
        Column::new("year".into(), metrics.iter().map(|m| m.year).collect::<Vec<_>>()),
        Column::new("has_1c".into(), metrics.iter().map(|m| m.has_1c).collect::<Vec<_>>()),
        Column::new(
            "boilerplate_count".into(),
            counts(metrics.iter().map(|m| m.boilerplate_count)),
        ),
        Column::new(
            "boilerplate_ratio".into(),
            metrics.iter().map(|m| m.boilerplate_ratio).collect::<Vec<_>>(),
        ),
        Column::new(
            "yoy_similarity".into(),
            metrics.iter().map(|m| m.yoy_similarity).collect::<Vec<_>>(),
        ),
        Column::new(
            "size".into(),
            metrics.iter().map(|m| m.size.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "market_cap".into(),
            metrics.iter().map(|m| m.market_cap).collect::<Vec<_>>(),
        ),
        Column::new("len_1a".into(), counts(metrics.iter().map(|m| m.len_1a))),
        Column::new("len_1c".into(), counts(metrics.iter().map(|m| m.len_1c))),
        Column::new(
            "len_combined".into(),
            counts(metrics.iter().map(|m| m.len_combined)),
        ),
    ])
    .map_err(frame_err)
}

/// Section-level similarity table with new terms joined by `", "`.
pub fn section_similarity_frame(
    rows: &[SectionSimilarityRow],
) -> disclosure_core::Result<DataFrame> {
    DataFrame::new(vec![
        Column::new(
            "sector".into(),
            rows.iter().map(|r| r.sector.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "ticker".into(),
            rows.iter().map(|r| r.ticker.to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "item".into(),
            rows.iter().map(|r| r.item.to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "window".into(),
            rows.iter().map(|r| r.window.clone()).collect::<Vec<_>>(),
        ),
        Column::new("score".into(), rows.iter().map(|r| r.score).collect::<Vec<_>>()),
        Column::new(
            "category".into(),
            rows.iter()
                .map(|r| r.category.label().to_string())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "new_terms".into(),
            rows.iter().map(|r| r.new_terms.join(", ")).collect::<Vec<_>>(),
        ),
    ])
    .map_err(frame_err)
}

/// Specificity table.
///
/// One `<category>_score` and `<category>_rationale` column per judged
/// category, followed by `specificity_score`.
pub fn assessments_frame(
    assessments: &[SpecificityAssessment],
) -> disclosure_core::Result<DataFrame> {
    let mut columns = vec![
        Column::new(
            "ticker".into(),
            assessments
                .iter()
                .map(|a| a.ticker.to_string())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "year".into(),
            assessments.iter().map(|a| a.year).collect::<Vec<_>>(),
        ),
    ];

    for category in SpecificityCategory::ALL {
        columns.push(Column::new(
            format!("{}_score", category.key()).into(),
            assessments
                .iter()
                .map(|a| a.score(category))
                .collect::<Vec<_>>(),
        ));
        columns.push(Column::new(
            format!("{}_rationale", category.key()).into(),
            assessments
                .iter()
                .map(|a| a.judgments.get(&category).and_then(|j| j.rationale.clone()))
                .collect::<Vec<_>>(),
        ));
    }

    columns.push(Column::new(
        "specificity_score".into(),
        assessments
            .iter()
            .map(|a| a.specificity_score)
            .collect::<Vec<_>>(),
    ));

    DataFrame::new(columns).map_err(frame_err)
}

/// Grouping key for [`length_summary`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthGrouping {
    /// Group by sector and year.
    Sector,
    /// Group by size class and year.
    Size,
}

impl LengthGrouping {
    const fn column(self) -> &'static str {
        match self {
            Self::Sector => "sector",
            Self::Size => "size",
        }
    }
}

/// Mean section lengths per group and year.
///
/// Columns: the grouping column, `year`, `filings`, `len_1a`, `len_1c` and
/// `len_combined`, sorted by group then year. Rows whose group value is
/// missing are left out.
pub fn length_summary(
    metrics: &[DisclosureMetrics],
    by: LengthGrouping,
) -> disclosure_core::Result<DataFrame> {
    let group = by.column();
    metrics_frame(metrics)?
        .lazy()
        .filter(col(group).is_not_null())
        .group_by([col(group), col("year")])
        .agg([
            col("ticker").count().cast(DataType::Int64).alias("filings"),
            col("len_1a").cast(DataType::Float64).mean(),
            col("len_1c").cast(DataType::Float64).mean(),
            col("len_combined").cast(DataType::Float64).mean(),
        ])
        .sort([group, "year"], Default::default())
        .collect()
        .map_err(frame_err)
}
