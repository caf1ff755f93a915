//! Per-year descriptive statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use disclosure_core::FilingRecord;

use crate::analysis::DisclosureMetrics;

/// Similarity at or above this value counts as high.
pub const HIGH_SIMILARITY_THRESHOLD: f64 = 0.75;

/// A numeric column of [`DisclosureMetrics`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Words in Item 1A.
    Len1a,
    /// Words in Item 1C; filings without Item 1C are left out.
    Len1c,
    /// Words in both items.
    LenCombined,
    /// Boilerplate phrases per word.
    BoilerplateRatio,
    /// Similarity to the previous year.
    YoySimilarity,
}

impl Metric {
    /// Value of this metric for one row, if defined.
    #[must_use]
    pub fn value(self, row: &DisclosureMetrics) -> Option<f64> {
        match self {
            Self::Len1a => row.len_1a.map(|n| n as f64),
            Self::Len1c => row.len_1c.filter(|_| row.has_1c).map(|n| n as f64),
            Self::LenCombined => row.len_combined.map(|n| n as f64),
            Self::BoilerplateRatio => row.boilerplate_ratio,
            Self::YoySimilarity => row.yoy_similarity,
        }
    }
}

/// Descriptive statistics of one metric in one year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YearStats {
    /// Fiscal year.
    pub year: i32,
    /// Number of values.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median.
    pub median: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std_dev: Option<f64>,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
}

impl YearStats {
    /// Computes statistics for a non-empty set of values.
    fn from_values(year: i32, mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };
        let std_dev = (count > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });

        Some(Self {
            year,
            count,
            mean,
            median,
            std_dev,
            min: values[0],
            max: values[count - 1],
        })
    }
}

/// Statistics of `metric` per fiscal year, ascending. Years without values are omitted.
#[must_use]
pub fn describe_by_year(metrics: &[DisclosureMetrics], metric: Metric) -> Vec<YearStats> {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for row in metrics {
        if let Some(value) = metric.value(row).filter(|v| v.is_finite()) {
            by_year.entry(row.year).or_default().push(value);
        }
    }
    by_year
        .into_iter()
        .filter_map(|(year, values)| YearStats::from_values(year, values))
        .collect()
}

/// Share of filings with an Item 1C in one year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdoptionRate {
    /// Fiscal year.
    pub year: i32,
    /// Filings collected.
    pub filings: usize,
    /// Filings with Item 1C.
    pub with_1c: usize,
    /// `with_1c / filings`.
    pub rate: f64,
}

/// Item 1C adoption per fiscal year, ascending.
#[must_use]
pub fn adoption_by_year(records: &[FilingRecord]) -> Vec<AdoptionRate> {
    let mut by_year: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    for record in records {
        let entry = by_year.entry(record.year).or_default();
        entry.0 += 1;
        entry.1 += usize::from(record.has_1c);
    }
    by_year
        .into_iter()
        .map(|(year, (filings, with_1c))| AdoptionRate {
            year,
            filings,
            with_1c,
            rate: with_1c as f64 / filings as f64,
        })
        .collect()
}

/// Counts of high and low similarity scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilaritySplit {
    /// Scores at or above [`HIGH_SIMILARITY_THRESHOLD`].
    pub high: usize,
    /// Scores below it.
    pub low: usize,
}

impl SimilaritySplit {
    /// Splits a set of scores.
    #[must_use]
    pub fn from_scores(scores: impl IntoIterator<Item = f64>) -> Self {
        scores.into_iter().fold(Self::default(), |mut split, s| {
            if s >= HIGH_SIMILARITY_THRESHOLD {
                split.high += 1;
            } else {
                split.low += 1;
            }
            split
        })
    }

    /// Total number of scores.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.high + self.low
    }

    /// Fraction of high scores, `None` when there are no scores.
    #[must_use]
    pub fn high_share(&self) -> Option<f64> {
        (self.total() > 0).then(|| self.high as f64 / self.total() as f64)
    }
}

/// High/low year-over-year similarity split per fiscal year.
#[must_use]
pub fn similarity_split_by_year(metrics: &[DisclosureMetrics]) -> BTreeMap<i32, SimilaritySplit> {
    let mut scores: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for row in metrics {
        if let Some(s) = row.yoy_similarity {
            scores.entry(row.year).or_default().push(s);
        }
    }
    scores
        .into_iter()
        .map(|(year, s)| (year, SimilaritySplit::from_scores(s)))
        .collect()
}
