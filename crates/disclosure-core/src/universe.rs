//! Study universe and fiscal year rules.
//!
//! This module defines [`Universe`], the sectors, tickers and fiscal years a
//! collection run covers, and the rule deciding when Item 1C is expected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::{
    error::{DisclosureError, Result},
    types::Ticker,
};

/// First fiscal year in which registrants report Item 1C.
pub const FIRST_CYBERSECURITY_ITEM_YEAR: i32 = 2023;

/// Returns true if a 10-K for `year` is expected to contain Item 1C.
#[must_use]
pub const fn cybersecurity_item_expected(year: i32) -> bool {
    year >= FIRST_CYBERSECURITY_ITEM_YEAR
}

/// Sectors, tickers and fiscal years covered by a collection run.
///
/// Loadable from JSON:
///
/// ```
/// use disclosure_core::Universe;
///
/// let universe = Universe::from_json_str(
///     r#"{"sectors": {"Finance": ["v", "hli"]}, "years": [2023, 2024]}"#,
/// ).unwrap();
/// assert_eq!(universe.ticker_count(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    /// Tickers grouped by sector.
    pub sectors: BTreeMap<String, Vec<Ticker>>,
    /// Fiscal years to collect.
    pub years: Vec<i32>,
}

impl Universe {
    /// Creates an empty universe for the given fiscal years.
    #[must_use]
    pub fn new(years: impl IntoIterator<Item = i32>) -> Self {
        Self {
            sectors: BTreeMap::new(),
            years: years.into_iter().collect(),
        }
    }

    /// Adds a sector with its tickers.
    #[must_use]
    pub fn with_sector<T: Into<Ticker>>(
        mut self,
        sector: impl Into<String>,
        tickers: impl IntoIterator<Item = T>,
    ) -> Self {
        self.sectors
            .entry(sector.into())
            .or_default()
            .extend(tickers.into_iter().map(Into::into));
        self
    }

    /// The 41-company sample used in the disclosure study, fiscal years 2022-2025.
    #[must_use]
    pub fn research_default() -> Self {
        Self::new([2022, 2023, 2024, 2025])
            .with_sector("Consumer Goods", ["CROX", "ELF", "MCFT", "NKE", "PEP", "WGO"])
            .with_sector("Cybersecurity", ["CRWD", "PANW", "PRGS", "RPD", "S", "VRNS"])
            .with_sector("Finance", ["HLI", "LC", "PSEC", "UPST", "V"])
            .with_sector("Healthcare", ["ELMD", "JNJ", "LLY", "MODD", "MOH", "VKTX"])
            .with_sector("Retail & E-Commerce", ["AMZN", "BOOT", "ETSY", "SFIX", "UPWK"])
            .with_sector("Semiconductors", ["AMD", "CRUS", "INTC", "MXL", "NVEC", "POWI"])
            .with_sector(
                "Technology",
                ["AAPL", "AMPL", "GOOGL", "GTLB", "MSFT", "SCSC", "U"],
            )
    }

    /// Parses a universe from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let universe: Self = serde_json::from_str(json)
            .map_err(|e| DisclosureError::Parse(format!("Invalid universe: {e}")))?;
        universe.validate()?;
        Ok(universe)
    }

    /// Reads and parses a universe from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Checks that the universe has at least one year and one ticker.
    pub fn validate(&self) -> Result<()> {
        if self.years.is_empty() {
            return Err(DisclosureError::InvalidParameter(
                "Universe has no fiscal years".to_string(),
            ));
        }
        if self.ticker_count() == 0 {
            return Err(DisclosureError::InvalidParameter(
                "Universe has no tickers".to_string(),
            ));
        }
        Ok(())
    }

    /// Iterates over (sector, ticker) pairs.
    pub fn tasks(&self) -> impl Iterator<Item = (&str, &Ticker)> {
        self.sectors
            .iter()
            .flat_map(|(sector, tickers)| tickers.iter().map(move |t| (sector.as_str(), t)))
    }

    /// Returns the sector a ticker belongs to.
    #[must_use]
    pub fn sector_of(&self, ticker: &Ticker) -> Option<&str> {
        self.tasks()
            .find(|(_, t)| *t == ticker)
            .map(|(sector, _)| sector)
    }

    /// Total number of tickers across sectors.
    #[must_use]
    pub fn ticker_count(&self) -> usize {
        self.sectors.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_research_default() {
        let universe = Universe::research_default();
        assert_eq!(universe.sectors.len(), 7);
        assert_eq!(universe.ticker_count(), 41);
        assert_eq!(universe.years, vec![2022, 2023, 2024, 2025]);
        assert_eq!(universe.sector_of(&Ticker::new("panw")), Some("Cybersecurity"));
        assert_eq!(universe.sector_of(&Ticker::new("XOM")), None);
    }

    #[test]
    fn test_tasks_cover_every_ticker() {
        let universe = Universe::new([2024])
            .with_sector("A", ["X", "Y"])
            .with_sector("B", ["Z"]);
        let tasks: Vec<_> = universe
            .tasks()
            .map(|(s, t)| (s.to_string(), t.to_string()))
            .collect();
        assert_eq!(
            tasks,
            vec![
                ("A".to_string(), "X".to_string()),
                ("A".to_string(), "Y".to_string()),
                ("B".to_string(), "Z".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_json_rejects_empty() {
        let err = Universe::from_json_str(r#"{"sectors": {}, "years": [2024]}"#).unwrap_err();
        assert!(matches!(err, DisclosureError::InvalidParameter(_)));

        let err = Universe::from_json_str(r#"{"sectors": {"A": ["X"]}, "years": []}"#)
            .unwrap_err();
        assert!(matches!(err, DisclosureError::InvalidParameter(_)));

        let err = Universe::from_json_str("not json").unwrap_err();
        assert!(matches!(err, DisclosureError::Parse(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sectors": {{"Healthcare": ["jnj", "lly"]}}, "years": [2023]}}"#
        )
        .unwrap();

        let universe = Universe::from_path(file.path()).unwrap();
        assert_eq!(universe.sectors["Healthcare"][1].as_str(), "LLY");
    }

    #[test]
    fn test_cybersecurity_item_rule() {
        assert!(!cybersecurity_item_expected(2022));
        assert!(cybersecurity_item_expected(2023));
        assert!(cybersecurity_item_expected(2025));
    }
}
