//! Flat directory of combined filing texts named `TICKER_YEAR.txt`.

use async_trait::async_trait;
use disclosure_core::{
    DisclosureError, FilingDocument, FilingSource, ITEM_1C_MARKER, Result, SourceInfo, Ticker,
};
use disclosure_text::split_combined;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// One recognized file in a [`FlatTextDirectory`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatEntry {
    /// Ticker from the file name.
    pub ticker: Ticker,
    /// Fiscal year from the file name.
    pub year: i32,
    /// Full path of the file.
    pub path: PathBuf,
}

/// Parses `TICKER_YEAR.txt`; the name is split on its last underscore.
fn parse_file_name(file_name: &str) -> Option<(Ticker, i32)> {
    let stem = file_name.strip_suffix(".txt")?;
    let (ticker, year) = stem.rsplit_once('_')?;
    if ticker.is_empty() {
        return None;
    }
    Some((Ticker::new(ticker), year.parse().ok()?))
}

/// Directory of one combined text per filing.
///
/// Each file holds Item 1A and, when present, Item 1C joined by the
/// `--- ITEM 1C ---` marker.
#[derive(Clone, Debug)]
pub struct FlatTextDirectory {
    root: PathBuf,
}

impl FlatTextDirectory {
    /// Opens the directory at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists recognized files sorted by file name.
    ///
    /// Non-`.txt` files are ignored; `.txt` files that don't follow the naming
    /// scheme are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<FlatEntry>> {
        let mut dir = fs::read_dir(&self.root).await?;
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
            }
        }
        names.sort();

        let entries: Vec<FlatEntry> = names
            .into_iter()
            .filter(|(name, _)| name.ends_with(".txt"))
            .filter_map(|(name, path)| match parse_file_name(&name) {
                Some((ticker, year)) => Some(FlatEntry { ticker, year, path }),
                None => {
                    warn!(file = %name, "Skipping unrecognised file name");
                    None
                }
            })
            .collect();

        debug!(count = entries.len(), root = %self.root.display(), "Listed filing texts");
        Ok(entries)
    }

    /// Reads one entry into a document; the ticker stands in for the company name.
    pub async fn read_entry(&self, entry: &FlatEntry) -> Result<FilingDocument> {
        let bytes = fs::read(&entry.path).await?;
        let text = String::from_utf8_lossy(&bytes);
        let sections = split_combined(&text, text.contains(ITEM_1C_MARKER));
        Ok(FilingDocument::new(
            entry.ticker.clone(),
            entry.ticker.to_string(),
            entry.year,
            sections,
        ))
    }
}

impl SourceInfo for FlatTextDirectory {
    fn name(&self) -> &str {
        "Flat text directory"
    }

    fn description(&self) -> &str {
        "Combined Item 1A / Item 1C texts stored as TICKER_YEAR.txt"
    }
}

#[async_trait]
impl FilingSource for FlatTextDirectory {
    async fn fetch_filing(&self, ticker: &Ticker, year: i32) -> Result<FilingDocument> {
        let entries = self.list().await?;
        if !entries.iter().any(|e| &e.ticker == ticker) {
            return Err(DisclosureError::TickerNotFound(ticker.to_string()));
        }
        let entry = entries
            .iter()
            .find(|e| &e.ticker == ticker && e.year == year)
            .ok_or_else(|| DisclosureError::FilingNotAvailable {
                ticker: ticker.to_string(),
                year,
            })?;
        self.read_entry(entry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disclosure_core::ITEM_1C_DELIMITER;

    #[test]
    fn test_parse_file_name() {
        assert_eq!(parse_file_name("AAPL_2024.txt"), Some((Ticker::new("AAPL"), 2024)));
        assert_eq!(parse_file_name("BRK_B_2023.txt"), Some((Ticker::new("BRK_B"), 2023)));
        assert_eq!(parse_file_name("AAPL-2024.txt"), None);
        assert_eq!(parse_file_name("AAPL_latest.txt"), None);
        assert_eq!(parse_file_name("_2024.txt"), None);
    }

    #[tokio::test]
    async fn test_list_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("MSFT_2024.txt"),
            format!("risk{ITEM_1C_DELIMITER}cyber"),
        )
        .unwrap();
        std::fs::write(dir.path().join("MSFT_2022.txt"), "only risk").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("MSFT_2023.csv"), "ignored").unwrap();

        let source = FlatTextDirectory::new(dir.path());
        let entries = source.list().await.unwrap();
        let years: Vec<i32> = entries.iter().map(|e| e.year).collect();
        assert_eq!(years, vec![2022, 2024]);

        let doc = source.fetch_filing(&Ticker::new("msft"), 2024).await.unwrap();
        assert_eq!(doc.sections.risk_factors.as_deref(), Some("risk"));
        assert_eq!(doc.sections.cybersecurity.as_deref(), Some("cyber"));

        let doc = source.fetch_filing(&Ticker::new("MSFT"), 2022).await.unwrap();
        assert!(!doc.sections.has_cybersecurity());

        let err = source.fetch_filing(&Ticker::new("MSFT"), 2023).await.unwrap_err();
        assert!(matches!(err, DisclosureError::FilingNotAvailable { .. }));
        let err = source.fetch_filing(&Ticker::new("GOOGL"), 2024).await.unwrap_err();
        assert!(matches!(err, DisclosureError::TickerNotFound(_)));
    }
}
