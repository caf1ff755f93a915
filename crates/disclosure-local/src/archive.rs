//! Sector/company/year section archive.
//!
//! Layout:
//!
//! ```text
//! <root>/<sector>/<TICKER> (<company>)/<year>/<TICKER>_Item_1A_RiskFactors.txt
//! <root>/<sector>/<TICKER> (<company>)/<year>/<TICKER>_Item_1C_Cybersecurity.txt
//! ```

use async_trait::async_trait;
use disclosure_core::{
    DisclosureError, FilingDocument, FilingSections, FilingSource, Result, SectionKind,
    SourceInfo, Ticker,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Makes a company name safe to use in a folder name.
///
/// Drops `.` and `,` and turns `/` into `-`.
#[must_use]
pub fn clean_company_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '.' | ','))
        .map(|c| if c == '/' { '-' } else { c })
        .collect()
}

/// Reads a file, mapping "not found" to `None`.
async fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Lists the subdirectories of `dir` as (name, path) pairs, sorted by name.
async fn subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// A company folder located in the archive.
#[derive(Clone, Debug, PartialEq, Eq)]
struct CompanyFolder {
    sector: String,
    company_name: String,
    path: PathBuf,
}

/// Archive of extracted sections on disk.
#[derive(Clone, Debug)]
pub struct ExtractionArchive {
    root: PathBuf,
}

impl ExtractionArchive {
    /// Opens an archive rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Archive root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder holding one company's filings.
    #[must_use]
    pub fn company_dir(&self, sector: &str, ticker: &Ticker, company_name: &str) -> PathBuf {
        self.root
            .join(sector)
            .join(format!("{ticker} ({})", clean_company_name(company_name)))
    }

    /// Path of one section file.
    #[must_use]
    pub fn section_path(
        company_dir: &Path,
        ticker: &Ticker,
        year: i32,
        kind: SectionKind,
    ) -> PathBuf {
        company_dir
            .join(year.to_string())
            .join(format!("{ticker}_{}.txt", kind.archive_stem()))
    }

    /// Writes every present section of `document` and returns the written paths.
    pub async fn write_document(
        &self,
        sector: &str,
        document: &FilingDocument,
    ) -> Result<Vec<PathBuf>> {
        let company_dir = self.company_dir(sector, &document.ticker, &document.company_name);
        let mut written = Vec::new();

        for kind in SectionKind::ALL {
            let Some(text) = document.sections.get(kind) else {
                continue;
            };
            let path = Self::section_path(&company_dir, &document.ticker, document.year, kind);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&path, text).await?;
            debug!(
                ticker = %document.ticker,
                year = document.year,
                item = %kind,
                "Archived section"
            );
            written.push(path);
        }

        Ok(written)
    }

    /// Finds the folder of `ticker` under any sector.
    async fn find_company(&self, ticker: &Ticker) -> Result<Option<CompanyFolder>> {
        let prefix = format!("{ticker} ");
        for (sector, sector_path) in subdirectories(&self.root).await? {
            for (name, path) in subdirectories(&sector_path).await? {
                if let Some(rest) = name.strip_prefix(&prefix) {
                    let company_name = rest
                        .trim()
                        .strip_prefix('(')
                        .and_then(|s| s.strip_suffix(')'))
                        .unwrap_or(rest)
                        .to_string();
                    return Ok(Some(CompanyFolder {
                        sector,
                        company_name,
                        path,
                    }));
                }
            }
        }
        Ok(None)
    }

    /// Sector folder a ticker is archived under.
    pub async fn sector_of(&self, ticker: &Ticker) -> Result<Option<String>> {
        Ok(self.find_company(ticker).await?.map(|c| c.sector))
    }

    /// Fiscal years archived for a ticker, ascending.
    pub async fn years(&self, ticker: &Ticker) -> Result<Vec<i32>> {
        let Some(company) = self.find_company(ticker).await? else {
            return Err(DisclosureError::TickerNotFound(ticker.to_string()));
        };
        let mut years: Vec<i32> = subdirectories(&company.path)
            .await?
            .into_iter()
            .filter_map(|(name, _)| name.parse().ok())
            .collect();
        years.sort_unstable();
        Ok(years)
    }

    async fn read_from(
        company: &CompanyFolder,
        ticker: &Ticker,
        year: i32,
    ) -> Result<FilingDocument> {
        let risk_factors = read_optional(&Self::section_path(
            &company.path,
            ticker,
            year,
            SectionKind::RiskFactors,
        ))
        .await?;
        let cybersecurity = read_optional(&Self::section_path(
            &company.path,
            ticker,
            year,
            SectionKind::Cybersecurity,
        ))
        .await?;

        let sections = FilingSections::new(risk_factors, cybersecurity);
        if sections.is_empty() {
            return Err(DisclosureError::FilingNotAvailable {
                ticker: ticker.to_string(),
                year,
            });
        }
        Ok(FilingDocument::new(
            ticker.clone(),
            company.company_name.clone(),
            year,
            sections,
        ))
    }

    /// Reads the archived sections of one filing.
    pub async fn read_document(&self, ticker: &Ticker, year: i32) -> Result<FilingDocument> {
        let company = self
            .find_company(ticker)
            .await?
            .ok_or_else(|| DisclosureError::TickerNotFound(ticker.to_string()))?;
        Self::read_from(&company, ticker, year).await
    }

    /// Reads every archived filing as (sector, document), ordered by sector,
    /// company folder and year.
    pub async fn read_all(&self) -> Result<Vec<(String, FilingDocument)>> {
        let mut documents = Vec::new();
        for (sector, sector_path) in subdirectories(&self.root).await? {
            for (name, path) in subdirectories(&sector_path).await? {
                let Some(ticker) = name.split(' ').next().filter(|t| !t.is_empty()) else {
                    continue;
                };
                let ticker = Ticker::new(ticker);
                let company = CompanyFolder {
                    sector: sector.clone(),
                    company_name: name
                        .split_once(" (")
                        .map_or("", |(_, rest)| rest.trim_end_matches(')'))
                        .to_string(),
                    path,
                };
                let mut years: Vec<i32> = subdirectories(&company.path)
                    .await?
                    .into_iter()
                    .filter_map(|(year, _)| year.parse().ok())
                    .collect();
                years.sort_unstable();

                for year in years {
                    match Self::read_from(&company, &ticker, year).await {
                        Ok(doc) => documents.push((sector.clone(), doc)),
                        Err(e) if e.is_not_found() => {
                            warn!(ticker = %ticker, year, "Empty year folder in archive");
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        Ok(documents)
    }
}

impl SourceInfo for ExtractionArchive {
    fn name(&self) -> &str {
        "Extraction archive"
    }

    fn description(&self) -> &str {
        "Item 1A and Item 1C text files archived by sector, company and fiscal year"
    }
}

#[async_trait]
impl FilingSource for ExtractionArchive {
    async fn fetch_filing(&self, ticker: &Ticker, year: i32) -> Result<FilingDocument> {
        self.read_document(ticker, year).await
    }
}
