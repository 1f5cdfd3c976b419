//! Schedule documents: pages of header-labeled tables.
//!
//! A [`TableExtractor`] turns raw document bytes into a [`Document`]. The
//! shipped [`DelimitedExtractor`] reads tab- or comma-separated text where a
//! form feed starts a new page and a blank line starts a new table.

use csv::ReaderBuilder;
use thiserror::Error;
use tracing::debug;

const PAGE_BREAK: char = '\x0c';

/// Shape violations that make a document unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("expected a single-page document, found {0} pages")]
    PageCount(usize),

    #[error("expected weekday and weekend tables on the page, found {0} tables")]
    TableCount(usize),

    #[error("document is not valid UTF-8 text")]
    Encoding,
}

/// A table whose first row has been lifted into column headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Builds a table from raw rows, treating the first row as the header.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let header = rows.remove(0);
        Self { header, rows }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub pages: Vec<Page>,
}

/// Source of tables for a raw schedule document.
pub trait TableExtractor {
    fn extract(&self, bytes: &[u8]) -> anyhow::Result<Document>;
}

/// Reads delimited text documents.
#[derive(Debug, Clone, Copy)]
pub struct DelimitedExtractor {
    delimiter: u8,
}

impl DelimitedExtractor {
    pub fn tsv() -> Self {
        Self { delimiter: b'\t' }
    }

    pub fn csv() -> Self {
        Self { delimiter: b',' }
    }

    fn read_table(&self, block: &str) -> anyhow::Result<Table> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(block.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(clean_cell).collect());
        }
        Ok(Table::from_rows(rows))
    }
}

impl TableExtractor for DelimitedExtractor {
    fn extract(&self, bytes: &[u8]) -> anyhow::Result<Document> {
        let text = std::str::from_utf8(bytes).map_err(|_| DocumentError::Encoding)?;

        let mut pages = Vec::new();
        for page_text in text.split(PAGE_BREAK) {
            let mut tables = Vec::new();
            for block in table_blocks(page_text) {
                tables.push(self.read_table(&block)?);
            }
            pages.push(Page { tables });
        }

        debug!(
            pages = pages.len(),
            tables = pages.iter().map(|p| p.tables.len()).sum::<usize>(),
            "Document extracted"
        );
        Ok(Document { pages })
    }
}

/// Splits page text into runs of non-blank lines.
///
/// Blank lines inside a quoted cell belong to that cell.
fn table_blocks(page_text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_quotes = false;

    for line in page_text.lines() {
        if !in_quotes && line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
            continue;
        }
        current.push(line);
        // An escaped quote (`""`) flips the state twice.
        if line.matches('"').count() % 2 == 1 {
            in_quotes = !in_quotes;
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}

/// Line breaks inside a cell become single spaces.
fn clean_cell(cell: &str) -> String {
    cell.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Picks the weekday table out of a single-page document.
///
/// The page must hold the weekday table first and the weekend table second;
/// the weekend table is ignored.
pub fn weekday_table(document: &Document) -> Result<&Table, DocumentError> {
    let [page] = document.pages.as_slice() else {
        return Err(DocumentError::PageCount(document.pages.len()));
    };
    match page.tables.as_slice() {
        [weekday, _weekend, ..] => Ok(weekday),
        tables => Err(DocumentError::TableCount(tables.len())),
    }
}
