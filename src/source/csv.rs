//! CSV-backed row source with encoding and delimiter auto-detection.
//!
//! Marketplace order exports arrive in whatever encoding the seller's
//! spreadsheet tool produced (UTF-8, Windows-1252, EUC-KR, ...), so the
//! bytes are sniffed with chardet and decoded with encoding_rs before any
//! CSV work happens. The delimiter is detected by counting candidates in
//! the header line. Option cells routinely contain commas and embedded
//! newlines, so the actual record parsing goes through the `csv` crate
//! rather than naive line splitting.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::models::{OrderRecord, ParseMode};
use crate::source::{
    multiplier_from_cell, option_from_cell, recipient_from_cells, ColumnLayout, RowSource,
};

/// A `<text>,<text>` shaped cell, used by the whole-sheet scan when no
/// option column is discoverable.
pub(crate) static OPTION_SHAPED: Lazy<Regex> = Lazy::new(|| Regex::new(r".+,.+").unwrap());

// =============================================================================
// Encoding / Delimiter Detection
// =============================================================================

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _, _) = chardet::detect(bytes);

    // Normalize charset names.
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "euc-kr" | "cp949" | "uhc" => "euc-kr".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the detected encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> SourceResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.to_string(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        "euc-kr" | "cp949" | "uhc" => encoding_rs::EUC_KR.decode(bytes).0.to_string(),
        // Fallback: UTF-8 with lossy conversion.
        _ => String::from_utf8_lossy(bytes).to_string(),
    };

    // Spreadsheet tools love to prepend a BOM.
    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the header line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

// =============================================================================
// CSV Row Source
// =============================================================================

/// Row source over a CSV order export.
///
/// The file is read and parsed once; [`RowSource::records`] can be called
/// any number of times (the sequence is replayable).
#[derive(Debug, Clone)]
pub struct CsvRowSource {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    encoding: String,
    delimiter: char,
}

impl CsvRowSource {
    /// Open a CSV file with auto-detected encoding and delimiter.
    pub fn open<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Parse CSV bytes with auto-detected encoding and delimiter.
    pub fn from_bytes(bytes: &[u8]) -> SourceResult<Self> {
        if bytes.is_empty() {
            return Err(SourceError::EmptyFile);
        }

        let encoding = detect_encoding(bytes);
        let content = decode_content(bytes, &encoding)?;
        let delimiter = detect_delimiter(&content);

        let mut reader = ::csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| SourceError::Parse(format!("cannot read header row: {e}")))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(SourceError::NoHeaders);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| SourceError::Parse(format!("malformed CSV record: {e}")))?;
            let row: Vec<String> = record.iter().map(|cell| cell.to_string()).collect();
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            rows.push(row);
        }

        debug!(encoding = %encoding, delimiter = %delimiter, rows = rows.len(), "parsed order export");

        Ok(Self { headers, rows, encoding, delimiter })
    }

    /// Detected encoding name.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Detected delimiter.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Column headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn cell<'a>(&self, row: &'a [String], index: Option<usize>) -> Option<&'a str> {
        index.and_then(|i| row.get(i)).map(String::as_str)
    }

    /// No option column was discoverable: scan every cell for an option-
    /// shaped value, multiplier 1.
    fn scan_cells(&self) -> Vec<OrderRecord> {
        let mut records = Vec::new();
        for row in &self.rows {
            for cell in row {
                if OPTION_SHAPED.is_match(cell) {
                    records.push(OrderRecord::bare(cell.trim()));
                }
            }
        }
        records
    }
}

impl RowSource for CsvRowSource {
    fn records(&self, mode: ParseMode) -> SourceResult<Vec<OrderRecord>> {
        let layout = ColumnLayout::discover(&self.headers, mode)?;

        if mode == ParseMode::Aggregate && layout.option.is_none() {
            debug!("no option column discoverable, scanning cells");
            return Ok(self.scan_cells());
        }

        let records = self
            .rows
            .iter()
            .map(|row| {
                let recipient = layout.recipient.map(|cols| {
                    recipient_from_cells(
                        self.cell(row, Some(cols.name)),
                        self.cell(row, Some(cols.phone)),
                        self.cell(row, Some(cols.address)),
                        self.cell(row, Some(cols.order_date)),
                    )
                });
                OrderRecord {
                    option: option_from_cell(self.cell(row, layout.option)),
                    multiplier: multiplier_from_cell(self.cell(row, layout.multiplier)),
                    recipient,
                }
            })
            .collect();

        Ok(records)
    }
}

// =============================================================================
// Tests
// =============================================================================
