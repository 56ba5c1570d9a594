//! Row sources: finite, replayable sequences of order records.
//!
//! The core engine never touches a sheet; sources turn exported order data
//! into [`OrderRecord`]s and own all column discovery. Column discovery is
//! by exact header name with documented positional fallbacks; per-recipient
//! mode requires its full column set up front so a misconfigured sheet
//! fails before any row is processed.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::error::{SourceError, SourceResult};
use crate::models::{OrderRecord, ParseMode, RecipientFields};

pub mod csv;
pub mod text;

pub use self::csv::CsvRowSource;
pub use self::text::TextRowSource;

// =============================================================================
// Source Abstraction
// =============================================================================

/// A finite, replayable sequence of order records.
///
/// `mode` decides which columns are required; sources must surface missing
/// columns as [`SourceError::MissingColumn`] before yielding any record.
pub trait RowSource {
    fn records(&self, mode: ParseMode) -> SourceResult<Vec<OrderRecord>>;
}

// =============================================================================
// Column Names
// =============================================================================

/// Header of the option-text column.
pub const OPTION_COLUMN: &str = "Product/Option Name";

/// Header of the purchase-multiplier column.
pub const MULTIPLIER_COLUMN: &str = "Purchase Qty";

/// Header of the recipient display-name column.
pub const RECIPIENT_NAME_COLUMN: &str = "Recipient Name";

/// Header of the recipient phone column.
pub const RECIPIENT_PHONE_COLUMN: &str = "Recipient Phone";

/// Header of the recipient address column.
pub const RECIPIENT_ADDRESS_COLUMN: &str = "Recipient Address";

/// Header of the order timestamp column.
pub const ORDER_DATE_COLUMN: &str = "Order Date";

/// Positional fallback for the option column (0-based), matching the fixed
/// layout of the marketplace export.
pub const OPTION_COLUMN_FALLBACK: usize = 15;

/// Positional fallback for the multiplier column (0-based).
pub const MULTIPLIER_COLUMN_FALLBACK: usize = 22;

// =============================================================================
// Column Discovery
// =============================================================================

/// Recipient column indices, all required in per-recipient mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipientColumns {
    pub name: usize,
    pub phone: usize,
    pub address: usize,
    pub order_date: usize,
}

/// Discovered column layout of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Option-text column; `None` means no column was discoverable and the
    /// source falls back to scanning cells (aggregate mode only).
    pub option: Option<usize>,
    /// Purchase-multiplier column; absent means every row multiplies by 1.
    pub multiplier: Option<usize>,
    /// Recipient columns; present exactly in per-recipient mode.
    pub recipient: Option<RecipientColumns>,
}

impl ColumnLayout {
    /// Discover the layout for the given headers and analysis mode.
    pub fn discover(headers: &[String], mode: ParseMode) -> SourceResult<Self> {
        let option = find_column(headers, OPTION_COLUMN, Some(OPTION_COLUMN_FALLBACK));
        let multiplier = find_column(headers, MULTIPLIER_COLUMN, Some(MULTIPLIER_COLUMN_FALLBACK));

        let recipient = match mode {
            ParseMode::Aggregate => None,
            ParseMode::PerRecipient => {
                // The full column set is required by exact header; fail
                // before any row.
                require_column(headers, OPTION_COLUMN)?;
                require_column(headers, MULTIPLIER_COLUMN)?;
                Some(RecipientColumns {
                    name: require_column(headers, RECIPIENT_NAME_COLUMN)?,
                    phone: require_column(headers, RECIPIENT_PHONE_COLUMN)?,
                    address: require_column(headers, RECIPIENT_ADDRESS_COLUMN)?,
                    order_date: require_column(headers, ORDER_DATE_COLUMN)?,
                })
            }
        };

        Ok(Self { option, multiplier, recipient })
    }
}

/// Exact header match, with an optional positional fallback.
fn find_column(headers: &[String], name: &str, fallback: Option<usize>) -> Option<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .or_else(|| fallback.filter(|idx| *idx < headers.len()))
}

fn require_column(headers: &[String], name: &str) -> SourceResult<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| SourceError::MissingColumn(name.into()))
}

// =============================================================================
// Cell Extraction
// =============================================================================

/// Option text from a cell; blank cells carry no option.
pub(crate) fn option_from_cell(cell: Option<&str>) -> Option<String> {
    let text = cell?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Purchase multiplier from a cell; absent, non-numeric or non-positive
/// values default to 1.
pub(crate) fn multiplier_from_cell(cell: Option<&str>) -> u32 {
    cell.and_then(|text| text.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(1)
}

/// Lenient order-timestamp parsing; unparseable cells are logged and the
/// row is still processed.
pub(crate) fn parse_order_date(cell: Option<&str>) -> Option<NaiveDateTime> {
    let text = cell?.trim();
    if text.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    warn!(cell = text, "unparseable order date");
    None
}

/// Build a row's recipient fields from its cells.
pub(crate) fn recipient_from_cells(
    name: Option<&str>,
    phone: Option<&str>,
    address: Option<&str>,
    order_date: Option<&str>,
) -> RecipientFields {
    RecipientFields {
        name: name.unwrap_or("").trim().to_string(),
        phone: phone.unwrap_or("").trim().to_string(),
        address: address.unwrap_or("").trim().to_string(),
        order_date: parse_order_date(order_date),
    }
}

// =============================================================================
// Tests
// =============================================================================
