//! Row source over pasted order text.
//!
//! Marketplace pages let sellers copy the order table as plain text; option
//! cells keep their `<label>,<descriptor>` shape there. The layout is
//! accepted only when it is comma-dense (more than 30% of lines carry a
//! comma); anything else is reported as unsupported rather than guessed at.

use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::models::{OrderRecord, ParseMode};
use crate::source::csv::OPTION_SHAPED;
use crate::source::{RowSource, RECIPIENT_ADDRESS_COLUMN};

/// Row source over pasted order text. Aggregate mode only: pasted text has
/// no recipient columns.
#[derive(Debug, Clone)]
pub struct TextRowSource {
    text: String,
}

impl TextRowSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    fn is_comma_dense(&self) -> bool {
        let comma_count = self.text.matches(',').count();
        let line_count = self.text.lines().count().max(1);
        comma_count * 10 > line_count * 3
    }
}

impl RowSource for TextRowSource {
    fn records(&self, mode: ParseMode) -> SourceResult<Vec<OrderRecord>> {
        if mode == ParseMode::PerRecipient {
            // Pasted text carries no recipient columns at all.
            return Err(SourceError::MissingColumn(RECIPIENT_ADDRESS_COLUMN.into()));
        }

        if self.text.trim().is_empty() {
            return Err(SourceError::EmptyFile);
        }
        if !self.is_comma_dense() {
            return Err(SourceError::UnsupportedLayout(
                "text is not a comma-dense order table".into(),
            ));
        }

        let mut records = Vec::new();
        for line in self.text.trim().lines() {
            for field in line.split_whitespace() {
                if field.contains(',') && OPTION_SHAPED.is_match(field) {
                    records.push(OrderRecord::bare(field));
                }
            }
        }

        debug!(records = records.len(), "scanned pasted order text");
        Ok(records)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_option_shaped_fields() {
        let text = "1001 olive-chiabata,3ea paid\n1002 cheese-chiabata,1ea paid\n";
        let source = TextRowSource::new(text);
        let records = source.records(ParseMode::Aggregate).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].option.as_deref(), Some("olive-chiabata,3ea"));
        assert_eq!(records[0].multiplier, 1);
    }

    #[test]
    fn test_sparse_commas_are_unsupported() {
        let text = "order one\norder two\norder three\nour only option,1ea is here\n\
                    more lines\nwithout commas\nat all\nkeep going\nnothing here\nnor here\n";
        let source = TextRowSource::new(text);
        let err = source.records(ParseMode::Aggregate).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedLayout(_)));
    }

    #[test]
    fn test_empty_text_is_error() {
        let source = TextRowSource::new("   \n  ");
        assert!(matches!(
            source.records(ParseMode::Aggregate),
            Err(SourceError::EmptyFile)
        ));
    }

    #[test]
    fn test_per_recipient_unsupported() {
        let source = TextRowSource::new("a,b\n");
        let err = source.records(ParseMode::PerRecipient).unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn(_)));
    }
}
