//! Result sinks: where finished tallies go.
//!
//! The core hands a finished [`ProductCounts`] or [`RecipientLedger`] to a
//! sink and is done; display, file format and layout are the sink's
//! business.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::aggregate::{ProductCounts, RecipientEntry, RecipientLedger};
use crate::error::SinkResult;

// =============================================================================
// Sink Abstraction
// =============================================================================

/// Receives finished analysis results.
pub trait ResultSink {
    /// Write a flat product tally.
    fn write_totals(&mut self, totals: &ProductCounts) -> SinkResult<()>;

    /// Write per-recipient tallies with recipient metadata.
    fn write_recipients(&mut self, ledger: &RecipientLedger) -> SinkResult<()>;
}

// =============================================================================
// CSV Sink
// =============================================================================

/// Writes result tables as CSV.
///
/// A UTF-8 BOM is emitted first so spreadsheet applications pick the
/// encoding up when the seller double-clicks the file.
#[derive(Debug)]
pub struct CsvSink<W: io::Write> {
    inner: W,
}

impl CsvSink<File> {
    /// Create a sink writing to a fresh file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> SinkResult<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: io::Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Consume the sink and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_bom(&mut self) -> SinkResult<()> {
        self.inner.write_all(b"\xEF\xBB\xBF")?;
        Ok(())
    }
}

impl<W: io::Write> ResultSink for CsvSink<W> {
    fn write_totals(&mut self, totals: &ProductCounts) -> SinkResult<()> {
        self.write_bom()?;

        let mut writer = csv::Writer::from_writer(&mut self.inner);
        writer.write_record(["product", "quantity"])?;
        for (name, quantity) in totals.iter() {
            let quantity = quantity.to_string();
            writer.write_record([name, quantity.as_str()])?;
        }
        writer.flush()?;

        debug!(products = totals.len(), "wrote totals table");
        Ok(())
    }

    fn write_recipients(&mut self, ledger: &RecipientLedger) -> SinkResult<()> {
        self.write_bom()?;

        // Earliest orders first; entries without a timestamp go last.
        let mut entries: Vec<&RecipientEntry> = ledger.iter().map(|(_, e)| e).collect();
        entries.sort_by_key(|e| (e.first_order.is_none(), e.first_order));

        let mut writer = csv::Writer::from_writer(&mut self.inner);
        writer.write_record(["name", "phone", "address", "orders"])?;
        for entry in entries {
            let orders = order_summary(entry);
            writer.write_record([
                entry.name.as_str(),
                entry.phone.as_str(),
                entry.address.as_str(),
                orders.as_str(),
            ])?;
        }
        writer.flush()?;

        debug!(recipients = ledger.len(), "wrote recipient table");
        Ok(())
    }
}

/// One recipient's orders as a single display string.
pub fn order_summary(entry: &RecipientEntry) -> String {
    let parts: Vec<String> = entry
        .counts
        .iter()
        .map(|(name, quantity)| format!("{name} {quantity}ea"))
        .collect();
    parts.join(" / ")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemCount, RecipientFields};
    use chrono::NaiveDate;

    fn write_totals_to_string(totals: &ProductCounts) -> String {
        let mut sink = CsvSink::new(Vec::new());
        sink.write_totals(totals).unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_totals_sorted_with_bom() {
        let totals: ProductCounts = vec![
            ItemCount::new("napoli-chiabata", 3),
            ItemCount::new("cheese-chiabata", 15),
        ]
        .into_iter()
        .collect();

        let out = write_totals_to_string(&totals);
        assert!(out.starts_with('\u{feff}'));
        let body = out.trim_start_matches('\u{feff}');
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "product,quantity");
        assert_eq!(lines[1], "cheese-chiabata,15");
        assert_eq!(lines[2], "napoli-chiabata,3");
    }

    #[test]
    fn test_recipients_sorted_by_earliest_order() {
        let early = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(9, 0, 0);
        let late = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap().and_hms_opt(9, 0, 0);

        let mut ledger = RecipientLedger::new();
        ledger.record(
            &RecipientFields {
                name: "Lee".into(),
                phone: "010-2".into(),
                address: "9 Oak Lane".into(),
                order_date: late,
            },
            vec![ItemCount::new("cheese-chiabata", 1)],
        );
        ledger.record(
            &RecipientFields {
                name: "Kim".into(),
                phone: "010-1".into(),
                address: "1 Elm Road".into(),
                order_date: early,
            },
            vec![
                ItemCount::new("olive-chiabata", 2),
                ItemCount::new("plain-chiabata", 1),
            ],
        );

        let mut sink = CsvSink::new(Vec::new());
        sink.write_recipients(&ledger).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let body = out.trim_start_matches('\u{feff}');
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines[0], "name,phone,address,orders");
        // Kim ordered first even though Lee sorts first by address.
        assert!(lines[1].starts_with("Kim,"));
        assert!(lines[1].contains("olive-chiabata 2ea / plain-chiabata 1ea"));
        assert!(lines[2].starts_with("Lee,"));
    }

    #[test]
    fn test_order_summary_shape() {
        let mut ledger = RecipientLedger::new();
        ledger.record(
            &RecipientFields {
                name: "Kim".into(),
                phone: "010-1".into(),
                address: "1 Elm Road".into(),
                order_date: None,
            },
            vec![ItemCount::new("olive-chiabata", 10)],
        );
        let (_, entry) = ledger.iter().next().unwrap();
        assert_eq!(order_summary(entry), "olive-chiabata 10ea");
    }
}
