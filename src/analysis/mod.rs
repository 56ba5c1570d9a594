//! High-level analysis orchestration.
//!
//! Combines a row source, the option parser and the accumulators into one
//! call: fetch rows, parse each option, fold the results into a flat tally
//! or a per-recipient ledger, and report what was processed and what was
//! skipped.
//!
//! Column/configuration problems surface from the source before any row is
//! parsed, so a failed run never leaves partial results behind.

use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{ProductCounts, RecipientLedger};
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{BundlePolicy, ParseMode};
use crate::parse::OptionParser;
use crate::source::RowSource;

// =============================================================================
// Options
// =============================================================================

/// Options for one analysis run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AnalysisOptions {
    /// Flat tally or per-recipient ledger.
    pub mode: ParseMode,
    /// How the 5-flavor-set bundle scales (see DESIGN.md).
    pub bundle_policy: BundlePolicy,
}

impl AnalysisOptions {
    pub fn aggregate() -> Self {
        Self { mode: ParseMode::Aggregate, ..Self::default() }
    }

    pub fn per_recipient() -> Self {
        Self { mode: ParseMode::PerRecipient, ..Self::default() }
    }

    pub fn with_bundle_policy(mut self, policy: BundlePolicy) -> Self {
        self.bundle_policy = policy;
        self
    }
}

// =============================================================================
// Report
// =============================================================================

/// Result of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// The finished tallies.
    pub outcome: AnalysisOutcome,
    /// Rows that contributed at least one item.
    pub rows_processed: usize,
    /// Rows that contributed nothing (blank or unparseable options).
    pub rows_skipped: usize,
}

/// The tallies produced by a run, shaped by [`ParseMode`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Aggregate { totals: ProductCounts },
    PerRecipient { ledger: RecipientLedger },
}

impl AnalysisReport {
    /// Flat totals, if this was an aggregate run.
    pub fn totals(&self) -> Option<&ProductCounts> {
        match &self.outcome {
            AnalysisOutcome::Aggregate { totals } => Some(totals),
            AnalysisOutcome::PerRecipient { .. } => None,
        }
    }

    /// Per-recipient ledger, if this was a per-recipient run.
    pub fn ledger(&self) -> Option<&RecipientLedger> {
        match &self.outcome {
            AnalysisOutcome::Aggregate { .. } => None,
            AnalysisOutcome::PerRecipient { ledger } => Some(ledger),
        }
    }
}

// =============================================================================
// Analysis
// =============================================================================

/// Run one analysis over a row source.
///
/// # Example
/// ```no_run
/// use ordertally::analysis::{analyze, AnalysisOptions};
/// use ordertally::source::CsvRowSource;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = CsvRowSource::open("orders.csv")?;
///     let report = analyze(&source, AnalysisOptions::aggregate())?;
///     for (product, quantity) in report.totals().unwrap().iter() {
///         println!("{product}: {quantity}");
///     }
///     Ok(())
/// }
/// ```
pub fn analyze<S: RowSource>(source: &S, options: AnalysisOptions) -> AnalysisResult<AnalysisReport> {
    let records = source.records(options.mode)?;
    if records.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let parser = OptionParser::new(options.bundle_policy);
    let mut totals = ProductCounts::new();
    let mut ledger = RecipientLedger::new();
    let mut rows_processed = 0usize;
    let mut rows_skipped = 0usize;

    for record in &records {
        let Some(option) = record.option.as_deref() else {
            rows_skipped += 1;
            continue;
        };

        let mut contributed = false;
        match options.mode {
            ParseMode::Aggregate => {
                let items = parser.parse(option, record.multiplier, options.mode);
                contributed = !items.is_empty();
                totals.accumulate(items);
            }
            ParseMode::PerRecipient => {
                let Some(recipient) = record.recipient.as_ref() else {
                    debug!("per-recipient row without recipient fields skipped");
                    rows_skipped += 1;
                    continue;
                };
                // One cell may hold several option lines.
                for line in option.lines().filter(|l| !l.trim().is_empty()) {
                    let items = parser.parse(line.trim(), record.multiplier, options.mode);
                    if !items.is_empty() {
                        contributed = true;
                        ledger.record(recipient, items);
                    }
                }
            }
        }

        if contributed {
            rows_processed += 1;
        } else {
            rows_skipped += 1;
        }
    }

    info!(
        rows = records.len(),
        processed = rows_processed,
        skipped = rows_skipped,
        "analysis finished"
    );

    let outcome = match options.mode {
        ParseMode::Aggregate => AnalysisOutcome::Aggregate { totals },
        ParseMode::PerRecipient => AnalysisOutcome::PerRecipient { ledger },
    };

    Ok(AnalysisReport { outcome, rows_processed, rows_skipped })
}

// =============================================================================
// Tests
// =============================================================================
