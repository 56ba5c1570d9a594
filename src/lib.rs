//! # Ordertally - order-sheet option parsing and product tallies
//!
//! Ordertally turns the per-row "option" strings of e-commerce order
//! exports (a product label plus a free-form quantity descriptor) into
//! normalized product tallies, optionally bucketed per recipient.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Order rows │────▶│ OptionParser│────▶│ Accumulators│────▶│ Result sink │
//! │ (RowSource) │     │ (+Normalize)│     │ (tallies)   │     │ (CSV table) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! The core (normalize / parse / aggregate) is pure and synchronous; rows
//! may be partitioned across workers and the partial tallies merged by
//! pointwise summation, because accumulation is commutative and
//! associative.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ordertally::analysis::{analyze, AnalysisOptions};
//! use ordertally::source::CsvRowSource;
//!
//! let source = CsvRowSource::open("orders.csv")?;
//! let report = analyze(&source, AnalysisOptions::aggregate())?;
//! println!("{} distinct products", report.totals().unwrap().len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (ParseMode, ItemCount, RecipientKey)
//! - [`normalize`] - Product-label normalization rules
//! - [`parse`] - The option-parsing cascade
//! - [`aggregate`] - Tally accumulation and merging
//! - [`source`] - Row sources (CSV export, pasted text)
//! - [`sink`] - Result sinks (CSV tables)
//! - [`analysis`] - Orchestration

// Core modules
pub mod error;
pub mod models;

// Normalization and parsing
pub mod normalize;
pub mod parse;

// Accumulation
pub mod aggregate;

// Collaborators
pub mod source;
pub mod sink;

// Orchestration
pub mod analysis;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AnalysisError,
    AnalysisResult,
    SinkError,
    SinkResult,
    SourceError,
    SourceResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    BundlePolicy,
    ItemCount,
    OrderRecord,
    ParseMode,
    RecipientFields,
    RecipientKey,
};

// =============================================================================
// Re-exports - Core engine
// =============================================================================

pub use normalize::normalize;
pub use parse::OptionParser;
pub use aggregate::{ProductCounts, RecipientEntry, RecipientLedger};

// =============================================================================
// Re-exports - Collaborators
// =============================================================================

pub use source::{CsvRowSource, RowSource, TextRowSource};
pub use sink::{CsvSink, ResultSink};

// =============================================================================
// Re-exports - Analysis
// =============================================================================

pub use analysis::{analyze, AnalysisOptions, AnalysisOutcome, AnalysisReport};
