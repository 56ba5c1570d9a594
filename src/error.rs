//! Error types for the ordertally analysis pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`SourceError`] - row-source errors (file, encoding, column discovery)
//! - [`SinkError`] - result-sink errors (file, CSV writing)
//! - [`AnalysisError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! The core engine (normalize / parse / accumulate) is total and never
//! returns an error: a row that cannot be parsed simply contributes nothing.

use thiserror::Error;

// =============================================================================
// Row Source Errors
// =============================================================================

/// Errors while reading order rows from a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read the underlying file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the file content.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// The sheet layout could not be interpreted.
    #[error("Invalid sheet layout: {0}")]
    Parse(String),

    /// Empty input.
    #[error("Input is empty")]
    EmptyFile,

    /// No header row found.
    #[error("No headers found in input")]
    NoHeaders,

    /// A column required by the selected analysis mode is missing.
    ///
    /// Surfaced before any row is processed, so a misconfigured sheet never
    /// produces partial results.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// The pasted text does not follow a recognized order layout.
    #[error("Unsupported text layout: {0}")]
    UnsupportedLayout(String),
}

// =============================================================================
// Result Sink Errors
// =============================================================================

/// Errors while writing result tables.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Failed to write the output file.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

// =============================================================================
// Analysis Errors (top-level)
// =============================================================================

/// Top-level analysis orchestration errors.
///
/// This is the main error type returned by [`crate::analysis::analyze`].
/// It wraps all lower-level errors and adds analysis-specific variants.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Row-source error.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Result-sink error.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// The source yielded no rows at all.
    #[error("No rows to analyze")]
    EmptyInput,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for row-source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for result-sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;
