//! Error types for the csv2ynab conversion pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - Reading and parsing the bank statement
//! - [`DateError`] - Date normalization failures (row-level)
//! - [`ConfigError`] - Mapping configuration invalidity
//! - [`RegistryError`] - Cached configuration storage errors
//! - [`ExportError`] - Writing the YNAB import file
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Row-level problems ([`DateError`], unparseable amounts) never escape the
//! batch processor: they turn into skipped rows.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while reading a bank statement.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid CSV format.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// No data rows.
    #[error("The CSV file appears to be empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Date Errors
// =============================================================================

/// Reasons a raw date token could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// Nothing left after trimming.
    #[error("Empty date value")]
    Empty,

    /// The token does not match the requested pattern.
    #[error("'{value}' does not match date format '{pattern}'")]
    NoMatch { value: String, pattern: String },

    /// None of the auto-detection patterns produced a plausible date.
    #[error("Could not detect date format of '{0}'")]
    Undetected(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// A mapping configuration that cannot be used for processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No date column selected.
    #[error("No date column selected")]
    MissingDateColumn,

    /// Single-column mode without an amount column.
    #[error("No amount column selected")]
    MissingAmountColumn,

    /// Separate mode without any outflow or inflow column.
    #[error("Select an outflow or an inflow column")]
    MissingOutflowInflow,

    /// A mapped column does not exist in the file.
    #[error("Column '{column}' (mapped as {field}) not found in headers")]
    UnknownColumn { field: String, column: String },

    /// Malformed command-line value.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors from the cached configuration registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No configuration stored for this header set.
    #[error("No cached configuration for key {0}")]
    NotFound(String),

    /// IO error.
    #[error("Registry IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Registry JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing the YNAB import file.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer failure.
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("Export IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Output was not valid UTF-8.
    #[error("Export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::convert`].
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Registry error.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// No records to transform.
    #[error("No records to transform")]
    EmptyInput,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for date normalization.
pub type DateResult<T> = Result<T, DateError>;

/// Result type for configuration checks.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
