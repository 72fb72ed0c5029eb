//! # csv2ynab - Bank statement CSV to YNAB import conversion
//!
//! csv2ynab reads CSV exports from arbitrary banks (any delimiter, encoding,
//! date style or decimal convention) and produces the five-column file YNAB
//! imports: `Date, Payee, Memo, Outflow, Inflow`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Bank CSV   │────▶│   Parser    │────▶│  Transform  │────▶│  YNAB CSV   │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (map + rows)│     │  (quoted)   │
//! └─────────────┘     └─────────────┘     └──────┬──────┘     └─────────────┘
//!                                                │
//!                                         ┌──────┴──────┐
//!                                         │ Config cache│
//!                                         │ (per header)│
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use csv2ynab::{convert_file, to_ynab_csv, ConvertOptions};
//!
//! let conversion = convert_file("statement.csv", None, &ConvertOptions::default())?;
//! println!("{}", to_ynab_csv(&conversion.rows)?);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`logs`] - Log broadcasting
//! - [`models`] - Source records, canonical rows, statistics
//! - [`config`] - Mapping configuration and runtime settings
//! - [`parser`] - CSV parsing with auto-detection
//! - [`transform`] - Normalizers, row conversion and pipeline
//! - [`validation`] - Configuration and output checks
//! - [`export`] - YNAB CSV writer
//! - [`cache`] - Per-bank configuration cache

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Configuration
pub mod config;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Output
pub mod export;

// Caching
pub mod cache;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, CsvError, DateError, ExportError, PipelineError, RegistryError,
};

// =============================================================================
// Re-exports - Models & configuration
// =============================================================================

pub use models::{CanonicalRow, ProcessingStats, SourceRecord};

pub use config::{
    AmountMode, DateFormat, DecimalSeparator, MappingConfig, PayeeRule, Settings,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes, parse_file, parse_str,
    ParsedCsv,
};

// =============================================================================
// Re-exports - Normalizers
// =============================================================================

pub use transform::{
    detect_decimal_separator, format_amount, normalize_amount, normalize_date,
    resolve_mapping, sanitize_payee, transform_row, MappingSession, RowOutcome, SkipReason,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid_config, validate_config, validate_row};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{default_file_name, to_ynab_csv, write_ynab_csv};

// =============================================================================
// Re-exports - Registry (Cache)
// =============================================================================

pub use cache::{storage_key, ConfigRegistry, StoredConfig};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    convert, convert_bytes, convert_file, preview, process_all, process_records, BatchOutput,
    Conversion, ConvertOptions, CsvInfo, MappingOverrides, SkippedRow, PREVIEW_ROWS,
};
