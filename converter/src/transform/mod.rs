//! Transformation module.
//!
//! This module handles bank statement to YNAB conversion:
//! - Amount: decimal separator detection and amount parsing
//! - Date: date normalization to `YYYY-MM-DD`
//! - Payee: noise stripping and replacement rules
//! - Mapping: default column mapping and the editing session
//! - Row: single row conversion
//! - Pipeline: batch processing and the full conversion

pub mod amount;
pub mod date;
pub mod mapping;
pub mod payee;
pub mod pipeline;
pub mod row;

pub use amount::{detect_decimal_separator, format_amount, normalize_amount};
pub use date::{normalize_date, AUTO_PATTERNS};
pub use mapping::{resolve_mapping, MappingSession, SAMPLE_ROWS};
pub use payee::sanitize_payee;
pub use pipeline::*;
pub use row::{transform_row, RowOutcome, SkipReason};
