//! Validation for mapping configurations and YNAB output rows.
//!
//! Two levels:
//!
//! ## Configuration (before processing)
//! - A date column is chosen
//! - An amount source is chosen for the active mode
//! - Every mapped column exists in the file's headers
//!
//! ## Canonical rows (after processing)
//! - Date is `YYYY-MM-DD`
//! - Amounts are empty or positive with exactly two decimals
//! - At most one of Outflow/Inflow is set
//!
//! # Example
//!
//! ```rust,ignore
//! use csv2ynab::validation::{validate_config, validate_row};
//!
//! let headers = vec!["Date".to_string(), "Amount".to_string()];
//! assert!(validate_config(&config, &headers).is_ok());
//! assert!(validate_row(&row).is_ok());
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::MappingConfig;
use crate::error::ConfigError;
use crate::models::CanonicalRow;

static CANONICAL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid canonical date regex"));
static CANONICAL_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]{2}$").expect("valid canonical amount regex"));

/// Check a configuration against the headers of the file it will process.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &MappingConfig, headers: &[String]) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.validate() {
        errors.push(e);
    }

    for (field, column) in config.mapped_columns() {
        if !headers.iter().any(|h| h == column) {
            errors.push(ConfigError::UnknownColumn {
                field: field.to_string(),
                column: column.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check, see [`validate_config`].
pub fn is_valid_config(config: &MappingConfig, headers: &[String]) -> bool {
    validate_config(config, headers).is_ok()
}

/// Check one output row against the YNAB import format.
pub fn validate_row(row: &CanonicalRow) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if !CANONICAL_DATE.is_match(&row.date) {
        errors.push(format!("Date '{}' is not YYYY-MM-DD", row.date));
    }

    for (name, value) in [("Outflow", &row.outflow), ("Inflow", &row.inflow)] {
        if !value.is_empty() && !CANONICAL_AMOUNT.is_match(value) {
            errors.push(format!("{} '{}' is not a two-decimal amount", name, value));
        }
    }

    if !row.outflow.is_empty() && !row.inflow.is_empty() {
        errors.push("Outflow and Inflow are both set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate rows and return (valid, invalid, first errors by row index).
pub fn validate_rows(rows: &[CanonicalRow]) -> (usize, usize, Vec<(usize, Vec<String>)>) {
    let mut valid = 0;
    let mut invalid = 0;
    let mut errors = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        match validate_row(row) {
            Ok(()) => valid += 1,
            Err(errs) => {
                invalid += 1;
                if errors.len() < 10 {
                    errors.push((i, errs));
                }
            }
        }
    }

    (valid, invalid, errors)
}
