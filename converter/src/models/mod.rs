//! Domain models for the csv2ynab conversion pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`SourceRecord`] - One raw bank statement row keyed by column header
//! - [`CanonicalRow`] - One YNAB import row (Date, Payee, Memo, Outflow, Inflow)
//! - [`ProcessingStats`] - Summary of a batch conversion

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Source rows
// =============================================================================

/// A raw input row: column header -> cell value.
///
/// Every record of one import shares the same header set.
pub type SourceRecord = HashMap<String, String>;

// =============================================================================
// Canonical output
// =============================================================================

/// A transaction in the YNAB import format.
///
/// All fields are strings so the row can be serialized as-is. `date` is
/// always `YYYY-MM-DD`; at most one of `outflow`/`inflow` is non-empty and a
/// non-empty amount always has two decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Payee")]
    pub payee: String,
    #[serde(rename = "Memo")]
    pub memo: String,
    #[serde(rename = "Outflow")]
    pub outflow: String,
    #[serde(rename = "Inflow")]
    pub inflow: String,
}

impl CanonicalRow {
    /// Column headers of the YNAB import file, in output order.
    pub const HEADERS: [&'static str; 5] = ["Date", "Payee", "Memo", "Outflow", "Inflow"];

    /// Fields in [`CanonicalRow::HEADERS`] order.
    pub fn fields(&self) -> [&str; 5] {
        [&self.date, &self.payee, &self.memo, &self.outflow, &self.inflow]
    }

    /// Numeric value of the Outflow field (0 when empty).
    pub fn outflow_value(&self) -> f64 {
        field_value(&self.outflow)
    }

    /// Numeric value of the Inflow field (0 when empty).
    pub fn inflow_value(&self) -> f64 {
        field_value(&self.inflow)
    }
}

fn field_value(field: &str) -> f64 {
    if field.is_empty() {
        return 0.0;
    }
    field.parse().unwrap_or(0.0)
}

// =============================================================================
// Statistics
// =============================================================================

/// Aggregate figures for one conversion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStats {
    /// Number of input records.
    pub total_rows: usize,
    /// Records that produced an output row.
    pub valid_rows: usize,
    /// Records that were dropped.
    pub skipped_rows: usize,
    /// Sum of emitted Inflow values.
    pub total_inflow: f64,
    /// Sum of emitted Outflow values.
    pub total_outflow: f64,
}

impl ProcessingStats {
    /// Net movement: inflow minus outflow.
    pub fn net(&self) -> f64 {
        self.total_inflow - self.total_outflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(outflow: &str, inflow: &str) -> CanonicalRow {
        CanonicalRow {
            date: "2024-01-15".into(),
            payee: "Bakery".into(),
            memo: String::new(),
            outflow: outflow.into(),
            inflow: inflow.into(),
        }
    }

    #[test]
    fn test_field_values() {
        let r = row("12.50", "");
        assert_eq!(r.outflow_value(), 12.5);
        assert_eq!(r.inflow_value(), 0.0);
    }

    #[test]
    fn test_serializes_with_ynab_headers() {
        let json = serde_json::to_value(row("", "3.00")).unwrap();
        assert_eq!(json["Date"], "2024-01-15");
        assert_eq!(json["Inflow"], "3.00");
        assert_eq!(json["Outflow"], "");
    }

    #[test]
    fn test_stats_net() {
        let stats = ProcessingStats {
            total_rows: 3,
            valid_rows: 2,
            skipped_rows: 1,
            total_inflow: 100.0,
            total_outflow: 40.5,
        };
        assert!((stats.net() - 59.5).abs() < 1e-9);
    }
}
