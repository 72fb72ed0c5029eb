//! Single row conversion.
//!
//! One [`SourceRecord`] becomes either a [`CanonicalRow`] or a skip. Skips
//! carry the reason so callers can report them; they are never errors.

use crate::config::{AmountMode, MappingConfig};
use crate::models::{CanonicalRow, SourceRecord};
use crate::transform::amount::{format_amount, normalize_amount};
use crate::transform::date::normalize_date;
use crate::transform::payee::sanitize_payee;

/// Why a row produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Date cell missing or empty.
    MissingDate,
    /// Date cell present but not normalizable.
    InvalidDate,
    /// Amount cell(s) empty while `skip_empty_amount` is set.
    EmptyAmount,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SkipReason::MissingDate => "missing date",
            SkipReason::InvalidDate => "unreadable date",
            SkipReason::EmptyAmount => "empty amount",
        }
    }
}

/// Result of converting one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Emit(CanonicalRow),
    Skip(SkipReason),
}

impl RowOutcome {
    pub fn into_row(self) -> Option<CanonicalRow> {
        match self {
            RowOutcome::Emit(row) => Some(row),
            RowOutcome::Skip(_) => None,
        }
    }
}

fn cell<'a>(row: &'a SourceRecord, column: Option<&str>) -> &'a str {
    column
        .and_then(|c| row.get(c))
        .map(String::as_str)
        .unwrap_or("")
}

/// Convert one source record.
///
/// 1. The date must be present and normalizable.
/// 2. Amounts: in single mode the sign decides the side (zero is always an
///    inflow); in separate mode a positive outflow wins over a positive
///    inflow. Empty amount cells skip the row when `skip_empty_amount` is set.
/// 3. Payee and memo are optionally trimmed, then the payee is sanitized.
/// 4. Non-positive amounts are rendered as empty strings.
pub fn transform_row(row: &SourceRecord, config: &MappingConfig) -> RowOutcome {
    // 1. Date
    let raw_date = cell(row, Some(config.date_column.as_str()));
    if raw_date.is_empty() {
        return RowOutcome::Skip(SkipReason::MissingDate);
    }
    let date = match normalize_date(raw_date, &config.date_format) {
        Ok(date) => date,
        Err(_) => return RowOutcome::Skip(SkipReason::InvalidDate),
    };

    // 2. Amounts
    let mut outflow = 0.0;
    let mut inflow = 0.0;

    match config.amount_mode {
        AmountMode::Single => {
            if let Some(column) = config.amount_column.as_deref() {
                let raw = cell(row, Some(column));
                if config.skip_empty_amount && raw.is_empty() {
                    return RowOutcome::Skip(SkipReason::EmptyAmount);
                }

                let amount = normalize_amount(raw, config.decimal_separator);
                if config.is_negative_outflow {
                    if amount < 0.0 {
                        outflow = amount.abs();
                    } else {
                        inflow = amount;
                    }
                } else if amount > 0.0 {
                    outflow = amount;
                } else {
                    inflow = amount.abs();
                }
            }
        }
        AmountMode::Separate => {
            let raw_outflow = cell(row, config.outflow_column.as_deref());
            let raw_inflow = cell(row, config.inflow_column.as_deref());
            if config.skip_empty_amount && raw_outflow.is_empty() && raw_inflow.is_empty() {
                return RowOutcome::Skip(SkipReason::EmptyAmount);
            }

            let out_value = normalize_amount(raw_outflow, config.decimal_separator);
            let in_value = normalize_amount(raw_inflow, config.decimal_separator);
            if out_value > 0.0 {
                outflow = out_value;
            } else if in_value > 0.0 {
                inflow = in_value;
            }
        }
    }

    // 3. Payee & memo
    let mut payee = cell(row, config.payee_column.as_deref());
    let mut memo = cell(row, config.memo_column.as_deref());
    if config.trim_whitespace {
        payee = payee.trim();
        memo = memo.trim();
    }
    let payee = sanitize_payee(payee, config.auto_clean_payee, &config.payee_rules);

    // 4. Output
    RowOutcome::Emit(CanonicalRow {
        date,
        payee,
        memo: memo.to_string(),
        outflow: format_amount(outflow),
        inflow: format_amount(inflow),
    })
}
