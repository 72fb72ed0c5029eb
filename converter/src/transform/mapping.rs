//! Default column mapping.
//!
//! [`resolve_mapping`] proposes a [`MappingConfig`] from header names and a
//! few sample rows. [`MappingSession`] carries that proposal through user
//! edits and decides when the decimal separator is re-detected.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{AmountMode, DecimalSeparator, MappingConfig};
use crate::models::SourceRecord;
use crate::transform::amount::detect_decimal_separator;

/// Number of leading rows used as the detection sample.
pub const SAMPLE_ROWS: usize = 20;

static DATE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)date|time").expect("valid date header regex"));
static PAYEE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)payee|description|merchant|name").expect("valid payee header regex")
});
static MEMO_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)memo|reference|note").expect("valid memo header regex"));
static AMOUNT_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)amount|value|sum").expect("valid amount header regex"));

fn first_match(headers: &[String], pattern: &Regex) -> Option<String> {
    headers.iter().find(|h| pattern.is_match(h)).cloned()
}

/// The first [`SAMPLE_ROWS`] records.
pub fn sample_rows(records: &[SourceRecord]) -> &[SourceRecord] {
    &records[..records.len().min(SAMPLE_ROWS)]
}

/// Guess the decimal separator from one column of the sample.
///
/// Rows without the column are ignored; no column means a dot.
pub fn detect_column_separator(sample: &[SourceRecord], column: Option<&str>) -> DecimalSeparator {
    match column {
        Some(column) if !column.is_empty() => {
            detect_decimal_separator(sample.iter().filter_map(|row| row.get(column)))
        }
        _ => DecimalSeparator::Dot,
    }
}

/// Propose a mapping from header names and sample rows.
///
/// Each field takes the first header matching its keywords; the separator
/// is detected on the amount column. Mode is `single`, negative amounts are
/// outflows, rows with empty amounts are skipped and whitespace is trimmed.
pub fn resolve_mapping(headers: &[String], sample: &[SourceRecord]) -> MappingConfig {
    let amount_column = first_match(headers, &AMOUNT_HEADER);
    let decimal_separator = detect_column_separator(sample, amount_column.as_deref());

    MappingConfig {
        date_column: first_match(headers, &DATE_HEADER).unwrap_or_default(),
        payee_column: first_match(headers, &PAYEE_HEADER),
        memo_column: first_match(headers, &MEMO_HEADER),
        amount_mode: AmountMode::Single,
        amount_column,
        decimal_separator,
        is_negative_outflow: true,
        skip_empty_amount: true,
        trim_whitespace: true,
        ..MappingConfig::default()
    }
}

/// Interactive editing state for one import.
///
/// Without an initial configuration, choosing a new amount column silently
/// re-detects the decimal separator. Once a configuration was supplied (a
/// cached one, or one from a previous step) the user's separator is kept.
#[derive(Debug, Clone)]
pub struct MappingSession {
    headers: Vec<String>,
    sample: Vec<SourceRecord>,
    config: MappingConfig,
    has_initial_config: bool,
}

impl MappingSession {
    /// Start from `initial` when given, otherwise from [`resolve_mapping`].
    pub fn new(headers: Vec<String>, records: &[SourceRecord], initial: Option<MappingConfig>) -> Self {
        let sample = sample_rows(records).to_vec();
        let has_initial_config = initial.is_some();
        let config = initial.unwrap_or_else(|| resolve_mapping(&headers, &sample));
        Self {
            headers,
            sample,
            config,
            has_initial_config,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut MappingConfig {
        &mut self.config
    }

    pub fn into_config(self) -> MappingConfig {
        self.config
    }

    pub fn has_initial_config(&self) -> bool {
        self.has_initial_config
    }

    /// What detection would choose for the active amount source.
    pub fn detected_separator(&self) -> DecimalSeparator {
        detect_column_separator(&self.sample, self.config.amount_source_column())
    }

    pub fn set_amount_column(&mut self, column: Option<String>) {
        self.config.amount_column = column.filter(|c| !c.is_empty());
        if let Some(column) = self.config.amount_column.clone() {
            self.redetect(&column);
        }
    }

    pub fn set_outflow_column(&mut self, column: Option<String>) {
        self.config.outflow_column = column.filter(|c| !c.is_empty());
        if let Some(column) = self.config.outflow_column.clone() {
            self.redetect(&column);
        }
    }

    pub fn set_inflow_column(&mut self, column: Option<String>) {
        self.config.inflow_column = column.filter(|c| !c.is_empty());
        if let Some(column) = self.config.inflow_column.clone() {
            self.redetect(&column);
        }
    }

    fn redetect(&mut self, column: &str) {
        if self.has_initial_config {
            return;
        }
        self.config.decimal_separator = detect_column_separator(&self.sample, Some(column));
    }
}
