//! Batch processing and the high-level conversion pipeline.
//!
//! [`process_all`] is the pure core: records + config in, rows + stats out.
//! [`convert`] wraps it with everything around a real import: picking a
//! configuration (explicit, cached or inferred), applying overrides,
//! validation, logging and remembering the configuration for next time.
//!
//! # Example
//!
//! ```rust,ignore
//! use csv2ynab::transform::pipeline::{convert_file, ConvertOptions};
//!
//! let conversion = convert_file("statement.csv", None, &ConvertOptions::default())?;
//! println!("{} rows, net {:.2}", conversion.rows.len(), conversion.stats.net());
//! ```

use serde::Serialize;
use std::path::Path;

use crate::cache::{storage_key, ConfigRegistry};
use crate::config::{
    AmountMode, DateFormat, DecimalSeparator, MappingConfig, PayeeRule, Settings,
};
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::models::{CanonicalRow, ProcessingStats, SourceRecord};
use crate::parser::{parse_bytes, parse_file, ParsedCsv};
use crate::transform::mapping::MappingSession;
use crate::transform::row::{transform_row, RowOutcome, SkipReason};
use crate::validation::{validate_config, validate_rows};

/// Rows shown by previews.
pub const PREVIEW_ROWS: usize = 50;

// =============================================================================
// Batch processing (pure)
// =============================================================================

/// A source row that produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedRow {
    /// Zero-based index in the input records
    pub row: usize,
    pub reason: SkipReason,
}

/// Full outcome of a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutput {
    pub rows: Vec<CanonicalRow>,
    pub stats: ProcessingStats,
    pub skipped: Vec<SkippedRow>,
}

/// Convert every record in input order and keep track of skips.
pub fn process_records(records: &[SourceRecord], config: &MappingConfig) -> BatchOutput {
    let mut rows = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    let mut stats = ProcessingStats {
        total_rows: records.len(),
        ..ProcessingStats::default()
    };

    for (i, record) in records.iter().enumerate() {
        match transform_row(record, config) {
            RowOutcome::Emit(row) => {
                // Sum what is displayed, not the pre-format values
                stats.total_outflow += row.outflow_value();
                stats.total_inflow += row.inflow_value();
                stats.valid_rows += 1;
                rows.push(row);
            }
            RowOutcome::Skip(reason) => {
                stats.skipped_rows += 1;
                skipped.push(SkippedRow { row: i, reason });
            }
        }
    }

    BatchOutput { rows, stats, skipped }
}

/// Convert every record in input order.
///
/// Never fails: bad rows are counted in `skipped_rows`.
pub fn process_all(records: &[SourceRecord], config: &MappingConfig) -> (Vec<CanonicalRow>, ProcessingStats) {
    let output = process_records(records, config);
    (output.rows, output.stats)
}

/// The first [`PREVIEW_ROWS`] rows.
pub fn preview(rows: &[CanonicalRow]) -> &[CanonicalRow] {
    &rows[..rows.len().min(PREVIEW_ROWS)]
}

// =============================================================================
// Overrides
// =============================================================================

/// Mapping changes requested on top of the starting configuration.
#[derive(Debug, Clone, Default)]
pub struct MappingOverrides {
    pub date_column: Option<String>,
    pub payee_column: Option<String>,
    pub memo_column: Option<String>,
    /// Also switches to [`AmountMode::Single`]
    pub amount_column: Option<String>,
    /// Also switches to [`AmountMode::Separate`]
    pub outflow_column: Option<String>,
    /// Also switches to [`AmountMode::Separate`]
    pub inflow_column: Option<String>,
    pub date_format: Option<DateFormat>,
    pub decimal_separator: Option<DecimalSeparator>,
    pub positive_outflow: bool,
    pub keep_empty_amount: bool,
    pub no_trim: bool,
    pub auto_clean: bool,
    pub rules: Vec<PayeeRule>,
    pub swap_payee_memo: bool,
}

impl MappingOverrides {
    /// Apply to a session. The payee/memo swap runs before the explicit
    /// payee and memo columns. Amount column changes go through the session
    /// so the decimal separator follows the usual re-detection policy; an
    /// explicit separator is applied last and always wins.
    pub fn apply(&self, session: &mut MappingSession) {
        let config = session.config_mut();
        // Swap first so explicit payee/memo columns land where they were asked
        if self.swap_payee_memo {
            config.swap_payee_memo();
        }
        if let Some(ref column) = self.date_column {
            config.date_column = column.clone();
        }
        if let Some(ref column) = self.payee_column {
            config.payee_column = Some(column.clone()).filter(|c| !c.is_empty());
        }
        if let Some(ref column) = self.memo_column {
            config.memo_column = Some(column.clone()).filter(|c| !c.is_empty());
        }
        if let Some(ref format) = self.date_format {
            config.date_format = format.clone();
        }
        if self.positive_outflow {
            config.is_negative_outflow = false;
        }
        if self.keep_empty_amount {
            config.skip_empty_amount = false;
        }
        if self.no_trim {
            config.trim_whitespace = false;
        }
        if self.auto_clean {
            config.auto_clean_payee = true;
        }
        for rule in &self.rules {
            config.add_payee_rule(rule.clone());
        }

        if self.amount_column.is_some() {
            session.config_mut().amount_mode = AmountMode::Single;
            session.set_amount_column(self.amount_column.clone());
        }
        if self.outflow_column.is_some() || self.inflow_column.is_some() {
            session.config_mut().amount_mode = AmountMode::Separate;
            if self.outflow_column.is_some() {
                session.set_outflow_column(self.outflow_column.clone());
            }
            if self.inflow_column.is_some() {
                session.set_inflow_column(self.inflow_column.clone());
            }
        }

        if let Some(separator) = self.decimal_separator {
            session.config_mut().decimal_separator = separator;
        }
    }
}

// =============================================================================
// Conversion pipeline
// =============================================================================

/// Options for [`convert`]
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Use this configuration instead of the cached or inferred one
    pub config: Option<MappingConfig>,

    /// Changes applied on top of the starting configuration
    pub overrides: MappingOverrides,

    /// Cache location and global switch
    pub settings: Settings,

    /// Don't look up a cached configuration
    pub no_cache: bool,

    /// Don't save the configuration used
    pub no_save: bool,
}

/// CSV file information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl CsvInfo {
    pub fn from_parsed(parsed: &ParsedCsv) -> Self {
        Self {
            encoding: parsed.encoding.clone(),
            delimiter: parsed.delimiter,
            headers: parsed.headers.clone(),
            row_count: parsed.records.len(),
        }
    }
}

/// Result of a complete conversion
#[derive(Debug, Clone)]
pub struct Conversion {
    /// YNAB rows, in input order
    pub rows: Vec<CanonicalRow>,

    pub stats: ProcessingStats,

    /// Rows that produced no output
    pub skipped: Vec<SkippedRow>,

    /// Configuration actually used
    pub config: MappingConfig,

    /// The starting configuration came from the cache
    pub from_cache: bool,

    /// Cache key the configuration was saved under
    pub cache_key: Option<String>,

    pub csv_info: CsvInfo,
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        other => other.to_string(),
    }
}

/// Parse a file and convert it.
pub fn convert_file<P: AsRef<Path>>(
    path: P,
    delimiter: Option<char>,
    options: &ConvertOptions,
) -> PipelineResult<Conversion> {
    log_info("📖 Reading CSV file...");
    let parsed = parse_file(path, delimiter)?;
    convert(&parsed, options)
}

/// Parse raw bytes and convert them.
pub fn convert_bytes(
    bytes: &[u8],
    delimiter: Option<char>,
    options: &ConvertOptions,
) -> PipelineResult<Conversion> {
    log_info("📖 Reading CSV data...");
    let parsed = parse_bytes(bytes, delimiter)?;
    convert(&parsed, options)
}

/// Build the mapping session for a parsed file: explicit config, else the
/// cached one, else inferred defaults. Returns whether the cache was used.
pub fn start_session(parsed: &ParsedCsv, options: &ConvertOptions) -> (MappingSession, bool) {
    if let Some(ref config) = options.config {
        log_info("Using provided configuration");
        let session = MappingSession::new(parsed.headers.clone(), &parsed.records, Some(config.clone()));
        return (session, false);
    }

    if cache_enabled(options) && !options.no_cache {
        log_info("Looking for a cached configuration...");
        let registry = ConfigRegistry::from_settings(&options.settings);
        if let Some(stored) = registry.get(&parsed.headers) {
            log_success(format!(
                "Found cached configuration {} (saved {})",
                stored.key, stored.saved_at
            ));
            let session = MappingSession::new(
                parsed.headers.clone(),
                &parsed.records,
                Some(stored.config.clone()),
            );
            return (session, true);
        }
        log_warning("No cached configuration for these headers");
    }

    log_info("🔍 Inferring column mapping...");
    (MappingSession::new(parsed.headers.clone(), &parsed.records, None), false)
}

/// Run the whole conversion on parsed input.
///
/// 1. Pick the starting configuration ([`start_session`])
/// 2. Apply overrides
/// 3. Validate the configuration against the headers
/// 4. Transform every row
/// 5. Remember the configuration (best effort)
pub fn convert(parsed: &ParsedCsv, options: &ConvertOptions) -> PipelineResult<Conversion> {
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parsed.delimiter)));
    log_success(format!("Read {} rows", parsed.records.len()));

    if parsed.records.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let csv_info = CsvInfo::from_parsed(parsed);

    log_info(format!("📋 CSV has {} columns:", parsed.headers.len()));
    for (i, col) in parsed.headers.iter().enumerate() {
        log_info_indent(format!("[{:2}] {}", i + 1, col), 1);
    }

    // Steps 1-2: configuration
    let (mut session, from_cache) = start_session(parsed, options);
    options.overrides.apply(&mut session);
    let config = session.into_config();
    print_mapping(&config);

    // Step 3: validate
    log_info("✔️  Validating configuration...");
    if let Err(errors) = validate_config(&config, &parsed.headers) {
        for err in &errors {
            log_error(err.to_string());
        }
        if let Some(first) = errors.into_iter().next() {
            return Err(first.into());
        }
    }

    // Step 4: transform
    log_info("⚙️  Converting rows...");
    let output = process_records(&parsed.records, &config);
    print_batch_result(&output);

    let (valid, invalid, errors) = validate_rows(&output.rows);
    if invalid > 0 {
        log_error(format!("{} rows do not match the YNAB format", invalid));
        for (i, errs) in errors.iter().take(3) {
            log_error(format!("Row {}: {}", i, errs.join(", ")));
        }
    } else {
        log_success(format!("All {} rows valid for YNAB import", valid));
    }

    // Step 5: remember
    let cache_key = if cache_enabled(options) && !options.no_save {
        let mut registry = ConfigRegistry::from_settings(&options.settings);
        match registry.save(&parsed.headers, &config) {
            Ok(key) => {
                log_success(format!("→ Saved configuration as: {}", key));
                Some(key)
            }
            Err(e) => {
                log_warning(format!("Could not save configuration: {}", e));
                None
            }
        }
    } else {
        None
    };

    Ok(Conversion {
        rows: output.rows,
        stats: output.stats,
        skipped: output.skipped,
        config,
        from_cache,
        cache_key,
        csv_info,
    })
}

fn cache_enabled(options: &ConvertOptions) -> bool {
    options.settings.cache_enabled
}

/// Cache key for a parsed file, whether or not anything is stored.
pub fn cache_key_for(parsed: &ParsedCsv) -> String {
    storage_key(&parsed.headers)
}

fn print_mapping(config: &MappingConfig) {
    log_info("🗺️  Column mapping:");
    for (field, column) in config.mapped_columns() {
        log_info_indent(format!("{} → {}", column, field), 1);
    }
    log_info_indent(
        format!(
            "date format: {}, decimal separator: '{}', negative is outflow: {}",
            config.date_format.as_str(),
            config.decimal_separator,
            config.is_negative_outflow
        ),
        1,
    );
}

fn print_batch_result(output: &BatchOutput) {
    let stats = &output.stats;
    log_success(format!("Generated {} YNAB rows", stats.valid_rows));

    if output.skipped.is_empty() {
        return;
    }
    log_warning(format!("{} rows skipped", stats.skipped_rows));

    for reason in [SkipReason::MissingDate, SkipReason::InvalidDate, SkipReason::EmptyAmount] {
        let rows: Vec<usize> = output
            .skipped
            .iter()
            .filter(|s| s.reason == reason)
            .map(|s| s.row)
            .collect();
        if rows.is_empty() {
            continue;
        }
        let sample: Vec<String> = rows.iter().take(5).map(|r| r.to_string()).collect();
        let more = if rows.len() > 5 { format!("... +{}", rows.len() - 5) } else { String::new() };
        log_warning(format!("• {} (rows: {}{})", reason.describe(), sample.join(", "), more));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(pairs: &[(&str, &str)]) -> SourceRecord {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn config() -> MappingConfig {
        MappingConfig {
            date_column: "Date".into(),
            payee_column: Some("Payee".into()),
            amount_column: Some("Amount".into()),
            ..MappingConfig::default()
        }
    }

    fn parsed(csv: &str) -> ParsedCsv {
        crate::parser::parse_str(csv, ',', "utf-8").unwrap()
    }

    fn options_in(dir: &Path) -> ConvertOptions {
        ConvertOptions {
            settings: Settings { cache_dir: dir.to_path_buf(), cache_enabled: true },
            ..ConvertOptions::default()
        }
    }

    #[test]
    fn test_process_all_stats_are_consistent() {
        let records = vec![
            record(&[("Date", "2024-01-01"), ("Amount", "-10.005")]),
            record(&[("Date", ""), ("Amount", "5")]),
            record(&[("Date", "2024-01-03"), ("Amount", "20.5")]),
            record(&[("Date", "2024-01-04"), ("Amount", "")]),
            record(&[("Date", "2024-01-05"), ("Amount", "-0.10")]),
        ];
        let (rows, stats) = process_all(&records, &config());

        assert_eq!(stats.total_rows, 5);
        assert_eq!(stats.valid_rows, 3);
        assert_eq!(stats.skipped_rows, 2);
        assert_eq!(stats.valid_rows + stats.skipped_rows, stats.total_rows);

        let outflow: f64 = rows.iter().map(|r| r.outflow_value()).sum();
        let inflow: f64 = rows.iter().map(|r| r.inflow_value()).sum();
        assert_eq!(stats.total_outflow, outflow);
        assert_eq!(stats.total_inflow, inflow);
        assert_eq!(stats.total_inflow, 20.5);

        for row in &rows {
            assert!(row.outflow.is_empty() || row.inflow.is_empty());
        }
    }

    #[test]
    fn test_order_is_preserved() {
        let records: Vec<SourceRecord> = ["2024-03-01", "2024-01-01", "2024-02-01"]
            .iter()
            .map(|d| record(&[("Date", d), ("Amount", "1")]))
            .collect();
        let (rows, _) = process_all(&records, &config());
        let dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-01-01", "2024-02-01"]);
    }

    #[test]
    fn test_empty_date_counts_as_skip() {
        let records = vec![record(&[("Date", ""), ("Amount", "-1")])];
        let output = process_records(&records, &config());
        assert!(output.rows.is_empty());
        assert_eq!(output.stats.skipped_rows, 1);
        assert_eq!(output.skipped, vec![SkippedRow { row: 0, reason: SkipReason::MissingDate }]);
    }

    #[test]
    fn test_process_all_is_deterministic() {
        let records = vec![
            record(&[("Date", "31/12/2023"), ("Amount", "-1,5"), ("Payee", "x")]),
            record(&[("Date", "2024-01-01"), ("Amount", "2")]),
        ];
        assert_eq!(process_all(&records, &config()), process_all(&records, &config()));
    }

    #[test]
    fn test_preview_is_capped() {
        let rows: Vec<CanonicalRow> = (0..80)
            .map(|_| CanonicalRow {
                date: "2024-01-01".into(),
                payee: String::new(),
                memo: String::new(),
                outflow: String::new(),
                inflow: String::new(),
            })
            .collect();
        assert_eq!(preview(&rows).len(), PREVIEW_ROWS);
        assert_eq!(preview(&rows[..3]).len(), 3);
    }

    #[test]
    fn test_convert_infers_and_caches() {
        let dir = tempdir().unwrap();
        let input = parsed("Date,Description,Amount\n2024-01-05,Coffee,-3.20\n2024-01-06,Salary,1000\n");
        let options = options_in(dir.path());

        let first = convert(&input, &options).unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.rows.len(), 2);
        assert_eq!(first.rows[0].payee, "Coffee");
        assert_eq!(first.rows[0].outflow, "3.20");
        assert_eq!(first.rows[1].inflow, "1000.00");
        assert_eq!(first.cache_key.as_deref(), Some(cache_key_for(&input).as_str()));

        let second = convert(&input, &options).unwrap();
        assert!(second.from_cache);
        assert_eq!(second.config, first.config);
    }

    #[test]
    fn test_convert_without_cache_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = parsed("Date,Amount\n2024-01-05,-3.20\n");
        let options = ConvertOptions {
            settings: Settings { cache_dir: dir.path().join("cache"), cache_enabled: false },
            ..ConvertOptions::default()
        };

        let conversion = convert(&input, &options).unwrap();
        assert_eq!(conversion.cache_key, None);
        assert!(!dir.path().join("cache").exists());
    }

    #[test]
    fn test_explicit_config_beats_cache() {
        let dir = tempdir().unwrap();
        let input = parsed("Date,Amount,Other\n2024-01-05,-3.20,7\n");
        let options = options_in(dir.path());
        convert(&input, &options).unwrap();

        let explicit = ConvertOptions {
            config: Some(MappingConfig {
                date_column: "Date".into(),
                amount_column: Some("Other".into()),
                ..MappingConfig::default()
            }),
            no_save: true,
            ..options_in(dir.path())
        };
        let conversion = convert(&input, &explicit).unwrap();
        assert!(!conversion.from_cache);
        assert_eq!(conversion.rows[0].inflow, "7.00");
    }

    #[test]
    fn test_overrides_switch_modes() {
        let dir = tempdir().unwrap();
        let input = parsed("Date,Text,Debit,Credit\n2024-01-05,Rent,\"500,00\",\n2024-01-06,Refund,,\"12,30\"\n");
        let options = ConvertOptions {
            overrides: MappingOverrides {
                payee_column: Some("Text".into()),
                outflow_column: Some("Debit".into()),
                inflow_column: Some("Credit".into()),
                ..MappingOverrides::default()
            },
            no_save: true,
            ..options_in(dir.path())
        };

        let conversion = convert(&input, &options).unwrap();
        assert_eq!(conversion.config.amount_mode, AmountMode::Separate);
        assert_eq!(conversion.config.decimal_separator, DecimalSeparator::Comma);
        assert_eq!(conversion.rows[0].outflow, "500.00");
        assert_eq!(conversion.rows[1].inflow, "12.30");
        assert_eq!(conversion.rows[1].payee, "Refund");
    }

    #[test]
    fn test_explicit_separator_override_wins() {
        let mut session = MappingSession::new(
            vec!["Date".into(), "Amount".into()],
            &[record(&[("Date", "2024-01-01"), ("Amount", "1,50")])],
            None,
        );
        let overrides = MappingOverrides {
            amount_column: Some("Amount".into()),
            decimal_separator: Some(DecimalSeparator::Dot),
            rules: vec![PayeeRule::new("amzn", "Amazon")],
            ..MappingOverrides::default()
        };
        overrides.apply(&mut session);
        assert_eq!(session.config().decimal_separator, DecimalSeparator::Dot);
        assert_eq!(session.config().payee_rules.len(), 1);
    }

    #[test]
    fn test_swap_runs_before_explicit_columns() {
        let headers = vec!["Date".to_string(), "Text".to_string(), "Reference".to_string()];
        let records = vec![record(&[("Date", "2024-01-01"), ("Text", "Shop"), ("Reference", "R1")])];
        let mut session = MappingSession::new(headers, &records, None);
        assert_eq!(session.config().memo_column.as_deref(), Some("Reference"));

        let overrides = MappingOverrides {
            payee_column: Some("Text".into()),
            swap_payee_memo: true,
            ..MappingOverrides::default()
        };
        overrides.apply(&mut session);
        assert_eq!(session.config().payee_column.as_deref(), Some("Text"));
        // The detected memo column moved to payee, then was replaced
        assert_eq!(session.config().memo_column, None);
    }

    #[test]
    fn test_stats_use_rounded_halves() {
        let records = vec![
            record(&[("Date", "2024-01-01"), ("Amount", "-1.125")]),
            record(&[("Date", "2024-01-02"), ("Amount", "0.125")]),
        ];
        let (rows, stats) = process_all(&records, &config());
        assert_eq!(rows[0].outflow, "1.13");
        assert_eq!(rows[1].inflow, "0.13");
        assert_eq!(stats.total_outflow, 1.13);
        assert_eq!(stats.total_inflow, 0.13);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempdir().unwrap();
        let input = parsed("Foo,Bar\n1,2\n");
        let result = convert(&input, &options_in(dir.path()));
        assert!(matches!(
            result,
            Err(PipelineError::Config(crate::error::ConfigError::MissingDateColumn))
        ));

        let typo = ConvertOptions {
            overrides: MappingOverrides {
                date_column: Some("Foo".into()),
                amount_column: Some("Baz".into()),
                ..MappingOverrides::default()
            },
            ..options_in(dir.path())
        };
        assert!(matches!(
            convert(&input, &typo),
            Err(PipelineError::Config(crate::error::ConfigError::UnknownColumn { .. }))
        ));
    }
}
