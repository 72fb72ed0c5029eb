//! Mapping configuration.
//!
//! A [`MappingConfig`] tells the pipeline which bank columns feed which YNAB
//! fields and how to read dates and amounts. It is created from defaults
//! inferred by [`crate::transform::mapping::resolve_mapping`], edited freely
//! by the user and cached per header set by [`crate::cache::ConfigRegistry`].
//! The transformation code only ever reads it.
//!
//! The JSON form uses camelCase keys:
//!
//! ```json
//! {
//!   "dateColumn": "Booking Date",
//!   "payeeColumn": "Description",
//!   "amountMode": "single",
//!   "amountColumn": "Amount",
//!   "dateFormat": "dd.MM.yyyy",
//!   "decimalSeparator": ",",
//!   "isNegativeOutflow": true,
//!   "skipEmptyAmount": true,
//!   "trimWhitespace": true,
//!   "payeeRules": [{ "match": "amzn", "replacement": "Amazon" }]
//! }
//! ```

pub mod settings;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

pub use settings::Settings;

// =============================================================================
// Enumerations
// =============================================================================

/// Where the transaction value comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountMode {
    /// One signed column.
    #[default]
    Single,
    /// Two unsigned columns, outflow and inflow.
    Separate,
}

/// Character marking the fractional part of an amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecimalSeparator {
    #[default]
    #[serde(rename = ".")]
    Dot,
    #[serde(rename = ",")]
    Comma,
}

impl DecimalSeparator {
    pub fn as_char(self) -> char {
        match self {
            DecimalSeparator::Dot => '.',
            DecimalSeparator::Comma => ',',
        }
    }
}

impl fmt::Display for DecimalSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for DecimalSeparator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "." | "dot" => Ok(DecimalSeparator::Dot),
            "," | "comma" => Ok(DecimalSeparator::Comma),
            other => Err(ConfigError::InvalidValue {
                field: "decimal separator".into(),
                message: format!("expected '.' or ',', got '{}'", other),
            }),
        }
    }
}

/// Date format hint: auto-detection or one explicit pattern such as `dd/MM/yyyy`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DateFormat {
    #[default]
    Auto,
    Pattern(String),
}

impl DateFormat {
    /// Formats offered to the user, with an example of each.
    pub const CHOICES: [(&'static str, &'static str); 6] = [
        ("auto", "Auto Detect"),
        ("yyyy-MM-dd", "YYYY-MM-DD (2023-12-31)"),
        ("dd/MM/yyyy", "DD/MM/YYYY (31/12/2023)"),
        ("MM/dd/yyyy", "MM/DD/YYYY (12/31/2023)"),
        ("dd.MM.yyyy", "DD.MM.YYYY (31.12.2023)"),
        ("yyyy/MM/dd", "YYYY/MM/DD (2023/12/31)"),
    ];

    pub fn as_str(&self) -> &str {
        match self {
            DateFormat::Auto => "auto",
            DateFormat::Pattern(p) => p,
        }
    }
}

impl From<String> for DateFormat {
    fn from(value: String) -> Self {
        if value == "auto" || value.is_empty() {
            DateFormat::Auto
        } else {
            DateFormat::Pattern(value)
        }
    }
}

impl From<&str> for DateFormat {
    fn from(value: &str) -> Self {
        DateFormat::from(value.to_string())
    }
}

impl From<DateFormat> for String {
    fn from(value: DateFormat) -> Self {
        value.as_str().to_string()
    }
}

// =============================================================================
// Payee rules
// =============================================================================

/// Replace the whole payee with `replacement` when it contains `match`
/// (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeeRule {
    #[serde(rename = "match")]
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

impl PayeeRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), replacement: replacement.into() }
    }
}

/// Command-line syntax: `MATCH=REPLACEMENT`.
impl FromStr for PayeeRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pattern, replacement) = s.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
            field: "payee rule".into(),
            message: format!("expected MATCH=REPLACEMENT, got '{}'", s),
        })?;
        if pattern.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "payee rule".into(),
                message: "match text must not be empty".into(),
            });
        }
        Ok(PayeeRule::new(pattern, replacement))
    }
}

// =============================================================================
// Mapping configuration
// =============================================================================

/// How to turn bank statement columns into YNAB rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfig {
    /// Column holding the transaction date. Empty means "not chosen".
    #[serde(default)]
    pub date_column: String,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub payee_column: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub memo_column: Option<String>,

    #[serde(default)]
    pub amount_mode: AmountMode,

    /// Signed amount column, used in [`AmountMode::Single`].
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub amount_column: Option<String>,

    /// Used in [`AmountMode::Separate`].
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub outflow_column: Option<String>,

    /// Used in [`AmountMode::Separate`].
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub inflow_column: Option<String>,

    #[serde(default)]
    pub date_format: DateFormat,

    #[serde(default)]
    pub decimal_separator: DecimalSeparator,

    /// `true`: negative amounts are outflows. `false`: positive amounts are outflows.
    #[serde(default = "default_true")]
    pub is_negative_outflow: bool,

    #[serde(default = "default_true")]
    pub skip_empty_amount: bool,

    #[serde(default = "default_true")]
    pub trim_whitespace: bool,

    #[serde(default)]
    pub auto_clean_payee: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payee_rules: Vec<PayeeRule>,
}

fn default_true() -> bool {
    true
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            date_column: String::new(),
            payee_column: None,
            memo_column: None,
            amount_mode: AmountMode::Single,
            amount_column: None,
            outflow_column: None,
            inflow_column: None,
            date_format: DateFormat::Auto,
            decimal_separator: DecimalSeparator::Dot,
            is_negative_outflow: true,
            skip_empty_amount: true,
            trim_whitespace: true,
            auto_clean_payee: false,
            payee_rules: Vec::new(),
        }
    }
}

impl MappingConfig {
    /// Parse a configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check that the configuration can drive a conversion.
    ///
    /// Callers must block processing when this fails.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.date_column.is_empty() {
            return Err(ConfigError::MissingDateColumn);
        }
        match self.amount_mode {
            AmountMode::Single if self.amount_column.is_none() => {
                Err(ConfigError::MissingAmountColumn)
            }
            AmountMode::Separate if self.outflow_column.is_none() && self.inflow_column.is_none() => {
                Err(ConfigError::MissingOutflowInflow)
            }
            _ => Ok(()),
        }
    }

    /// Pure validity predicate, see [`MappingConfig::validate`].
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Every mapped column paired with the field it feeds. Only the amount
    /// columns of the active mode are listed.
    pub fn mapped_columns(&self) -> Vec<(&'static str, &str)> {
        let mut columns = Vec::new();
        if !self.date_column.is_empty() {
            columns.push(("date", self.date_column.as_str()));
        }
        let optional = [
            ("payee", self.payee_column.as_deref()),
            ("memo", self.memo_column.as_deref()),
        ];
        let amounts = match self.amount_mode {
            AmountMode::Single => [("amount", self.amount_column.as_deref()), ("amount", None)],
            AmountMode::Separate => [
                ("outflow", self.outflow_column.as_deref()),
                ("inflow", self.inflow_column.as_deref()),
            ],
        };
        for (field, column) in optional.into_iter().chain(amounts) {
            if let Some(column) = column {
                columns.push((field, column));
            }
        }
        columns
    }

    /// Column feeding the decimal separator detection: the amount column,
    /// or in separate mode the outflow column falling back to inflow.
    pub fn amount_source_column(&self) -> Option<&str> {
        match self.amount_mode {
            AmountMode::Single => self.amount_column.as_deref(),
            AmountMode::Separate => self
                .outflow_column
                .as_deref()
                .or(self.inflow_column.as_deref()),
        }
    }

    /// Append a rule. A rule with empty match text is ignored.
    pub fn add_payee_rule(&mut self, rule: PayeeRule) {
        if rule.pattern.is_empty() {
            return;
        }
        self.payee_rules.push(rule);
    }

    /// Remove the rule at `index`; out-of-range indexes are ignored.
    pub fn remove_payee_rule(&mut self, index: usize) {
        if index < self.payee_rules.len() {
            self.payee_rules.remove(index);
        }
    }

    /// Exchange the payee and memo columns.
    pub fn swap_payee_memo(&mut self) {
        std::mem::swap(&mut self.payee_column, &mut self.memo_column);
    }
}
