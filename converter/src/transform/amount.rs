//! Amount parsing and decimal separator detection.
//!
//! Bank exports write amounts as `-1,234.56`, `1.234,56 €`, `$ 12.00` and so
//! on. [`detect_decimal_separator`] guesses the locale from a sample of a
//! column; [`normalize_amount`] turns one cell into a signed number.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::DecimalSeparator;

/// Ends in comma + 1-2 digits, e.g. `1.234,5` or `-12,50`.
static COMMA_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9\s.]*,[0-9]{1,2}$").expect("valid comma-decimal regex"));

/// Ends in dot + 1-2 digits, e.g. `1,234.5` or `-12.50`.
static DOT_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9\s,]*\.[0-9]{1,2}$").expect("valid dot-decimal regex"));

/// Longest leading decimal literal, the way a lenient float reader sees it.
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)").expect("valid number regex")
});

/// Guess the decimal separator from raw amount cells.
///
/// Cells shaped like a comma-decimal or dot-decimal number are counted and
/// the strictly larger count wins. On a tie (usually 0 vs 0) a comma is
/// chosen only when some cell contains a comma and none contains a dot;
/// otherwise the answer is a dot. Empty cells are ignored.
pub fn detect_decimal_separator<I, S>(values: I) -> DecimalSeparator
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut comma_matches = 0usize;
    let mut dot_matches = 0usize;
    let mut has_comma = false;
    let mut has_dot = false;

    for value in values {
        let value = value.as_ref();
        if value.is_empty() {
            continue;
        }
        if COMMA_DECIMAL.is_match(value) {
            comma_matches += 1;
        }
        if DOT_DECIMAL.is_match(value) {
            dot_matches += 1;
        }
        has_comma |= value.contains(',');
        has_dot |= value.contains('.');
    }

    if comma_matches > dot_matches {
        return DecimalSeparator::Comma;
    }
    if dot_matches > comma_matches {
        return DecimalSeparator::Dot;
    }

    if has_comma && !has_dot {
        DecimalSeparator::Comma
    } else {
        DecimalSeparator::Dot
    }
}

/// Convert a raw amount cell into a signed number.
///
/// Everything except digits, `.`, `,` and `-` is dropped (currency symbols,
/// spaces). The grouping character for the chosen locale is removed and the
/// decimal comma, if any, becomes a dot. Empty or unreadable input yields
/// `0.0`, so a malformed amount looks exactly like a real zero.
pub fn normalize_amount(raw: &str, separator: DecimalSeparator) -> f64 {
    if raw.is_empty() {
        return 0.0;
    }

    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let clean = match separator {
        // 1.000,00 -> 1000.00
        DecimalSeparator::Comma => clean.replace('.', "").replacen(',', ".", 1),
        // 1,000.00 -> 1000.00
        DecimalSeparator::Dot => clean.replace(',', ""),
    };

    LEADING_NUMBER
        .find(&clean)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Render an amount for the YNAB file: two decimals when positive, empty otherwise.
///
/// Exact halves round up (`1.125` -> `1.13`); everything else rounds to the
/// nearest cent of the stored binary value (`10.005` -> `10.00`).
pub fn format_amount(value: f64) -> String {
    if value <= 0.0 {
        return String::new();
    }

    // A cent tie is only representable on a multiple of 1/8
    if (value * 8.0).fract() == 0.0 {
        format!("{:.2}", (value * 100.0).round() / 100.0)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_comma_locale() {
        let sample = ["-12,50", "1.234,56", "3,1", ""];
        assert_eq!(detect_decimal_separator(sample), DecimalSeparator::Comma);
    }

    #[test]
    fn test_detect_dot_locale() {
        let sample = ["-12.50", "1,234.56", "7.00"];
        assert_eq!(detect_decimal_separator(sample), DecimalSeparator::Dot);
    }

    #[test]
    fn test_detect_majority_wins() {
        let sample = ["1,50", "2,75", "3.10"];
        assert_eq!(detect_decimal_separator(sample), DecimalSeparator::Comma);
    }

    #[test]
    fn test_detect_tie_falls_back_to_presence() {
        // No cell has a 1-2 digit fraction; commas only -> comma
        let sample = ["1,000", "25,000"];
        assert_eq!(detect_decimal_separator(sample), DecimalSeparator::Comma);

        // Both characters present -> dot
        let sample = ["1,000", "2.000"];
        assert_eq!(detect_decimal_separator(sample), DecimalSeparator::Dot);

        // Equal pattern counts -> presence check, both present -> dot
        let sample = ["1,50", "1.50"];
        assert_eq!(detect_decimal_separator(sample), DecimalSeparator::Dot);
    }

    #[test]
    fn test_detect_defaults_to_dot() {
        let empty: [&str; 0] = [];
        assert_eq!(detect_decimal_separator(empty), DecimalSeparator::Dot);
        assert_eq!(detect_decimal_separator(["", ""]), DecimalSeparator::Dot);
        assert_eq!(detect_decimal_separator(["100", "42"]), DecimalSeparator::Dot);
    }

    #[test]
    fn test_detect_is_deterministic() {
        let sample = vec!["1,5".to_string(), "2.25".to_string(), "-3,00".to_string()];
        let first = detect_decimal_separator(&sample);
        let second = detect_decimal_separator(&sample);
        assert_eq!(first, second);
    }

    #[test]
    fn test_detect_ignores_currency_decorated_values() {
        // Currency symbols break the strict shape, presence decides
        let sample = ["€ 12,50", "€ 3,00"];
        assert_eq!(detect_decimal_separator(sample), DecimalSeparator::Comma);
    }

    #[test]
    fn test_normalize_dot_locale() {
        assert_eq!(normalize_amount("1,234.56", DecimalSeparator::Dot), 1234.56);
        assert_eq!(normalize_amount("$ -42.50", DecimalSeparator::Dot), -42.5);
        assert_eq!(normalize_amount("0", DecimalSeparator::Dot), 0.0);
    }

    #[test]
    fn test_normalize_comma_locale() {
        assert_eq!(normalize_amount("-12,50", DecimalSeparator::Comma), -12.5);
        assert_eq!(normalize_amount("1.234,56 €", DecimalSeparator::Comma), 1234.56);
        assert_eq!(normalize_amount("1 000,00", DecimalSeparator::Comma), 1000.0);
    }

    #[test]
    fn test_normalize_unreadable_is_zero() {
        assert_eq!(normalize_amount("", DecimalSeparator::Dot), 0.0);
        assert_eq!(normalize_amount("n/a", DecimalSeparator::Dot), 0.0);
        assert_eq!(normalize_amount("-", DecimalSeparator::Comma), 0.0);
    }

    #[test]
    fn test_normalize_reads_leading_number() {
        // Trailing minus is ignored, as a lenient float reader would
        assert_eq!(normalize_amount("100.00-", DecimalSeparator::Dot), 100.0);
        // Only the first comma becomes the decimal point
        assert_eq!(normalize_amount("1,2,3", DecimalSeparator::Comma), 1.2);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(12.5), "12.50");
        assert_eq!(format_amount(0.0), "");
        assert_eq!(format_amount(-3.0), "");
    }

    #[test]
    fn test_format_amount_rounds_halves_up() {
        assert_eq!(format_amount(0.125), "0.13");
        assert_eq!(format_amount(1.125), "1.13");
        assert_eq!(format_amount(10.625), "10.63");
        assert_eq!(format_amount(2.375), "2.38");
        // Not a tie in binary: stays below the half
        assert_eq!(format_amount(10.005), "10.00");
        assert_eq!(format_amount(1.005), "1.00");
    }
}
