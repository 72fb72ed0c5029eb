//! Payee cleanup.
//!
//! Two independent passes: built-in noise removal (auto-clean) and the user's
//! find/replace rules, applied in that order.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::PayeeRule;

/// Phrases card processors prepend to merchant names.
pub const NOISE_PHRASES: [&str; 5] = [
    "purchase authorization",
    "pos purchase",
    "card purchase",
    "not available",
    "recurring payment",
];

/// One case-insensitive pattern per phrase, in [`NOISE_PHRASES`] order.
static NOISE: Lazy<Vec<Regex>> = Lazy::new(|| {
    NOISE_PHRASES
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", regex::escape(p))).expect("valid noise regex"))
        .collect()
});

/// A leading date-like token such as `12/24 `.
static LEADING_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2,}/[0-9]{2,}\s+").expect("valid leading date regex"));

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Clean a payee: optional noise stripping, then the first matching rule.
pub fn sanitize_payee(payee: &str, auto_clean: bool, rules: &[PayeeRule]) -> String {
    let cleaned = if auto_clean {
        strip_noise(payee)
    } else {
        payee.to_string()
    };
    apply_rules(cleaned, rules)
}

/// Remove noise phrases (any case) and a leading date token, collapse
/// whitespace and trim.
///
/// Phrases are removed one after the other, so an earlier phrase wins
/// when two overlap.
pub fn strip_noise(payee: &str) -> String {
    let without_phrases = NOISE
        .iter()
        .fold(payee.to_string(), |text, phrase| phrase.replace_all(&text, "").into_owned());
    let without_date = LEADING_DATE.replace(&without_phrases, "");
    WHITESPACE_RUN
        .replace_all(&without_date, " ")
        .trim()
        .to_string()
}

/// Replace the whole payee with the replacement of the first rule whose
/// match text it contains (case-insensitive). Later rules are not consulted.
pub fn apply_rules(payee: String, rules: &[PayeeRule]) -> String {
    if rules.is_empty() {
        return payee;
    }

    let lower = payee.to_lowercase();
    rules
        .iter()
        .find(|rule| !rule.pattern.is_empty() && lower.contains(&rule.pattern.to_lowercase()))
        .map(|rule| rule.replacement.clone())
        .unwrap_or(payee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_clean_pos_purchase() {
        assert_eq!(
            sanitize_payee("POS Purchase  STARBUCKS #123", true, &[]),
            "STARBUCKS #123"
        );
    }

    #[test]
    fn test_auto_clean_all_phrases() {
        assert_eq!(strip_noise("Purchase Authorization NETFLIX.COM"), "NETFLIX.COM");
        assert_eq!(strip_noise("CARD PURCHASE   Shell   Station"), "Shell Station");
        assert_eq!(strip_noise("Spotify recurring payment"), "Spotify");
        assert_eq!(strip_noise("Not Available"), "");
    }

    #[test]
    fn test_auto_clean_removes_phrases_in_order() {
        // "purchase authorization" goes first and leaves "POS" behind
        assert_eq!(strip_noise("POS Purchase Authorization NETFLIX"), "POS NETFLIX");
        // Removing one phrase can expose the next one
        assert_eq!(strip_noise("cardpos purchase purchase SHOP"), "SHOP");
    }

    #[test]
    fn test_auto_clean_leading_date() {
        assert_eq!(strip_noise("12/24 AMAZON MKTP"), "AMAZON MKTP");
        // Date must be at the very start
        assert_eq!(strip_noise("AMAZON 12/24 MKTP"), "AMAZON 12/24 MKTP");
    }

    #[test]
    fn test_no_auto_clean_keeps_text() {
        assert_eq!(
            sanitize_payee("POS Purchase  STARBUCKS", false, &[]),
            "POS Purchase  STARBUCKS"
        );
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![PayeeRule::new("a", "X"), PayeeRule::new("a", "Y")];
        assert_eq!(sanitize_payee("bar", false, &rules), "X");
    }

    #[test]
    fn test_rules_are_case_insensitive_and_replace_whole_payee() {
        let rules = vec![
            PayeeRule::new("zzz", "Never"),
            PayeeRule::new("AMZN", "Amazon"),
        ];
        assert_eq!(sanitize_payee("amzn mktp us*2k3", false, &rules), "Amazon");
        assert_eq!(sanitize_payee("Local Bakery", false, &rules), "Local Bakery");
    }

    #[test]
    fn test_rules_run_after_auto_clean() {
        let rules = vec![PayeeRule::new("starbucks #123", "Starbucks")];
        assert_eq!(
            sanitize_payee("POS Purchase  STARBUCKS   #123", true, &rules),
            "Starbucks"
        );
    }

    #[test]
    fn test_empty_match_never_applies() {
        let rules = vec![PayeeRule::new("", "Everything")];
        assert_eq!(sanitize_payee("Rent", false, &rules), "Rent");
    }
}
