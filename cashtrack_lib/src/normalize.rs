//! Cashback text normalization.
//!
//! Turns display text like `Up to 5% Cash Back` into a bare rate string and
//! a ceiling flag. The stored rate never carries the "up to" wording; that
//! lives only in [`NormalizedRate::is_up_to`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static CASH_BACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcash\s*back\b").expect("valid cash back pattern"));

// "up to" as whole words; a digit may follow directly ("Up to4%"), in which
// case it is captured so the replacement can put it back.
static UP_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bup\s+to(\b|[0-9])").expect("valid up to pattern"));

/// A cashback rate with its display decoration removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRate {
    /// Bare rate, e.g. `5` or `2.5`. Not validated as numeric.
    pub rate: String,
    /// The site advertised this rate as a maximum ("up to").
    pub is_up_to: bool,
}

/// Normalizes raw cashback text. Never fails: text that does not look like
/// a rate passes through with only the known phrases removed.
pub fn normalize(raw: &str) -> NormalizedRate {
    let text = collapse_whitespace(raw);
    let text = CASH_BACK.replace_all(&text, "");
    let is_up_to = UP_TO.is_match(&text);
    let text = UP_TO.replace_all(&text, "${1}");
    let rate = collapse_whitespace(&text.replace('%', ""));
    NormalizedRate { rate, is_up_to }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(raw: &str) -> (String, bool) {
        let n = normalize(raw);
        (n.rate, n.is_up_to)
    }

    #[test]
    fn up_to_percentage() {
        assert_eq!(rate("Up to 5%"), ("5".to_string(), true));
    }

    #[test]
    fn flat_rate_with_cash_back_suffix() {
        assert_eq!(rate("2.5% Cash Back"), ("2.5".to_string(), false));
    }

    #[test]
    fn empty_input_passes_through() {
        assert_eq!(rate(""), (String::new(), false));
    }

    #[test]
    fn up_to_with_suffix() {
        assert_eq!(rate("Up to 10% Cash Back"), ("10".to_string(), true));
    }

    #[test]
    fn qualifier_case_insensitive() {
        assert_eq!(rate("UP TO 7%"), ("7".to_string(), true));
        assert_eq!(rate("up to 7%"), ("7".to_string(), true));
    }

    #[test]
    fn qualifier_glued_to_number() {
        assert_eq!(rate("Up to4%"), ("4".to_string(), true));
    }

    #[test]
    fn embedded_qualifier() {
        assert_eq!(rate("Now up to 12%"), ("Now 12".to_string(), true));
    }

    #[test]
    fn single_word_cashback() {
        assert_eq!(rate("3% cashback"), ("3".to_string(), false));
    }

    #[test]
    fn extra_whitespace_collapsed() {
        assert_eq!(rate("  Up   to \n 6 %  Cash   Back "), ("6".to_string(), true));
    }

    #[test]
    fn dollar_amount_kept_as_text() {
        assert_eq!(rate("$25 Cash Back"), ("$25".to_string(), false));
    }

    #[test]
    fn malformed_text_passes_through() {
        assert_eq!(rate("Check site for details"), ("Check site for details".to_string(), false));
    }

    #[test]
    fn non_ascii_text_survives() {
        assert_eq!(rate("Jusqu'à 5 %"), ("Jusqu'à 5".to_string(), false));
    }

    #[test]
    fn up_to_inside_words_is_not_a_qualifier() {
        assert_eq!(rate("Backup tools 5%"), ("Backup tools 5".to_string(), false));
        assert_eq!(rate("Setup to go 3%"), ("Setup to go 3".to_string(), false));
        assert!(!normalize("Pickup Today 2%").is_up_to);
    }

    #[test]
    fn cashback_inside_words_is_kept() {
        assert_eq!(rate("Cashbacks 4%"), ("Cashbacks 4".to_string(), false));
    }
}
