//! Token and syllable counting.
//!
//! `count_tokens` is a whitespace split, not a real tokenizer. Keep it that
//! way: reported averages are compared against earlier runs.

use regex::Regex;
use std::sync::LazyLock;

static VOWEL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[aeiouàèéíòóúüï]+").expect("valid vowel pattern"));

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['’·\-][\p{L}\p{N}]+)*").expect("valid word pattern")
});

/// Unicode whitespace plus the ASCII file/group/record/unit separators,
/// which the transcript exporter's own splitting also treats as breaks.
fn is_token_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Non-empty segments between separators.
fn split_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(is_token_separator).filter(|s| !s.is_empty())
}

/// Number of whitespace-delimited segments.
pub fn count_tokens(text: &str) -> usize {
    split_tokens(text).count()
}

/// Number of maximal vowel runs in the lowercased word.
pub fn count_syllables_ca(word: &str) -> usize {
    VOWEL_RUN.find_iter(&word.to_lowercase()).count()
}

/// Lowercased word tokens: letters and digits, keeping inner apostrophes,
/// the Catalan middle dot and hyphens (`l'home`, `il·lustració`).
pub fn word_tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Whitespace tokens, lowercased, with surrounding punctuation stripped.
pub fn cleaned_tokens(text: &str) -> Vec<String> {
    split_tokens(text)
        .map(|raw| {
            raw.to_lowercase()
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_string()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// Round to `decimals` places using exact decimal rounding.
///
/// NaN and infinities come back unchanged.
pub fn round_value(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", decimals, value)
        .parse()
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_tokens() {
        assert_eq!(count_tokens(""), 0);
        assert_eq!(count_tokens("a b  c"), 3);
        assert_eq!(count_tokens("  hola\tmón\n"), 2);
        assert_eq!(count_tokens("hola\u{1f}món\u{1c}adéu"), 3);
        assert_eq!(count_tokens("\u{1e}\u{1d}"), 0);
    }

    #[test]
    fn test_count_syllables_ca() {
        assert_eq!(count_syllables_ca("casa"), 2);
        assert_eq!(count_syllables_ca("disseny"), 2);
        assert_eq!(count_syllables_ca("Il·lustració"), 4);
        assert_eq!(count_syllables_ca("veïna"), 2);
        assert_eq!(count_syllables_ca("pçs"), 0);
    }

    #[test]
    fn test_word_tokens_keep_catalan_forms() {
        assert_eq!(
            word_tokens("L'home fa una Il·lustració, oi?"),
            vec!["l'home", "fa", "una", "il·lustració", "oi"]
        );
        assert!(word_tokens("... !!").is_empty());
    }

    #[test]
    fn test_cleaned_tokens() {
        assert_eq!(
            cleaned_tokens("El Color, (tipografia) sans-serif!"),
            vec!["el", "color", "tipografia", "sans-serif"]
        );
        assert!(cleaned_tokens(" -- ").is_empty());
    }

    #[test]
    fn test_round_value() {
        assert_eq!(round_value(1.234_56, 2), 1.23);
        assert_eq!(round_value(0.123_456, 4), 0.1235);
        assert_eq!(round_value(3.0, 2), 3.0);
        assert!(round_value(f64::NAN, 2).is_nan());
        assert_eq!(round_value(f64::INFINITY, 2), f64::INFINITY);
    }
}
