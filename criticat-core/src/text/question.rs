//! Catalan question detection.
//!
//! A cheap lexical heuristic, not a parser. A literal `?` anywhere wins;
//! otherwise each rough sentence is checked for an interrogative opening.

use super::message::get_message_text;
use crate::types::Message;
use regex::Regex;
use std::sync::LazyLock;

/// Interrogative words that open a question.
const INTERROGATIVE_TOKENS_CA: &[&str] = &[
    "què", "que", "qui", "on", "quan", "com", "quant", "quants", "quantes", "quin", "quina",
    "quins", "quines",
];

/// Two-word interrogative openings.
const INTERROGATIVE_MULTIWORD_CA: &[&str] = &["per què", "perque", "per què no", "què et", "què en"];

/// Question-intent phrases, mostly second person.
const QUESTION_PHRASES_CA: &[&str] = &[
    "pots",
    "podries",
    "podem",
    "vols",
    "voldries",
    "t'agradaria",
    "et sembla",
    "què et sembla",
    "em pots",
    "em podries",
    "em sabries dir",
    "creus que",
    "penses que",
    "diries que",
];

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!;:\n]+").expect("valid sentence break pattern"));

/// Heuristic detector for Catalan questions.
pub fn is_question_like_ca(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return false;
    }

    if lowered.contains('?') {
        return true;
    }

    SENTENCE_BREAK
        .split(&lowered)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .any(opens_like_question)
}

fn opens_like_question(sentence: &str) -> bool {
    let tokens: Vec<&str> = sentence.split_whitespace().collect();
    let Some(first) = tokens.first() else {
        return false;
    };

    if INTERROGATIVE_TOKENS_CA.contains(first) {
        return true;
    }

    let first_two = tokens[..tokens.len().min(2)].join(" ");
    if INTERROGATIVE_MULTIWORD_CA.contains(&first_two.as_str()) {
        return true;
    }

    let prefix = tokens[..tokens.len().min(4)].join(" ");
    QUESTION_PHRASES_CA.iter().any(|pat| {
        prefix.starts_with(&format!("{pat} ")) || prefix.starts_with(&format!("que {pat} "))
    })
}

/// Whether a message's text reads as a Catalan question.
pub fn is_question_message_ca(msg: &Message) -> bool {
    is_question_like_ca(&get_message_text(msg))
}
