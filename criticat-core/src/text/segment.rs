//! Sentence and word segmentation.
//!
//! The [`Segmenter`] trait is the seam for the readability metrics. The
//! built-in [`CatalanSegmenter`] is rule based: a sentence ends at a run of
//! terminal punctuation followed by whitespace (or end of text), or at a
//! line break, so decimals and URLs stay inside their sentence.

use super::tokens::word_tokens;
use regex::Regex;
use std::sync::LazyLock;

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[.!?…]+(?:\s+|$)|\n+").expect("valid sentence boundary pattern")
});

/// Splits text into sentences and sentences into words.
pub trait Segmenter: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Sentences containing at least one word, in order.
    fn sentences(&self, text: &str) -> Vec<String>;

    /// Alphabetic words of a sentence, lowercased.
    fn words(&self, sentence: &str) -> Vec<String>;
}

/// Rule-based segmenter for Catalan prose.
#[derive(Debug, Default, Clone, Copy)]
pub struct CatalanSegmenter;

impl CatalanSegmenter {
    pub fn new() -> Self {
        Self
    }
}

impl Segmenter for CatalanSegmenter {
    fn name(&self) -> &str {
        "rules.ca"
    }

    fn sentences(&self, text: &str) -> Vec<String> {
        SENTENCE_END
            .split(text)
            .map(str::trim)
            .filter(|s| !self.words(s).is_empty())
            .map(str::to_string)
            .collect()
    }

    fn words(&self, sentence: &str) -> Vec<String> {
        word_tokens(sentence)
            .into_iter()
            .filter(|w| w.chars().any(char::is_alphabetic))
            .collect()
    }
}
