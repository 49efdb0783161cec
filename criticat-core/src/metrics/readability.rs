//! Flesch-Szigriszt readability (IFSZ) adapted to Catalan syllabification.
//!
//! `IFSZ = 206.835 - 62.3 * (syllables / words) - (words / sentences)`.
//! Higher is easier to read.

use super::engine::MetricContext;
use crate::error::Result;
use crate::text::message::role_text;
use crate::text::{count_syllables_ca, round_value, Segmenter};
use crate::types::{Message, MetricValue, Role};

/// Raw IFSZ score of `text`; 0.0 when it has no words or sentences.
pub fn ifsz(text: &str, segmenter: &dyn Segmenter) -> f64 {
    let sentences = segmenter.sentences(text);
    let mut words = 0usize;
    let mut syllables = 0usize;

    for sentence in &sentences {
        for word in segmenter.words(sentence) {
            words += 1;
            syllables += count_syllables_ca(&word);
        }
    }

    if words == 0 || sentences.is_empty() {
        return 0.0;
    }

    let syllables_per_word = syllables as f64 / words as f64;
    let words_per_sentence = words as f64 / sentences.len() as f64;
    206.835 - 62.3 * syllables_per_word - words_per_sentence
}

fn readability_for_role(messages: &[Message], role: Role, ctx: &MetricContext<'_>) -> MetricValue {
    let text = role_text(messages, role, ctx.filter);
    round_value(ifsz(&text, ctx.services.segmenter()), 2).into()
}

pub fn readability_ifsz_student(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    Ok(readability_for_role(messages, Role::User, ctx))
}

pub fn readability_ifsz_ai(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    Ok(readability_for_role(messages, Role::Model, ctx))
}
