//! Lexical diversity and vocabulary coverage.

use super::engine::MetricContext;
use crate::error::Result;
use crate::text::lexicon::Lexicon;
use crate::text::message::role_text;
use crate::text::mtld::mtld;
use crate::text::round_value;
use crate::text::tokens::{cleaned_tokens, word_tokens};
use crate::types::{Message, MetricValue, Role};

/// Below this many tokens MTLD is too unstable to report.
pub const MTLD_MIN_TOKENS: usize = 10;

pub fn lexical_diversity_mtld(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    let tokens = word_tokens(&role_text(messages, Role::Model, ctx.filter));
    if tokens.len() < MTLD_MIN_TOKENS {
        return Ok(MetricValue::Float(0.0));
    }
    Ok(round_value(mtld(&tokens), 2).into())
}

fn lexicon_pct(messages: &[Message], role: Role, lexicon: Lexicon, ctx: &MetricContext<'_>) -> MetricValue {
    let tokens = cleaned_tokens(&role_text(messages, role, ctx.filter));
    round_value(lexicon.coverage_pct(&tokens), 2).into()
}

pub fn technical_knowledge_student(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    Ok(lexicon_pct(messages, Role::User, Lexicon::Technical, ctx))
}

pub fn technical_knowledge_ai(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    Ok(lexicon_pct(messages, Role::Model, Lexicon::Technical, ctx))
}

pub fn specificity_depth_student(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    Ok(lexicon_pct(messages, Role::User, Lexicon::Specific, ctx))
}

pub fn specificity_depth_ai(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    Ok(lexicon_pct(messages, Role::Model, Lexicon::Specific, ctx))
}
