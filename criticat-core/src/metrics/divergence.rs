//! Prompt/reply semantic divergence.

use super::engine::MetricContext;
use crate::error::Result;
use crate::text::message::get_message_text;
use crate::text::{cosine_distance, round_value};
use crate::types::{Message, MetricValue, Role};

/// One student prompt and the AI reply that immediately follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnPair {
    pub user: String,
    pub model: String,
}

/// Adjacent (user, model) pairs over the raw message index.
///
/// Positions `i` and `i + 1` form a pair when both messages are in scope,
/// the first has role `user` and the second role `model`, and both have
/// non-empty trimmed text. Out-of-scope messages are not skipped over: a
/// hidden message between a prompt and its reply breaks the pair.
pub fn extract_pairs(messages: &[Message], ctx: &MetricContext<'_>) -> Vec<TurnPair> {
    messages
        .windows(2)
        .filter_map(|window| {
            let (a, b) = (&window[0], &window[1]);
            if !ctx.in_scope(a) || !ctx.in_scope(b) {
                return None;
            }
            if a.role() != Some(Role::User) || b.role() != Some(Role::Model) {
                return None;
            }
            let user = get_message_text(a).trim().to_string();
            let model = get_message_text(b).trim().to_string();
            (!user.is_empty() && !model.is_empty()).then_some(TurnPair { user, model })
        })
        .collect()
}

/// Mean cosine distance between paired prompt and reply embeddings.
///
/// 0.0 when the conversation has no pairs; the embedder is only touched
/// when there is something to embed.
pub fn semantic_divergence(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    let pairs = extract_pairs(messages, ctx);
    if pairs.is_empty() {
        return Ok(MetricValue::Float(0.0));
    }

    let embedder = ctx.services.embedder()?;
    let users: Vec<&str> = pairs.iter().map(|p| p.user.as_str()).collect();
    let models: Vec<&str> = pairs.iter().map(|p| p.model.as_str()).collect();
    let user_vecs = embedder.embed_batch(&users)?;
    let model_vecs = embedder.embed_batch(&models)?;

    let total: f64 = user_vecs
        .iter()
        .zip(&model_vecs)
        .map(|(u, m)| cosine_distance(u, m))
        .sum();
    let mean = total / pairs.len() as f64;

    Ok(round_value(mean, 4).into())
}
