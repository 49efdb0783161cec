//! Semantic displacement tables.
//!
//! For each conversation the adjacent (student, AI) pairs are embedded and
//! their cosine distances summarised: mean, median, 90th percentile and the
//! share of pairs at or below each alignment threshold. Conversations are
//! then aggregated per practice. The mean user and model embeddings
//! (centroids) are kept, with the distance between them.
//!
//! Pair extraction is the same as for `semantic_divergence`; the numbers
//! here are a separate report and are not expected to match that metric's
//! rounding.

use crate::corpus::{Corpus, SkippedConversation};
use crate::error::Result;
use crate::metrics::{extract_pairs, MetricContext};
use crate::output::{to_csv_bytes, write_file};
use crate::text::embedding::centroid;
use crate::text::{cosine_distance, round_value};
use crate::types::{format_float, Conversation, ConversationIds};
use std::collections::BTreeMap;
use std::path::Path;

/// Distance at or above which a reply counts as drifting away.
pub const HIGH_DIVERGENCE: f64 = 0.60;

pub const CONVERSATION_FILE: &str = "summary_by_conversation.csv";
pub const PRACTICE_FILE: &str = "summary_by_practice.csv";

/// Column suffix for a threshold: `0.25`.
pub fn threshold_label(threshold: f64) -> String {
    format!("{:.2}", threshold)
}

/// Linear-interpolation percentile of sorted values, `p` in 0..=100.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (p / 100.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile(&sorted, 50.0)
}

// ============================================
// Per conversation
// ============================================

/// Distribution of pair distances.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceSummary {
    pub n_pairs: usize,
    pub mean: f64,
    pub median: f64,
    pub p90: f64,
    /// `(threshold, % of pairs with distance <= threshold)`
    pub pct_le: Vec<(f64, f64)>,
    /// % of pairs with distance >= [`HIGH_DIVERGENCE`]
    pub pct_ge_high: f64,
}

/// Summarise raw distances; all statistics are NaN for no distances.
pub fn summarize_distances(distances: &[f64], thresholds: &[f64]) -> DistanceSummary {
    let n = distances.len();
    let share = |pred: &dyn Fn(f64) -> bool| {
        if n == 0 {
            f64::NAN
        } else {
            100.0 * distances.iter().filter(|d| pred(**d)).count() as f64 / n as f64
        }
    };

    let mut sorted = distances.to_vec();
    sorted.sort_by(f64::total_cmp);

    DistanceSummary {
        n_pairs: n,
        mean: mean(distances),
        median: percentile(&sorted, 50.0),
        p90: percentile(&sorted, 90.0),
        pct_le: thresholds
            .iter()
            .map(|&t| (t, share(&|d| d <= t)))
            .collect(),
        pct_ge_high: share(&|d| d >= HIGH_DIVERGENCE),
    }
}

/// Displacement summary of one conversation.
#[derive(Debug, Clone)]
pub struct ConversationDivergence {
    pub ids: ConversationIds,
    pub summary: DistanceSummary,
    pub centroid_user: Vec<f32>,
    pub centroid_model: Vec<f32>,
    /// Cosine distance between the two centroids
    pub centroid_distance: f64,
}

/// Embed and summarise one conversation; `None` when it has no pairs.
pub fn conversation_divergence(
    conversation: &Conversation,
    thresholds: &[f64],
    ctx: &MetricContext<'_>,
) -> Result<Option<ConversationDivergence>> {
    let pairs = extract_pairs(&conversation.messages, ctx);
    if pairs.is_empty() {
        return Ok(None);
    }

    let embedder = ctx.services.embedder()?;
    let users: Vec<&str> = pairs.iter().map(|p| p.user.as_str()).collect();
    let models: Vec<&str> = pairs.iter().map(|p| p.model.as_str()).collect();
    let user_vecs = embedder.embed_batch(&users)?;
    let model_vecs = embedder.embed_batch(&models)?;

    let distances: Vec<f64> = user_vecs
        .iter()
        .zip(&model_vecs)
        .map(|(u, m)| cosine_distance(u, m))
        .collect();

    let centroid_user = centroid(&user_vecs);
    let centroid_model = centroid(&model_vecs);
    let centroid_distance = cosine_distance(&centroid_user, &centroid_model);

    Ok(Some(ConversationDivergence {
        ids: conversation.ids.clone(),
        summary: summarize_distances(&distances, thresholds),
        centroid_user,
        centroid_model,
        centroid_distance,
    }))
}

impl ConversationDivergence {
    /// The summary as written to the table: distances to 6 decimals,
    /// percentages to 2.
    pub fn rounded(&self) -> DistanceSummary {
        let s = &self.summary;
        DistanceSummary {
            n_pairs: s.n_pairs,
            mean: round_value(s.mean, 6),
            median: round_value(s.median, 6),
            p90: round_value(s.p90, 6),
            pct_le: s.pct_le.iter().map(|(t, v)| (*t, round_value(*v, 2))).collect(),
            pct_ge_high: round_value(s.pct_ge_high, 2),
        }
    }
}

// ============================================
// Per practice
// ============================================

/// Conversation summaries aggregated over one practice.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeDivergence {
    pub practice_id: String,
    pub conversations: usize,
    pub pairs_total: usize,
    /// Mean of conversation means
    pub mean_div: f64,
    /// Median of conversation medians
    pub median_div: f64,
    /// Median of conversation 90th percentiles
    pub p90_div: f64,
    /// Mean over conversations of each `pct_le` share
    pub pct_le_avg: Vec<(f64, f64)>,
    pub pct_ge_high_avg: f64,
}

/// Aggregate conversation rows (as rounded for the table) per practice,
/// sorted by practice id.
pub fn aggregate_practices(conversations: &[ConversationDivergence]) -> Vec<PracticeDivergence> {
    let mut by_practice: BTreeMap<&str, Vec<DistanceSummary>> = BTreeMap::new();
    for conv in conversations {
        by_practice
            .entry(conv.ids.practice_id.as_str())
            .or_default()
            .push(conv.rounded());
    }

    by_practice
        .into_iter()
        .map(|(practice_id, rows)| {
            let column = |f: &dyn Fn(&DistanceSummary) -> f64| rows.iter().map(f).collect::<Vec<f64>>();
            let thresholds: Vec<f64> = rows
                .first()
                .map(|r| r.pct_le.iter().map(|(t, _)| *t).collect())
                .unwrap_or_default();

            PracticeDivergence {
                practice_id: practice_id.to_string(),
                conversations: rows.len(),
                pairs_total: rows.iter().map(|r| r.n_pairs).sum(),
                mean_div: round_value(mean(&column(&|r| r.mean)), 6),
                median_div: round_value(median(&column(&|r| r.median)), 6),
                p90_div: round_value(median(&column(&|r| r.p90)), 6),
                pct_le_avg: thresholds
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (*t, round_value(mean(&column(&|r| r.pct_le[i].1)), 2)))
                    .collect(),
                pct_ge_high_avg: round_value(mean(&column(&|r| r.pct_ge_high)), 2),
            }
        })
        .collect()
}

// ============================================
// Corpus report
// ============================================

#[derive(Debug, Default)]
pub struct DivergenceReport {
    pub thresholds: Vec<f64>,
    pub conversations: Vec<ConversationDivergence>,
    pub practices: Vec<PracticeDivergence>,
    /// Conversations skipped for unreadable transcripts or embedding errors
    pub skipped: Vec<SkippedConversation>,
}

/// Summarise every conversation of `corpus`.
///
/// An unavailable embedding model aborts; an embedding failure on one
/// conversation skips it.
pub fn build_report<F>(
    corpus: &Corpus,
    thresholds: &[f64],
    ctx: &MetricContext<'_>,
    mut on_progress: F,
) -> Result<DivergenceReport>
where
    F: FnMut(usize, usize, &str),
{
    let mut report = DivergenceReport {
        thresholds: thresholds.to_vec(),
        ..Default::default()
    };
    let total = corpus.len();

    for (i, entry) in corpus.entries().iter().enumerate() {
        on_progress(i, total, &entry.ids.conversation_id);

        let conversation = match corpus.load(entry) {
            Ok(c) => c,
            Err(e) => {
                report.skipped.push(SkippedConversation::from_load_error(entry, &e));
                continue;
            }
        };

        match conversation_divergence(&conversation, thresholds, ctx) {
            Ok(Some(summary)) => report.conversations.push(summary),
            Ok(None) => {
                tracing::debug!(conversation = %entry.ids.conversation_id, "No prompt/reply pairs");
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(conversation = %entry.ids.conversation_id, error = %e, "Embedding failed, skipping conversation");
                report.skipped.push(SkippedConversation {
                    conversation_id: entry.ids.conversation_id.clone(),
                    path: entry.messages_path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report.practices = aggregate_practices(&report.conversations);
    tracing::info!(
        conversations = report.conversations.len(),
        practices = report.practices.len(),
        skipped = report.skipped.len(),
        "Divergence summary computed"
    );
    Ok(report)
}

pub fn render_conversations(report: &DivergenceReport) -> Result<Vec<u8>> {
    let mut header: Vec<String> = [
        "practice_id",
        "student_id",
        "conversation_id",
        "n_pairs",
        "mean_div",
        "median_div",
        "p90_div",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(
        report
            .thresholds
            .iter()
            .map(|t| format!("pct_le_{}", threshold_label(*t))),
    );
    header.push("pct_ge_0_60".to_string());
    header.push("centroid_div".to_string());
    let header: Vec<&str> = header.iter().map(String::as_str).collect();

    to_csv_bytes(
        &header,
        report.conversations.iter().map(|conv| {
            let s = conv.rounded();
            let mut record = vec![
                conv.ids.practice_id.clone(),
                conv.ids.student_id.clone(),
                conv.ids.conversation_id.clone(),
                s.n_pairs.to_string(),
                format_float(s.mean),
                format_float(s.median),
                format_float(s.p90),
            ];
            record.extend(s.pct_le.iter().map(|(_, v)| format_float(*v)));
            record.push(format_float(s.pct_ge_high));
            record.push(format_float(round_value(conv.centroid_distance, 6)));
            record
        }),
    )
}

pub fn render_practices(report: &DivergenceReport) -> Result<Vec<u8>> {
    let mut header: Vec<String> = [
        "practice_id",
        "conversations",
        "pairs_total",
        "mean_div_conversations",
        "median_div_conversations",
        "p90_div_conversations",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(
        report
            .thresholds
            .iter()
            .map(|t| format!("pct_le_{}_avg", threshold_label(*t))),
    );
    header.push("pct_ge_0_60_avg".to_string());
    let header: Vec<&str> = header.iter().map(String::as_str).collect();

    to_csv_bytes(
        &header,
        report.practices.iter().map(|p| {
            let mut record = vec![
                p.practice_id.clone(),
                p.conversations.to_string(),
                p.pairs_total.to_string(),
                format_float(p.mean_div),
                format_float(p.median_div),
                format_float(p.p90_div),
            ];
            record.extend(p.pct_le_avg.iter().map(|(_, v)| format_float(*v)));
            record.push(format_float(p.pct_ge_high_avg));
            record
        }),
    )
}

/// Write both summary tables into `dir`.
pub fn write_report(dir: &Path, report: &DivergenceReport) -> Result<()> {
    write_file(&dir.join(CONVERSATION_FILE), &render_conversations(report)?)?;
    write_file(&dir.join(PRACTICE_FILE), &render_practices(report)?)?;
    Ok(())
}
