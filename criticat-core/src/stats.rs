//! Per-practice summary statistics.
//!
//! Rows are grouped by `(practice_id, metric_name)` in the order each group
//! first appears; every group gets n, mean, sample sd and a normal-theory
//! 95% confidence interval for the mean.

use crate::text::round_value;
use crate::types::{MetricRow, StatsRow};
use std::collections::HashMap;

/// z value for a two-sided 95% interval.
const Z_95: f64 = 1.96;

/// Summary of one group of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    pub n: usize,
    pub mean: f64,
    pub sd: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

/// Summarise `values`, rounding every statistic to 2 decimals.
///
/// With one value sd and the interval are NaN; with none, everything is.
pub fn summarize_metric(values: &[f64]) -> MetricSummary {
    let n = values.len();
    if n == 0 {
        return MetricSummary {
            n: 0,
            mean: f64::NAN,
            sd: f64::NAN,
            ci_low: f64::NAN,
            ci_high: f64::NAN,
        };
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let (sd, ci_low, ci_high) = if n > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let sd = variance.sqrt();
        let se = sd / (n as f64).sqrt();
        (sd, mean - Z_95 * se, mean + Z_95 * se)
    } else {
        (f64::NAN, f64::NAN, f64::NAN)
    };

    MetricSummary {
        n,
        mean: round_value(mean, 2),
        sd: round_value(sd, 2),
        ci_low: round_value(ci_low, 2),
        ci_high: round_value(ci_high, 2),
    }
}

/// One stats row per `(practice_id, metric_name)` group.
pub fn compute_metric_stats(rows: &[MetricRow]) -> Vec<StatsRow> {
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut groups: HashMap<(&str, &str), Vec<f64>> = HashMap::new();

    for row in rows {
        let key = (row.practice_id.as_str(), row.metric_name.as_str());
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(row.metric_value.as_f64());
    }

    order
        .into_iter()
        .map(|key| {
            let summary = summarize_metric(&groups[&key]);
            StatsRow {
                practice_id: key.0.to_string(),
                metric_name: key.1.to_string(),
                n: summary.n,
                mean: summary.mean,
                sd: summary.sd,
                ci_low: summary.ci_low,
                ci_high: summary.ci_high,
            }
        })
        .collect()
}
