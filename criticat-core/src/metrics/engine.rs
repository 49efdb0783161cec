//! Metric framework
//!
//! Metrics consume a conversation's messages and produce one
//! [`MetricValue`]. The engine owns the registered metrics, selects the
//! active set from the enablement map, and runs each active metric in
//! isolation so one failure never hides the others.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        METRIC ENGINE                            │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐             │
//! │  │ num_turns   │  │ avg_tokens_ │  │ semantic_   │  ...        │
//! │  │             │  │ student     │  │ divergence  │             │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘             │
//! │         │                │                │                     │
//! │         ▼                ▼                ▼                     │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              MetricEngine.run_metric()                  │   │
//! │  │  - Calls metric.compute(messages, ctx)                  │   │
//! │  │  - Fatal errors (model unavailable) propagate           │   │
//! │  │  - Other errors become an Error run result              │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use criticat_core::metrics::{create_default_engine, MetricContext};
//! use criticat_core::text::TextServices;
//! use criticat_core::Config;
//!
//! let config = Config::default();
//! let engine = create_default_engine();
//! let active = engine.select(&config.metrics_enabled).expect("metrics enabled");
//! let services = TextServices::new(&config.embedding);
//! let ctx = MetricContext::new(&services);
//!
//! for result in engine.run_conversation(&active, &conversation, &ctx).expect("run") {
//!     println!("{}: {}", result.metric_name, result.status.as_str());
//! }
//! ```

use super::registry::MetricValueType;
use crate::error::{Error, Result};
use crate::text::message::{is_conversation_message, MessageFilter};
use crate::text::TextServices;
use crate::types::{Conversation, Message, MetricRow, MetricValue};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Instant;

// ============================================
// Metric context
// ============================================

/// Everything a metric may consult besides the messages themselves.
#[derive(Clone, Copy)]
pub struct MetricContext<'a> {
    /// Shared text-analysis services (segmenter, embedder)
    pub services: &'a TextServices,
    /// Which messages are in scope
    pub filter: MessageFilter,
}

impl<'a> MetricContext<'a> {
    /// Context using the standard visible-and-conversation filter.
    pub fn new(services: &'a TextServices) -> Self {
        Self {
            services,
            filter: is_conversation_message,
        }
    }

    pub fn with_filter(mut self, filter: MessageFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Whether `msg` passes the scope filter.
    pub fn in_scope(&self, msg: &Message) -> bool {
        (self.filter)(msg)
    }
}

// ============================================
// Metric run results
// ============================================

/// Outcome of running one metric on one conversation.
#[derive(Debug, Clone)]
pub struct MetricRunResult {
    pub metric_name: String,
    pub conversation_id: String,
    /// When the metric run started
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub status: MetricRunStatus,
    /// Present iff the run succeeded
    pub value: Option<MetricValue>,
    pub error_message: Option<String>,
}

impl MetricRunResult {
    /// The long-format row for a successful run.
    pub fn to_row(&self, conversation: &Conversation) -> Option<MetricRow> {
        self.value
            .map(|value| MetricRow::new(&conversation.ids, &self.metric_name, value))
    }

    pub fn is_success(&self) -> bool {
        self.status == MetricRunStatus::Success
    }
}

/// Status of a metric run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricRunStatus {
    Success,
    Error,
}

impl MetricRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricRunStatus::Success => "success",
            MetricRunStatus::Error => "error",
        }
    }
}

// ============================================
// Metric trait
// ============================================

/// A single conversation-level measurement.
///
/// Metrics should be deterministic and must tolerate empty input: absence
/// of applicable data is a zero value, not an error. Return an error only
/// for data the metric genuinely cannot handle, or
/// [`Error::ModelUnavailable`] when a required service is missing.
pub trait Metric: Send + Sync {
    /// Unique name, used as the column name in output tables.
    fn name(&self) -> &str;

    /// Kind of value produced.
    fn value_type(&self) -> MetricValueType;

    /// Compute the metric over a conversation's full message list.
    fn compute(&self, messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue>;
}

// ============================================
// Metric engine
// ============================================

/// Registered metrics, in registration order.
pub struct MetricEngine {
    metrics: Vec<Box<dyn Metric>>,
}

impl MetricEngine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self {
            metrics: Vec::new(),
        }
    }

    /// Register a metric with the engine.
    ///
    /// A metric registered under an existing name replaces it in place.
    pub fn register(&mut self, metric: Box<dyn Metric>) {
        tracing::debug!(metric = metric.name(), "Registered metric");
        match self.metrics.iter().position(|m| m.name() == metric.name()) {
            Some(index) => self.metrics[index] = metric,
            None => self.metrics.push(metric),
        }
    }

    /// Registered metric names in registration order.
    pub fn metric_names(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.name()).collect()
    }

    pub fn has_metric(&self, name: &str) -> bool {
        self.metrics.iter().any(|m| m.name() == name)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Active metrics: registered and mapped to `true`, in registration order.
    ///
    /// An empty active set is a configuration error.
    pub fn select(&self, enabled: &BTreeMap<String, bool>) -> Result<Vec<&dyn Metric>> {
        for (name, on) in enabled {
            if *on && !self.has_metric(name) {
                tracing::warn!(metric = %name, "Enabled metric is not registered; ignoring");
            }
        }

        let active: Vec<&dyn Metric> = self
            .metrics
            .iter()
            .filter(|m| enabled.get(m.name()).copied().unwrap_or(false))
            .map(|m| m.as_ref())
            .collect();

        if active.is_empty() {
            return Err(Error::Config(
                "no metrics enabled in configuration".to_string(),
            ));
        }

        tracing::info!(
            metrics = ?active.iter().map(|m| m.name()).collect::<Vec<_>>(),
            "Selected active metrics"
        );
        Ok(active)
    }

    /// Run one metric on one conversation.
    ///
    /// Returns `Err` only for fatal errors; anything else is reported in
    /// the run result.
    pub fn run_metric(
        &self,
        metric: &dyn Metric,
        conversation: &Conversation,
        ctx: &MetricContext<'_>,
    ) -> Result<MetricRunResult> {
        let conversation_id = &conversation.ids.conversation_id;
        let started_at = Utc::now();
        let start = Instant::now();

        let outcome = metric.compute(&conversation.messages, ctx);
        let duration_ms = start.elapsed().as_millis() as i64;

        match outcome {
            Ok(value) => {
                tracing::trace!(
                    metric = metric.name(),
                    conversation = %conversation_id,
                    value = %value,
                    duration_ms,
                    "Metric computed"
                );
                Ok(MetricRunResult {
                    metric_name: metric.name().to_string(),
                    conversation_id: conversation_id.clone(),
                    started_at,
                    duration_ms,
                    status: MetricRunStatus::Success,
                    value: Some(value),
                    error_message: None,
                })
            }
            Err(e) if e.is_fatal() => {
                tracing::error!(
                    metric = metric.name(),
                    conversation = %conversation_id,
                    error = %e,
                    "Metric aborted the run"
                );
                Err(e)
            }
            Err(e) => {
                tracing::warn!(
                    metric = metric.name(),
                    conversation = %conversation_id,
                    error = %e,
                    "Metric failed"
                );
                Ok(MetricRunResult {
                    metric_name: metric.name().to_string(),
                    conversation_id: conversation_id.clone(),
                    started_at,
                    duration_ms,
                    status: MetricRunStatus::Error,
                    value: None,
                    error_message: Some(e.to_string()),
                })
            }
        }
    }

    /// Run every active metric on a conversation, in order.
    ///
    /// Failed metrics don't stop the others; a fatal error stops everything.
    pub fn run_conversation(
        &self,
        active: &[&dyn Metric],
        conversation: &Conversation,
        ctx: &MetricContext<'_>,
    ) -> Result<Vec<MetricRunResult>> {
        active
            .iter()
            .map(|metric| self.run_metric(*metric, conversation, ctx))
            .collect()
    }
}

impl Default for MetricEngine {
    fn default() -> Self {
        Self::new()
    }
}
