//! Conversation metrics
//!
//! Every metric maps a conversation's message list to one number. The
//! built-ins are grouped by what they look at:
//!
//! - [`dialogue`]: turn counts, message lengths, AI question rate
//! - [`divergence`]: embedding distance between prompts and replies
//! - [`lexical`]: MTLD diversity and vocabulary coverage
//! - [`readability`]: Flesch-Szigriszt readability
//!
//! See [`engine`] for the framework and [`registry`] for the built-in table.

pub mod dialogue;
pub mod divergence;
pub mod engine;
pub mod lexical;
pub mod readability;
pub mod registry;

pub use divergence::{extract_pairs, TurnPair};
pub use engine::{Metric, MetricContext, MetricEngine, MetricRunResult, MetricRunStatus};
pub use registry::{
    builtin, create_default_engine, list_metrics, MetricDescriptor, MetricFn, MetricValueType,
};
