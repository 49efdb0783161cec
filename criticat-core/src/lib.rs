//! # criticat-core
//!
//! Core library for criticat - quantitative metrics over exported
//! student/AI tutoring chats.
//!
//! This library provides:
//! - Domain types for messages, conversations and metric tables
//! - Catalan text analysis (tokens, syllables, questions, lexicons, MTLD,
//!   segmentation, embeddings)
//! - A metric engine with the built-in conversation metrics
//! - The corpus driver, statistics, and CSV writers
//! - Semantic displacement tables and plain-text dialogue export
//! - Configuration management and logging infrastructure
//!
//! ## Data flow
//!
//! ```text
//! data/<conversation>/messages.json
//!         │  corpus::Corpus
//!         ▼
//!   Vec<Message> ──► MetricEngine (active metrics) ──► MetricRow (long)
//!                                                        │
//!                          ┌─────────────────────────────┼──────────────┐
//!                          ▼                             ▼              ▼
//!                   metrics_raw.csv              metrics_wide.csv  metrics_stats.csv
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use criticat_core::corpus::compute_long_rows;
//! use criticat_core::metrics::{create_default_engine, MetricContext};
//! use criticat_core::text::TextServices;
//! use criticat_core::Config;
//!
//! let config = Config::load().expect("failed to load config");
//! let engine = create_default_engine();
//! let services = TextServices::new(&config.embedding);
//! let ctx = MetricContext::new(&services);
//!
//! let report = compute_long_rows(&config.data_root, &engine, &config.metrics_enabled, &ctx, |_, _, _| {})
//!     .expect("metric run failed");
//! println!("{} rows", report.rows.len());
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use corpus::{compute_long_rows, Corpus, CorpusReport, SkippedConversation};
pub use error::{Error, Result};
pub use metrics::{create_default_engine, Metric, MetricContext, MetricEngine};
pub use stats::{compute_metric_stats, summarize_metric};
pub use types::*;

// Public modules
pub mod config;
pub mod corpus;
pub mod divergence_report;
pub mod error;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod output;
pub mod stats;
pub mod text;
pub mod types;
