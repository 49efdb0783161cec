//! Integration tests for the criticat metrics pipeline
//!
//! Each test builds a small corpus under a temporary directory and drives it
//! through the public API: corpus scan, metric engine, statistics and the
//! table writers.

use criticat_core::corpus::{compute_long_rows, Corpus, MESSAGES_FILE};
use criticat_core::divergence_report::{build_report, write_report, CONVERSATION_FILE, PRACTICE_FILE};
use criticat_core::export::export_corpus;
use criticat_core::metrics::{
    create_default_engine, Metric, MetricContext, MetricEngine, MetricValueType,
};
use criticat_core::output;
use criticat_core::text::{is_conversation_message, HashingEmbedder, TextServices};
use criticat_core::{
    compute_metric_stats, summarize_metric, Config, Error, Message, MetricRow, MetricValue,
    Result,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

fn msg(role: &str, text: &str) -> Value {
    json!({"role": role, "parts": [text], "visible": true, "conversation": true})
}

fn write_conversation(root: &Path, name: &str, body: &Value) {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(MESSAGES_FILE), body.to_string()).unwrap();
}

/// A01 valid (2 user / 2 model), A02 without a messages file, B05 valid.
fn seed_corpus(root: &Path) {
    write_conversation(
        root,
        "A01",
        &json!([
            msg("user", "hola món"),
            msg("model", "Què en penses?"),
            msg("user", "a"),
            msg("model", "Molt bé."),
        ]),
    );
    std::fs::create_dir_all(root.join("A02")).unwrap();
    write_conversation(
        root,
        "B05",
        &json!({"messages": [
            msg("user", "Com puc millorar el contrast del cartell?"),
            msg("model", "Prova amb un fons més fosc i una tipografia més gruixuda."),
            {"role": "model", "parts": ["nota interna"], "visible": false, "conversation": true},
        ]}),
    );
}

fn default_enabled() -> BTreeMap<String, bool> {
    Config::default().metrics_enabled
}

fn rows_for<'a>(rows: &'a [MetricRow], conversation: &str) -> Vec<&'a MetricRow> {
    rows.iter()
        .filter(|r| r.conversation_id == conversation)
        .collect()
}

fn value_of(rows: &[MetricRow], conversation: &str, metric: &str) -> Option<MetricValue> {
    rows.iter()
        .find(|r| r.conversation_id == conversation && r.metric_name == metric)
        .map(|r| r.metric_value)
}

// ============================================
// Aggregation driver
// ============================================

#[test]
fn test_missing_messages_file_is_skipped_silently() {
    criticat_core::logging::init_test();
    let dir = TempDir::new().unwrap();
    seed_corpus(dir.path());

    let engine = create_default_engine();
    let services = TextServices::without_embedder();
    let ctx = MetricContext::new(&services);

    let report =
        compute_long_rows(dir.path(), &engine, &default_enabled(), &ctx, |_, _, _| {}).unwrap();

    assert_eq!(report.conversations_processed, 2);
    assert!(report.skipped.is_empty());
    assert!(rows_for(&report.rows, "A02").is_empty());
    assert_eq!(rows_for(&report.rows, "A01").len(), 7);

    let first = rows_for(&report.rows, "A01")[0];
    assert_eq!(first.practice_id, "A");
    assert_eq!(first.student_id, "01");
}

#[test]
fn test_two_by_two_conversation_values() {
    let dir = TempDir::new().unwrap();
    seed_corpus(dir.path());

    let engine = create_default_engine();
    let services = TextServices::without_embedder();
    let ctx = MetricContext::new(&services);
    let report =
        compute_long_rows(dir.path(), &engine, &default_enabled(), &ctx, |_, _, _| {}).unwrap();
    let rows = &report.rows;

    assert_eq!(value_of(rows, "A01", "num_turns"), Some(MetricValue::Count(4)));
    assert_eq!(
        value_of(rows, "A01", "num_student_messages"),
        Some(MetricValue::Count(2))
    );
    assert_eq!(value_of(rows, "A01", "num_ai_messages"), Some(MetricValue::Count(2)));
    assert_eq!(
        value_of(rows, "A01", "avg_tokens_student"),
        Some(MetricValue::Float(1.5))
    );
    assert_eq!(value_of(rows, "A01", "num_ai_questions"), Some(MetricValue::Count(1)));
    assert_eq!(
        value_of(rows, "A01", "exploration_ratio_ai"),
        Some(MetricValue::Float(50.0))
    );

    // Hidden model note is out of scope
    assert_eq!(value_of(rows, "B05", "num_ai_messages"), Some(MetricValue::Count(1)));
}

/// Stands in for `avg_tokens_ai`, failing on conversations containing a marker.
struct BrittleAvgTokens;

impl Metric for BrittleAvgTokens {
    fn name(&self) -> &str {
        "avg_tokens_ai"
    }

    fn value_type(&self) -> MetricValueType {
        MetricValueType::Float
    }

    fn compute(&self, messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
        let poisoned = messages.iter().any(|m| {
            criticat_core::text::get_message_text(m).contains("contrast")
        });
        if poisoned {
            return Err(Error::Metric {
                metric: "avg_tokens_ai".to_string(),
                message: "bad value".to_string(),
            });
        }
        let builtin = criticat_core::metrics::builtin("avg_tokens_ai").unwrap();
        builtin.compute(messages, ctx)
    }
}

#[test]
fn test_failing_metric_only_drops_its_own_row() {
    criticat_core::logging::init_test();
    let dir = TempDir::new().unwrap();
    seed_corpus(dir.path());

    let mut engine = create_default_engine();
    engine.register(Box::new(BrittleAvgTokens));

    let services = TextServices::without_embedder();
    let ctx = MetricContext::new(&services);
    let report =
        compute_long_rows(dir.path(), &engine, &default_enabled(), &ctx, |_, _, _| {}).unwrap();

    let b05 = rows_for(&report.rows, "B05");
    assert_eq!(b05.len(), 6);
    assert!(b05.iter().all(|r| r.metric_name != "avg_tokens_ai"));
    assert_eq!(rows_for(&report.rows, "A01").len(), 7);
    assert!(value_of(&report.rows, "A01", "avg_tokens_ai").is_some());

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].conversation_id, "B05");
    assert_eq!(report.failures[0].metric_name, "avg_tokens_ai");
}

#[test]
fn test_runs_are_deterministic() {
    let dir = TempDir::new().unwrap();
    seed_corpus(dir.path());

    let engine = create_default_engine();
    let services = TextServices::without_embedder();
    let ctx = MetricContext::new(&services);
    let enabled = default_enabled();

    let first = compute_long_rows(dir.path(), &engine, &enabled, &ctx, |_, _, _| {}).unwrap();
    let second = compute_long_rows(dir.path(), &engine, &enabled, &ctx, |_, _, _| {}).unwrap();

    assert_eq!(first.rows, second.rows);
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(
        output::render_long(&first.rows).unwrap(),
        output::render_long(&second.rows).unwrap()
    );
}

#[test]
fn test_nothing_enabled_is_fatal() {
    let engine = create_default_engine();
    let services = TextServices::without_embedder();
    let ctx = MetricContext::new(&services);
    let enabled: BTreeMap<String, bool> = [("num_turns".to_string(), false)].into();

    let err = compute_long_rows(
        Path::new("/nonexistent/criticat-corpus"),
        &engine,
        &enabled,
        &ctx,
        |_, _, _| {},
    )
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_divergence_metric_without_model_aborts() {
    let dir = TempDir::new().unwrap();
    seed_corpus(dir.path());

    let engine = create_default_engine();
    let services = TextServices::without_embedder();
    let ctx = MetricContext::new(&services);
    let enabled: BTreeMap<String, bool> = [("semantic_divergence".to_string(), true)].into();

    let err = compute_long_rows(dir.path(), &engine, &enabled, &ctx, |_, _, _| {}).unwrap_err();
    assert!(matches!(err, Error::ModelUnavailable(_)));
}

#[test]
fn test_zero_ai_messages() {
    let dir = TempDir::new().unwrap();
    write_conversation(dir.path(), "C07", &json!([msg("user", "Hi ha algú?")]));

    let mut engine = MetricEngine::new();
    for name in ["exploration_ratio_ai", "num_ai_questions"] {
        engine.register(Box::new(*criticat_core::metrics::builtin(name).unwrap()));
    }
    let enabled: BTreeMap<String, bool> = [
        ("exploration_ratio_ai".to_string(), true),
        ("num_ai_questions".to_string(), true),
    ]
    .into();

    let services = TextServices::without_embedder();
    let ctx = MetricContext::new(&services);
    let report = compute_long_rows(dir.path(), &engine, &enabled, &ctx, |_, _, _| {}).unwrap();

    assert_eq!(
        value_of(&report.rows, "C07", "exploration_ratio_ai"),
        Some(MetricValue::Float(0.0))
    );
    assert_eq!(
        value_of(&report.rows, "C07", "num_ai_questions"),
        Some(MetricValue::Count(0))
    );
}

// ============================================
// Statistics and tables
// ============================================

#[test]
fn test_summarize_metric_properties() {
    let single = summarize_metric(&[5.0]);
    assert_eq!(single.n, 1);
    assert_eq!(single.mean, 5.0);
    assert!(single.sd.is_nan());
    assert!(single.ci_low.is_nan());
    assert!(single.ci_high.is_nan());

    let empty = summarize_metric(&[]);
    assert_eq!(empty.n, 0);
    assert!(empty.mean.is_nan());
    assert!(empty.sd.is_nan());

    let five = summarize_metric(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(five.mean, 3.0);
    assert!(five.ci_low < five.mean && five.mean < five.ci_high);
}

#[test]
fn test_tables_written_from_corpus_run() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    seed_corpus(&data);

    let engine = create_default_engine();
    let services = TextServices::without_embedder();
    let ctx = MetricContext::new(&services);
    let report = compute_long_rows(&data, &engine, &default_enabled(), &ctx, |_, _, _| {}).unwrap();

    let outputs = Config::default().outputs.relocated(&dir.path().join("out"));
    output::write_long(&outputs.metrics_long_csv, &report.rows).unwrap();
    output::write_wide(&outputs.metrics_wide_csv, &report.rows).unwrap();
    let stats = compute_metric_stats(&report.rows);
    output::write_stats(&outputs.metrics_stats_csv, &stats).unwrap();

    let long = std::fs::read_to_string(&outputs.metrics_long_csv).unwrap();
    assert!(long.starts_with("student_id,practice_id,conversation_id,metric_name,metric_value\n"));
    assert!(long.contains("01,A,A01,avg_tokens_student,1.5\n"));
    assert_eq!(long.lines().count(), 1 + 14);

    let wide = std::fs::read_to_string(&outputs.metrics_wide_csv).unwrap();
    assert_eq!(wide.lines().count(), 3);
    assert!(wide.lines().next().unwrap().starts_with("student_id,practice_id,conversation_id,avg_tokens_ai"));

    let stats_csv = std::fs::read_to_string(&outputs.metrics_stats_csv).unwrap();
    assert!(stats_csv.starts_with("practice_id,metric_name,n,mean,sd,ci_low,ci_high\n"));
    assert!(stats_csv.contains("A,num_turns,1,4.0,nan,nan,nan\n"));
    // Two practices times seven metrics
    assert_eq!(stats.len(), 14);
}

// ============================================
// Divergence summary and export
// ============================================

#[test]
fn test_divergence_report_with_hashing_embedder() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    seed_corpus(&data);

    let corpus = Corpus::open(&data).unwrap();
    let services = TextServices::with_embedder(Box::new(HashingEmbedder::new(64).unwrap()));
    let ctx = MetricContext::new(&services);
    let report = build_report(&corpus, &[0.25, 0.35, 0.60], &ctx, |_, _, _| {}).unwrap();

    assert_eq!(report.conversations.len(), 2);
    assert_eq!(report.conversations[0].summary.n_pairs, 2);
    assert_eq!(report.conversations[1].summary.n_pairs, 1);
    for conv in &report.conversations {
        assert!((0.0..=2.0).contains(&conv.summary.mean));
    }
    let practices: Vec<_> = report.practices.iter().map(|p| p.practice_id.as_str()).collect();
    assert_eq!(practices, vec!["A", "B"]);

    let out = dir.path().join("figures");
    write_report(&out, &report).unwrap();
    let by_conv = std::fs::read_to_string(out.join(CONVERSATION_FILE)).unwrap();
    assert!(by_conv.lines().next().unwrap().contains("pct_le_0.25"));
    assert_eq!(by_conv.lines().count(), 3);
    assert!(out.join(PRACTICE_FILE).exists());
}

#[test]
fn test_export_writes_one_dialogue_per_conversation() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    seed_corpus(&data);
    write_conversation(
        &data,
        "C01",
        &json!([{"role": "user", "parts": ["amagat"], "visible": false, "conversation": true}]),
    );

    let corpus = Corpus::open(&data).unwrap();
    let out = dir.path().join("dialogues");
    let summary = export_corpus(&corpus, &out, is_conversation_message, |_, _, _| {}).unwrap();

    assert_eq!(summary.written.len(), 2);
    assert_eq!(summary.empty, vec!["C01".to_string()]);
    assert!(!out.join("C01.txt").exists());

    let a01 = std::fs::read_to_string(out.join("A01.txt")).unwrap();
    assert!(a01.starts_with("# Dialogue A01 (practice=A, student=01)\n"));
    assert!(a01.contains("[STUDENT]\nhola món\n"));
    assert!(a01.contains("[AI]\nQuè en penses?\n"));

    let b05 = std::fs::read_to_string(out.join("B05.txt")).unwrap();
    assert!(!b05.contains("nota interna"));
}
