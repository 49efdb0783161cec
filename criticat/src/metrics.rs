//! criticat-metrics - compute conversation metrics over a transcript corpus
//!
//! Writes the long, wide and per-practice statistics tables.

mod cli;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use criticat_core::compute_metric_stats;
use criticat_core::config::OutputsConfig;
use criticat_core::corpus::{compute_with_active, Corpus, CorpusReport};
use criticat_core::metrics::{create_default_engine, list_metrics, MetricContext};
use criticat_core::output;
use criticat_core::text::TextServices;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "criticat-metrics")]
#[command(about = "Compute conversation metrics for a CritiCat transcript corpus")]
#[command(version)]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/criticat/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Corpus root with one folder per conversation
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Write all three tables into this directory instead of the configured paths
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// List available metrics without computing anything
    #[arg(long)]
    list_metrics: bool,

    /// Output format for --list-metrics and the run summary
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbose output (warnings on stderr, per-failure details)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_metrics {
        print_metric_list(args.format)?;
        return Ok(());
    }

    let (config, _log_guard) = cli::init(args.config.as_deref(), args.verbose)?;

    let engine = create_default_engine();
    let active = engine
        .select(&config.metrics_enabled)
        .context("nothing to compute")?;

    let data_root = cli::resolve(args.data_root, &config.data_root);
    let outputs = match &args.out_dir {
        Some(dir) => config.outputs.relocated(dir),
        None => config.outputs.clone(),
    };

    tracing::info!(
        data_root = %data_root.display(),
        metrics = active.len(),
        "criticat-metrics starting"
    );

    let corpus = Corpus::open(&data_root)
        .with_context(|| format!("failed to read corpus root {}", data_root.display()))?;
    let services = TextServices::new(&config.embedding);
    let ctx = MetricContext::new(&services);

    let pb = cli::progress_bar();
    let report = compute_with_active(&corpus, &engine, &active, &ctx, |current, total, id| {
        cli::tick(&pb, current, total, id)
    })
    .context("metric run aborted")?;
    pb.finish_and_clear();

    let stats = compute_metric_stats(&report.rows);

    output::write_long(&outputs.metrics_long_csv, &report.rows)
        .context("failed to write long table")?;
    output::write_wide(&outputs.metrics_wide_csv, &report.rows)
        .context("failed to write wide table")?;
    output::write_stats(&outputs.metrics_stats_csv, &stats)
        .context("failed to write stats table")?;

    print_summary(&report, &outputs, args.format, args.verbose)?;

    tracing::info!(
        rows = report.rows.len(),
        fingerprint = %report.fingerprint(),
        "criticat-metrics complete"
    );

    Ok(())
}

fn print_metric_list(format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let entries: Vec<serde_json::Value> = list_metrics()
            .iter()
            .map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "value_type": m.value_type.as_str(),
                    "summary": m.summary,
                    "description": m.description,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Available metrics:");
    for metric in list_metrics() {
        println!(
            "  - {:<28} {:<8} {}",
            metric.name,
            metric.value_type.as_str(),
            metric.summary
        );
    }
    Ok(())
}

fn print_summary(
    report: &CorpusReport,
    outputs: &OutputsConfig,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    if format == OutputFormat::Json {
        let summary = serde_json::json!({
            "conversations": report.conversations_processed,
            "skipped": report.skipped.iter().map(|s| &s.conversation_id).collect::<Vec<_>>(),
            "rows": report.rows.len(),
            "failures": report.failures.len(),
            "fingerprint": report.fingerprint(),
            "outputs": {
                "long": outputs.metrics_long_csv,
                "wide": outputs.metrics_wide_csv,
                "stats": outputs.metrics_stats_csv,
            },
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "Computed {} rows for {} conversation(s).",
        report.rows.len(),
        report.conversations_processed
    );
    if !report.skipped.is_empty() {
        println!("Skipped {} conversation(s):", report.skipped.len());
        for skipped in &report.skipped {
            println!("  - {}: {}", skipped.conversation_id, skipped.reason);
        }
    }
    if !report.failures.is_empty() {
        println!("{} metric run(s) failed.", report.failures.len());
        if verbose {
            for failure in &report.failures {
                println!(
                    "  - {} / {}: {}",
                    failure.conversation_id,
                    failure.metric_name,
                    failure.error_message.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    println!();
    println!("Long table:  {}", outputs.metrics_long_csv.display());
    println!("Wide table:  {}", outputs.metrics_wide_csv.display());
    println!("Stats table: {}", outputs.metrics_stats_csv.display());
    Ok(())
}
