//! criticat-divergence - semantic displacement between prompts and replies
//!
//! Writes `summary_by_conversation.csv` and `summary_by_practice.csv`.

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use criticat_core::divergence_report::{
    build_report, write_report, CONVERSATION_FILE, PRACTICE_FILE,
};
use criticat_core::metrics::MetricContext;
use criticat_core::text::TextServices;
use criticat_core::Corpus;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "criticat-divergence")]
#[command(about = "Summarise semantic divergence between student prompts and AI replies")]
#[command(version)]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/criticat/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Corpus root with one folder per conversation
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Directory for the two summary tables
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Distance thresholds for the pct_le_* columns (repeatable)
    #[arg(long = "thr", num_args = 1..)]
    thresholds: Vec<f64>,

    /// Verbose output (warnings on stderr)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let (config, _log_guard) = cli::init(args.config.as_deref(), args.verbose)?;

    let thresholds = if args.thresholds.is_empty() {
        config.divergence.thresholds.clone()
    } else {
        args.thresholds
    };
    if let Some(bad) = thresholds.iter().find(|t| !(0.0..=2.0).contains(*t)) {
        bail!("threshold {} is outside the cosine distance range [0, 2]", bad);
    }

    let data_root = cli::resolve(args.data_root, &config.data_root);
    let out_dir = cli::resolve(args.out_dir, &config.divergence.output_dir);

    tracing::info!(
        data_root = %data_root.display(),
        provider = config.embedding.provider.as_str(),
        thresholds = ?thresholds,
        "criticat-divergence starting"
    );

    let corpus = Corpus::open(&data_root)
        .with_context(|| format!("failed to read corpus root {}", data_root.display()))?;
    let services = TextServices::new(&config.embedding);
    let ctx = MetricContext::new(&services);

    let pb = cli::progress_bar();
    let report = build_report(&corpus, &thresholds, &ctx, |current, total, id| {
        cli::tick(&pb, current, total, id)
    })
    .context("divergence run aborted")?;
    pb.finish_and_clear();

    write_report(&out_dir, &report).context("failed to write divergence tables")?;

    println!(
        "Summarised {} conversation(s) across {} practice(s).",
        report.conversations.len(),
        report.practices.len()
    );
    if !report.skipped.is_empty() {
        println!("Skipped {} conversation(s):", report.skipped.len());
        for skipped in &report.skipped {
            println!("  - {}: {}", skipped.conversation_id, skipped.reason);
        }
    }
    println!();
    println!("By conversation: {}", out_dir.join(CONVERSATION_FILE).display());
    println!("By practice:     {}", out_dir.join(PRACTICE_FILE).display());

    tracing::info!(
        conversations = report.conversations.len(),
        skipped = report.skipped.len(),
        "criticat-divergence complete"
    );

    Ok(())
}
