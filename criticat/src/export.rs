//! criticat-export - write each conversation as a plain-text dialogue

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use criticat_core::export::export_corpus;
use criticat_core::text::is_conversation_message;
use criticat_core::Corpus;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "criticat-export")]
#[command(about = "Export CritiCat conversations as readable dialogue files")]
#[command(version)]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/criticat/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Corpus root with one folder per conversation
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Directory receiving one <conversation_id>.txt per conversation
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Verbose output (warnings on stderr)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let (config, _log_guard) = cli::init(args.config.as_deref(), args.verbose)?;

    let data_root = cli::resolve(args.data_root, &config.data_root);
    let output_root = cli::resolve(args.output_root, &config.export.output_root);

    tracing::info!(
        data_root = %data_root.display(),
        output_root = %output_root.display(),
        "criticat-export starting"
    );

    let corpus = Corpus::open(&data_root)
        .with_context(|| format!("failed to read corpus root {}", data_root.display()))?;

    let pb = cli::progress_bar();
    let summary = export_corpus(
        &corpus,
        &output_root,
        is_conversation_message,
        |current, total, id| cli::tick(&pb, current, total, id),
    )
    .context("dialogue export failed")?;
    pb.finish_and_clear();

    println!(
        "Exported {} dialogue(s) to {}",
        summary.written.len(),
        output_root.display()
    );
    if !summary.empty.is_empty() {
        println!("  {} conversation(s) had nothing to export", summary.empty.len());
    }
    if !summary.skipped.is_empty() {
        println!("Skipped {} conversation(s):", summary.skipped.len());
        for skipped in &summary.skipped {
            println!("  - {}: {}", skipped.conversation_id, skipped.reason);
        }
    }

    tracing::info!(written = summary.written.len(), "criticat-export complete");
    Ok(())
}
