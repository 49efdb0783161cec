//! Corpus discovery, transcript loading and the metric aggregation driver.
//!
//! A corpus is a directory with one sub-folder per conversation. The folder
//! name encodes `<practice><student>` (`A07`) and the folder holds the
//! exported chat history as `messages.json`.
//!
//! ```text
//! data/
//! ├── A01/messages.json
//! ├── A02/              (no transcript: skipped silently)
//! └── B05/messages.json
//! ```

use crate::error::{Error, Result};
use crate::metrics::{Metric, MetricContext, MetricEngine, MetricRunResult};
use crate::types::{Conversation, ConversationIds, Message, MetricRow};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Transcript file expected in every conversation folder.
pub const MESSAGES_FILE: &str = "messages.json";

// ============================================
// Loading
// ============================================

/// Parse a transcript: either a bare array of messages or an object with a
/// `messages` array.
pub fn load_messages(path: &Path) -> Result<Vec<Message>> {
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("messages") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Err(unexpected_structure(path)),
        },
        _ => return Err(unexpected_structure(path)),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item).map_err(|e| Error::Parse {
                path: path.to_path_buf(),
                message: format!("message {}: {}", i, e),
            })
        })
        .collect()
}

fn unexpected_structure(path: &Path) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        message: "unexpected JSON structure".to_string(),
    }
}

/// Decompose a folder name into practice, student and conversation ids.
pub fn parse_ids(folder_name: &str) -> ConversationIds {
    let ids = ConversationIds::from_folder_name(folder_name);
    if !folder_name.is_empty() && !ids.has_conventional_practice() {
        tracing::debug!(
            folder = folder_name,
            practice_id = %ids.practice_id,
            "Folder name does not start with a practice letter"
        );
    }
    ids
}

// ============================================
// Discovery
// ============================================

/// A conversation folder that holds a transcript.
#[derive(Debug, Clone)]
pub struct CorpusEntry {
    pub ids: ConversationIds,
    pub messages_path: PathBuf,
}

/// Conversation folders of a corpus root, in lexicographic order.
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    /// Scan the immediate sub-directories of `root`.
    ///
    /// Folders without a transcript are left out without a warning.
    pub fn open(root: &Path) -> Result<Self> {
        let mut dirs: Vec<(String, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            // Follows symlinks, so linked conversation folders count
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            dirs.push((name, path));
        }
        dirs.sort_by(|a, b| a.0.cmp(&b.0));

        let mut entries = Vec::with_capacity(dirs.len());
        for (name, dir) in dirs {
            let messages_path = dir.join(MESSAGES_FILE);
            if !messages_path.is_file() {
                tracing::trace!(folder = %name, "No transcript, skipping folder");
                continue;
            }
            entries.push(CorpusEntry {
                ids: parse_ids(&name),
                messages_path,
            });
        }

        tracing::debug!(root = %root.display(), conversations = entries.len(), "Corpus scanned");
        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load one conversation's transcript.
    pub fn load(&self, entry: &CorpusEntry) -> Result<Conversation> {
        let messages = load_messages(&entry.messages_path)?;
        Ok(Conversation {
            ids: entry.ids.clone(),
            messages,
        })
    }
}

// ============================================
// Aggregation
// ============================================

/// A conversation whose transcript could not be loaded.
#[derive(Debug, Clone)]
pub struct SkippedConversation {
    pub conversation_id: String,
    pub path: PathBuf,
    pub reason: String,
}

impl SkippedConversation {
    /// Record a load failure, logging it as a warning.
    pub fn from_load_error(entry: &CorpusEntry, error: &Error) -> Self {
        tracing::warn!(
            conversation = %entry.ids.conversation_id,
            error = %error,
            "Skipping conversation: cannot load messages"
        );
        Self {
            conversation_id: entry.ids.conversation_id.clone(),
            path: entry.messages_path.clone(),
            reason: error.to_string(),
        }
    }
}

/// Result of a corpus metric run.
#[derive(Debug, Default)]
pub struct CorpusReport {
    /// Long-format rows, by conversation then metric registration order
    pub rows: Vec<MetricRow>,
    /// Conversations whose metrics were computed
    pub conversations_processed: usize,
    /// Conversations skipped because their transcript could not be loaded
    pub skipped: Vec<SkippedConversation>,
    /// Metric runs that failed (their rows are absent)
    pub failures: Vec<MetricRunResult>,
}

impl CorpusReport {
    /// SHA-256 over the rendered rows; equal for byte-identical row sets.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for row in &self.rows {
            hasher.update(
                format!(
                    "{}\t{}\t{}\t{}\t{}\n",
                    row.student_id,
                    row.practice_id,
                    row.conversation_id,
                    row.metric_name,
                    row.metric_value
                )
                .as_bytes(),
            );
        }
        hex::encode(hasher.finalize())
    }
}

/// Compute every enabled metric for every conversation under `root`.
///
/// The active set is resolved before the corpus is touched, so a config with
/// nothing enabled fails without any I/O. `on_progress` is called with
/// `(index, total, conversation_id)` before each conversation.
pub fn compute_long_rows<F>(
    root: &Path,
    engine: &MetricEngine,
    enabled: &BTreeMap<String, bool>,
    ctx: &MetricContext<'_>,
    on_progress: F,
) -> Result<CorpusReport>
where
    F: FnMut(usize, usize, &str),
{
    let active = engine.select(enabled)?;
    let corpus = Corpus::open(root)?;
    compute_with_active(&corpus, engine, &active, ctx, on_progress)
}

/// Run an already selected metric set over a scanned corpus.
pub fn compute_with_active<F>(
    corpus: &Corpus,
    engine: &MetricEngine,
    active: &[&dyn Metric],
    ctx: &MetricContext<'_>,
    mut on_progress: F,
) -> Result<CorpusReport>
where
    F: FnMut(usize, usize, &str),
{
    let total = corpus.len();
    let mut report = CorpusReport::default();

    for (i, entry) in corpus.entries().iter().enumerate() {
        on_progress(i, total, &entry.ids.conversation_id);

        let conversation = match corpus.load(entry) {
            Ok(conversation) => conversation,
            Err(e) => {
                report.skipped.push(SkippedConversation::from_load_error(entry, &e));
                continue;
            }
        };

        for result in engine.run_conversation(active, &conversation, ctx)? {
            match result.to_row(&conversation) {
                Some(row) => report.rows.push(row),
                None => report.failures.push(result),
            }
        }
        report.conversations_processed += 1;
    }

    tracing::info!(
        conversations = report.conversations_processed,
        skipped = report.skipped.len(),
        rows = report.rows.len(),
        failures = report.failures.len(),
        "Corpus metrics computed"
    );
    Ok(report)
}
