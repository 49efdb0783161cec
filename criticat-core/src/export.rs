//! Plain-text dialogue export.
//!
//! Each conversation with at least one in-scope message becomes
//! `<conversation_id>.txt`:
//!
//! ```text
//! # Dialogue A01 (practice=A, student=01)
//!
//! [STUDENT]
//! Hola, com puc millorar el contrast?
//!
//! [AI]
//! Prova un fons més fosc.
//! ```

use crate::corpus::{Corpus, SkippedConversation};
use crate::error::Result;
use crate::output::write_file;
use crate::text::message::{get_message_text, MessageFilter};
use crate::types::{Conversation, Message};
use std::path::{Path, PathBuf};

/// Speaker label: `STUDENT`, `AI`, or the raw role uppercased.
pub fn role_label(msg: &Message) -> String {
    match msg.role() {
        Some(role) => role.label().to_string(),
        None => msg.role_str().unwrap_or_default().to_uppercase(),
    }
}

/// Render a conversation; `None` when no message is in scope.
pub fn render_dialogue(conversation: &Conversation, filter: MessageFilter) -> Option<String> {
    let messages: Vec<&Message> = conversation.messages.iter().filter(|m| filter(m)).collect();
    if messages.is_empty() {
        return None;
    }

    let ids = &conversation.ids;
    let mut lines = vec![format!(
        "# Dialogue {} (practice={}, student={})\n",
        ids.conversation_id, ids.practice_id, ids.student_id
    )];
    for msg in messages {
        lines.push(format!("[{}]", role_label(msg)));
        lines.push(get_message_text(msg).trim().to_string());
        lines.push(String::new());
    }
    Some(lines.join("\n"))
}

/// Outcome of exporting a corpus.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    /// Conversations with nothing in scope
    pub empty: Vec<String>,
    pub skipped: Vec<SkippedConversation>,
}

/// Export every conversation of `corpus` into `output_root`.
///
/// `on_progress` is called with `(index, total, conversation_id)`.
pub fn export_corpus<F>(
    corpus: &Corpus,
    output_root: &Path,
    filter: MessageFilter,
    mut on_progress: F,
) -> Result<ExportSummary>
where
    F: FnMut(usize, usize, &str),
{
    let mut summary = ExportSummary::default();
    let total = corpus.len();

    for (i, entry) in corpus.entries().iter().enumerate() {
        let id = &entry.ids.conversation_id;
        on_progress(i, total, id);

        let conversation = match corpus.load(entry) {
            Ok(c) => c,
            Err(e) => {
                summary.skipped.push(SkippedConversation::from_load_error(entry, &e));
                continue;
            }
        };

        match render_dialogue(&conversation, filter) {
            Some(text) => {
                let path = output_root.join(format!("{}.txt", id));
                write_file(&path, text.as_bytes())?;
                summary.written.push(path);
            }
            None => {
                tracing::info!(conversation = %id, "No conversation messages, nothing exported");
                summary.empty.push(id.clone());
            }
        }
    }

    tracing::info!(
        written = summary.written.len(),
        empty = summary.empty.len(),
        skipped = summary.skipped.len(),
        "Dialogue export finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::is_conversation_message;
    use crate::types::{ConversationIds, Role};

    fn conversation(messages: Vec<Message>) -> Conversation {
        Conversation {
            ids: ConversationIds::from_folder_name("A01"),
            messages,
        }
    }

    #[test]
    fn test_render_dialogue() {
        let conv = conversation(vec![
            Message::new(Role::User, "  Hola  "),
            Message::new(Role::Model, "intern").with_visible(false),
            Message::new(Role::Model, "Bon dia"),
        ]);
        let text = render_dialogue(&conv, is_conversation_message).unwrap();
        assert_eq!(
            text,
            "# Dialogue A01 (practice=A, student=01)\n\n[STUDENT]\nHola\n\n[AI]\nBon dia\n"
        );
    }

    #[test]
    fn test_unknown_role_uppercased() {
        let mut msg = Message::new(Role::User, "x");
        msg.role = "system".into();
        assert_eq!(role_label(&msg), "SYSTEM");
        msg.role = serde_json::Value::Null;
        assert_eq!(role_label(&msg), "");
    }

    #[test]
    fn test_nothing_in_scope() {
        let conv = conversation(vec![Message::new(Role::User, "x").with_conversation(false)]);
        assert!(render_dialogue(&conv, is_conversation_message).is_none());
    }
}
