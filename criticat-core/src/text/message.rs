//! Message filtering and text extraction.

use crate::types::{format_float, Message, Role};

/// Predicate deciding which messages count towards a metric.
pub type MessageFilter = fn(&Message) -> bool;

/// A message is in scope iff it is both visible and part of the dialogue.
///
/// Missing flags count as false.
pub fn is_conversation_message(msg: &Message) -> bool {
    msg.is_visible() && msg.is_conversation()
}

/// Concatenate a message's text parts with single spaces.
///
/// Non-string parts are rendered in the history exporter's own notation
/// (`True`, `None`, `['a', 1]`), so token counts match transcripts that were
/// flattened by it. A non-array `parts` value is rendered directly; missing
/// parts give an empty string.
pub fn get_message_text(msg: &Message) -> String {
    use serde_json::Value;
    match &msg.parts {
        Value::Null => String::new(),
        Value::Array(parts) => parts
            .iter()
            .map(render_part)
            .collect::<Vec<_>>()
            .join(" "),
        other => render_part(other),
    }
}

fn render_part(part: &serde_json::Value) -> String {
    match part {
        serde_json::Value::String(s) => s.clone(),
        other => render_nested(other),
    }
}

/// Render a value as it appears inside a list or dict.
fn render_nested(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() => format_float(f),
            _ => n.to_string(),
        },
        Value::String(s) => quote(s),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(render_nested).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{}: {}", quote(k), render_nested(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Single-quoted unless the text holds a single quote and no double quote.
fn quote(s: &str) -> String {
    let delimiter = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delimiter);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

/// In-scope messages of one role, in order.
pub(crate) fn messages_for_role<'a>(
    messages: &'a [Message],
    role: Role,
    filter: MessageFilter,
) -> impl Iterator<Item = &'a Message> + 'a {
    messages
        .iter()
        .filter(move |m| filter(m) && m.role() == Some(role))
}

/// In-scope texts of one role joined with newlines.
pub(crate) fn role_text(messages: &[Message], role: Role, filter: MessageFilter) -> String {
    messages_for_role(messages, role, filter)
        .map(get_message_text)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn msg(value: serde_json::Value) -> Message {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_filter_requires_both_flags() {
        assert!(is_conversation_message(&msg(
            json!({"visible": true, "conversation": true})
        )));
        assert!(!is_conversation_message(&msg(
            json!({"visible": true, "conversation": false})
        )));
        assert!(!is_conversation_message(&msg(json!({"visible": true}))));
        assert!(!is_conversation_message(&msg(json!({}))));
    }

    #[test]
    fn test_get_message_text() {
        assert_eq!(get_message_text(&msg(json!({"parts": []}))), "");
        assert_eq!(get_message_text(&msg(json!({"parts": ["a", "b"]}))), "a b");
        assert_eq!(get_message_text(&msg(json!({}))), "");
        assert_eq!(get_message_text(&msg(json!({"parts": "solt"}))), "solt");
        assert_eq!(get_message_text(&msg(json!({"parts": ["x", 3]}))), "x 3");
    }

    #[test]
    fn test_non_string_parts_use_exporter_notation() {
        assert_eq!(
            get_message_text(&msg(json!({"parts": [true, null, "x"]}))),
            "True None x"
        );
        assert_eq!(
            get_message_text(&msg(json!({"parts": [["a", 1], {"k": "it's"}]}))),
            "['a', 1] {'k': \"it's\"}"
        );
        assert_eq!(get_message_text(&msg(json!({"parts": [2.5, 1.0]}))), "2.5 1.0");
        assert_eq!(get_message_text(&msg(json!({"parts": false}))), "False");
    }

    #[test]
    fn test_role_text_skips_hidden_and_other_role() {
        let messages = vec![
            Message::new(Role::User, "primer"),
            Message::new(Role::Model, "resposta"),
            Message::new(Role::User, "amagat").with_visible(false),
            Message::new(Role::User, "segon"),
        ];
        assert_eq!(
            role_text(&messages, Role::User, is_conversation_message),
            "primer\nsegon"
        );
    }
}
