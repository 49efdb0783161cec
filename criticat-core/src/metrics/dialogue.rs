//! Turn counts, message lengths and AI question rate.

use super::engine::MetricContext;
use crate::error::Result;
use crate::text::message::{get_message_text, messages_for_role};
use crate::text::{count_tokens, is_question_message_ca, round_value};
use crate::types::{Message, MetricValue, Role};

pub fn num_turns(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    let n = messages.iter().filter(|m| ctx.in_scope(m)).count();
    Ok(n.into())
}

pub fn num_student_messages(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    Ok(messages_for_role(messages, Role::User, ctx.filter).count().into())
}

pub fn num_ai_messages(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    Ok(messages_for_role(messages, Role::Model, ctx.filter).count().into())
}

fn avg_tokens_for_role(messages: &[Message], role: Role, ctx: &MetricContext<'_>) -> f64 {
    let counts: Vec<usize> = messages_for_role(messages, role, ctx.filter)
        .map(|m| count_tokens(&get_message_text(m)))
        .collect();

    if counts.is_empty() {
        return 0.0;
    }
    counts.iter().sum::<usize>() as f64 / counts.len() as f64
}

pub fn avg_tokens_student(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    Ok(round_value(avg_tokens_for_role(messages, Role::User, ctx), 2).into())
}

pub fn avg_tokens_ai(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    Ok(round_value(avg_tokens_for_role(messages, Role::Model, ctx), 2).into())
}

fn count_ai_questions(messages: &[Message], ctx: &MetricContext<'_>) -> usize {
    messages_for_role(messages, Role::Model, ctx.filter)
        .filter(|m| is_question_message_ca(m))
        .count()
}

pub fn num_ai_questions(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    Ok(count_ai_questions(messages, ctx).into())
}

/// Percentage (0-100) of AI messages that are questions.
pub fn exploration_ratio_ai(messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
    let n_ai = messages_for_role(messages, Role::Model, ctx.filter).count();
    if n_ai == 0 {
        return Ok(MetricValue::Float(0.0));
    }
    let ratio = count_ai_questions(messages, ctx) as f64 / n_ai as f64 * 100.0;
    Ok(round_value(ratio, 2).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TextServices;

    fn run(f: crate::metrics::registry::MetricFn, messages: &[Message]) -> MetricValue {
        let services = TextServices::without_embedder();
        f(messages, &MetricContext::new(&services)).unwrap()
    }

    fn sample() -> Vec<Message> {
        vec![
            Message::new(Role::User, "hola món"),
            Message::new(Role::Model, "Hola! Què vols millorar del cartell?"),
            Message::new(Role::User, "a"),
            Message::new(Role::Model, "Prova un fons més fosc."),
            Message::new(Role::Model, "contingut intern").with_visible(false),
            Message::new(Role::User, "nota").with_conversation(false),
        ]
    }

    #[test]
    fn test_counts_respect_scope() {
        let messages = sample();
        assert_eq!(run(num_turns, &messages), MetricValue::Count(4));
        assert_eq!(run(num_student_messages, &messages), MetricValue::Count(2));
        assert_eq!(run(num_ai_messages, &messages), MetricValue::Count(2));
    }

    #[test]
    fn test_unknown_roles_count_as_turns_only() {
        let mut system = Message::new(Role::User, "instruccions");
        system.role = "system".into();
        let messages = vec![system];
        assert_eq!(run(num_turns, &messages), MetricValue::Count(1));
        assert_eq!(run(num_student_messages, &messages), MetricValue::Count(0));
        assert_eq!(run(num_ai_messages, &messages), MetricValue::Count(0));
    }

    #[test]
    fn test_avg_tokens_student() {
        let messages = sample();
        assert_eq!(run(avg_tokens_student, &messages), MetricValue::Float(1.5));
    }

    #[test]
    fn test_avg_tokens_ai_rounded() {
        let messages = vec![
            Message::new(Role::Model, "un dos"),
            Message::new(Role::Model, "un dos tres"),
            Message::new(Role::Model, "un dos"),
        ];
        // 7 / 3 = 2.333...
        assert_eq!(run(avg_tokens_ai, &messages), MetricValue::Float(2.33));
    }

    #[test]
    fn test_empty_conversation() {
        assert_eq!(run(num_turns, &[]), MetricValue::Count(0));
        assert_eq!(run(avg_tokens_student, &[]), MetricValue::Float(0.0));
        assert_eq!(run(avg_tokens_ai, &[]), MetricValue::Float(0.0));
    }

    #[test]
    fn test_questions_and_exploration() {
        let messages = sample();
        assert_eq!(run(num_ai_questions, &messages), MetricValue::Count(1));
        assert_eq!(run(exploration_ratio_ai, &messages), MetricValue::Float(50.0));
    }

    #[test]
    fn test_no_ai_messages() {
        let messages = vec![Message::new(Role::User, "Què en penses?")];
        assert_eq!(run(num_ai_questions, &messages), MetricValue::Count(0));
        assert_eq!(run(exploration_ratio_ai, &messages), MetricValue::Float(0.0));
    }

    #[test]
    fn test_exploration_ratio_rounding() {
        let messages = vec![
            Message::new(Role::Model, "Com ho veus?"),
            Message::new(Role::Model, "D'acord."),
            Message::new(Role::Model, "Entesos."),
        ];
        assert_eq!(run(exploration_ratio_ai, &messages), MetricValue::Float(33.33));
    }
}
