//! Built-in metric registry for discovery and documentation.
//!
//! The table below is the single source of the built-in metric names, their
//! registration order and their implementations.

use super::engine::{Metric, MetricContext, MetricEngine};
use super::{dialogue, divergence, lexical, readability};
use crate::error::Result;
use crate::types::{Message, MetricValue};
use std::fmt;

/// Type of metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricValueType {
    Integer,
    Float,
}

impl MetricValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricValueType::Integer => "integer",
            MetricValueType::Float => "float",
        }
    }
}

/// Uniform signature of a built-in metric function.
pub type MetricFn = fn(&[Message], &MetricContext<'_>) -> Result<MetricValue>;

/// Descriptor for a built-in metric.
#[derive(Clone, Copy)]
pub struct MetricDescriptor {
    pub name: &'static str,
    pub value_type: MetricValueType,
    pub summary: &'static str,
    pub description: &'static str,
    pub compute: MetricFn,
}

impl fmt::Debug for MetricDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricDescriptor")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

impl Metric for MetricDescriptor {
    fn name(&self) -> &str {
        self.name
    }

    fn value_type(&self) -> MetricValueType {
        self.value_type
    }

    fn compute(&self, messages: &[Message], ctx: &MetricContext<'_>) -> Result<MetricValue> {
        (self.compute)(messages, ctx)
    }
}

const BUILTIN_METRICS: &[MetricDescriptor] = &[
    MetricDescriptor {
        name: "num_turns",
        value_type: MetricValueType::Integer,
        summary: "In-scope messages in the conversation.",
        description: "Count of messages that are both visible and part of the dialogue.",
        compute: dialogue::num_turns,
    },
    MetricDescriptor {
        name: "num_student_messages",
        value_type: MetricValueType::Integer,
        summary: "In-scope student messages.",
        description: "Count of in-scope messages with role user.",
        compute: dialogue::num_student_messages,
    },
    MetricDescriptor {
        name: "num_ai_messages",
        value_type: MetricValueType::Integer,
        summary: "In-scope AI messages.",
        description: "Count of in-scope messages with role model.",
        compute: dialogue::num_ai_messages,
    },
    MetricDescriptor {
        name: "avg_tokens_student",
        value_type: MetricValueType::Float,
        summary: "Mean whitespace tokens per student message.",
        description: "Mean token count over in-scope user messages; 0.0 when there are none. Rounded to 2 decimals.",
        compute: dialogue::avg_tokens_student,
    },
    MetricDescriptor {
        name: "avg_tokens_ai",
        value_type: MetricValueType::Float,
        summary: "Mean whitespace tokens per AI message.",
        description: "Mean token count over in-scope model messages; 0.0 when there are none. Rounded to 2 decimals.",
        compute: dialogue::avg_tokens_ai,
    },
    MetricDescriptor {
        name: "num_ai_questions",
        value_type: MetricValueType::Integer,
        summary: "AI messages that read as questions.",
        description: "In-scope model messages flagged by the Catalan question heuristic.",
        compute: dialogue::num_ai_questions,
    },
    MetricDescriptor {
        name: "exploration_ratio_ai",
        value_type: MetricValueType::Float,
        summary: "Percentage of AI messages that are questions.",
        description: "100 * num_ai_questions / num_ai_messages; 0.0 without AI messages. Rounded to 2 decimals.",
        compute: dialogue::exploration_ratio_ai,
    },
    MetricDescriptor {
        name: "semantic_divergence",
        value_type: MetricValueType::Float,
        summary: "Mean embedding distance between prompts and replies.",
        description: "Mean cosine distance over adjacent in-scope (user, model) pairs with non-empty text; 0.0 without pairs. Rounded to 4 decimals. Needs an embedding provider.",
        compute: divergence::semantic_divergence,
    },
    MetricDescriptor {
        name: "lexical_diversity_mtld",
        value_type: MetricValueType::Float,
        summary: "MTLD lexical diversity of the AI text.",
        description: "MTLD (threshold 0.72) over the word tokens of all in-scope model text; 0.0 under 10 tokens. Rounded to 2 decimals.",
        compute: lexical::lexical_diversity_mtld,
    },
    MetricDescriptor {
        name: "readability_ifsz_student",
        value_type: MetricValueType::Float,
        summary: "Flesch-Szigriszt readability of the student text.",
        description: "206.835 - 62.3 * syllables/word - words/sentence over in-scope user text; 0.0 without words. Rounded to 2 decimals.",
        compute: readability::readability_ifsz_student,
    },
    MetricDescriptor {
        name: "technical_knowledge_student",
        value_type: MetricValueType::Float,
        summary: "Technical vocabulary share in the student text.",
        description: "Percentage of cleaned user tokens found in the technical lexicon. Rounded to 2 decimals.",
        compute: lexical::technical_knowledge_student,
    },
    MetricDescriptor {
        name: "specificity_depth_student",
        value_type: MetricValueType::Float,
        summary: "Concrete design vocabulary share in the student text.",
        description: "Percentage of cleaned user tokens found in the specific-terms lexicon. Rounded to 2 decimals.",
        compute: lexical::specificity_depth_student,
    },
    MetricDescriptor {
        name: "readability_ifsz_ai",
        value_type: MetricValueType::Float,
        summary: "Flesch-Szigriszt readability of the AI text.",
        description: "206.835 - 62.3 * syllables/word - words/sentence over in-scope model text; 0.0 without words. Rounded to 2 decimals.",
        compute: readability::readability_ifsz_ai,
    },
    MetricDescriptor {
        name: "technical_knowledge_ai",
        value_type: MetricValueType::Float,
        summary: "Technical vocabulary share in the AI text.",
        description: "Percentage of cleaned model tokens found in the technical lexicon. Rounded to 2 decimals.",
        compute: lexical::technical_knowledge_ai,
    },
    MetricDescriptor {
        name: "specificity_depth_ai",
        value_type: MetricValueType::Float,
        summary: "Concrete design vocabulary share in the AI text.",
        description: "Percentage of cleaned model tokens found in the specific-terms lexicon. Rounded to 2 decimals.",
        compute: lexical::specificity_depth_ai,
    },
];

/// All built-in metric descriptors, in registration order.
pub fn list_metrics() -> &'static [MetricDescriptor] {
    BUILTIN_METRICS
}

/// Look up a built-in metric by name.
pub fn builtin(name: &str) -> Option<&'static MetricDescriptor> {
    BUILTIN_METRICS.iter().find(|m| m.name == name)
}

/// Create an engine with all built-in metrics registered.
///
/// ```rust,ignore
/// use criticat_core::metrics::create_default_engine;
///
/// let engine = create_default_engine();
/// println!("Registered metrics: {:?}", engine.metric_names());
/// ```
pub fn create_default_engine() -> MetricEngine {
    let mut engine = MetricEngine::new();
    for descriptor in BUILTIN_METRICS {
        engine.register(Box::new(*descriptor));
    }
    engine
}
