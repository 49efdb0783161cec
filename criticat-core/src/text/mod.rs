//! Text analysis utilities
//!
//! Everything the metric functions need to look inside a message:
//!
//! - [`message`]: the in-scope filter and text extraction
//! - [`tokens`]: whitespace tokens, Catalan syllables, word tokens, rounding
//! - [`question`]: the Catalan question heuristic
//! - [`lexicon`]: design/technology vocabularies
//! - [`segment`]: sentence and word segmentation
//! - [`embedding`]: embedding providers and cosine distance
//! - [`mtld`]: MTLD lexical diversity
//! - [`services`]: the [`TextServices`] bundle handed to metrics

pub mod embedding;
pub mod lexicon;
pub mod message;
pub mod mtld;
pub mod question;
pub mod segment;
pub mod services;
pub mod tokens;

pub use embedding::{cosine_distance, EmbeddingProvider, HashingEmbedder, OllamaEmbedder};
pub use message::{get_message_text, is_conversation_message, MessageFilter};
pub use question::{is_question_like_ca, is_question_message_ca};
pub use segment::{CatalanSegmenter, Segmenter};
pub use services::TextServices;
pub use tokens::{count_syllables_ca, count_tokens, round_value};
