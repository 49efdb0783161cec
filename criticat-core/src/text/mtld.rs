//! Measure of Textual Lexical Diversity (McCarthy & Jarvis, 2010).
//!
//! The text is walked token by token while tracking the type-token ratio of
//! the current segment; each time it drops to the threshold a full factor
//! is counted and the segment restarts. The leftover segment adds a partial
//! factor. MTLD is tokens / factors, averaged over a forward and a backward
//! pass.

use std::collections::HashSet;

/// Type-token ratio at which a factor is closed.
pub const MTLD_THRESHOLD: f64 = 0.72;

/// MTLD of an already tokenised text; 0.0 for an empty slice.
pub fn mtld(tokens: &[String]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let forward = mtld_pass(tokens.iter());
    let backward = mtld_pass(tokens.iter().rev());
    (forward + backward) / 2.0
}

fn mtld_pass<'a>(tokens: impl Iterator<Item = &'a String>) -> f64 {
    let mut factors = 0.0;
    let mut total = 0usize;
    let mut types: HashSet<&str> = HashSet::new();
    let mut count = 0usize;

    for token in tokens {
        total += 1;
        count += 1;
        types.insert(token.as_str());
        let ttr = types.len() as f64 / count as f64;
        if ttr <= MTLD_THRESHOLD {
            factors += 1.0;
            types.clear();
            count = 0;
        }
    }

    if count > 0 {
        let ttr = types.len() as f64 / count as f64;
        factors += (1.0 - ttr) / (1.0 - MTLD_THRESHOLD);
    }

    if factors == 0.0 {
        // every token distinct: diversity is bounded only by length
        total as f64
    } else {
        total as f64 / factors
    }
}
