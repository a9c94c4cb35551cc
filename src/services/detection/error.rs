// Detection errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    /// Aggregation guard: the weights sum to zero (or are not finite), no mean exists.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),
    /// A heuristic table that cannot produce meaningful scores (non-positive weight, empty keyword, ...).
    #[error("Invalid heuristic configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid heuristic pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A sentence that could not be found in the original text from the cursor onward.
/// Non-fatal: the sentence is left out of the sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizationMiss {
    pub sentence_index: usize,
    pub sentence: String,
    pub cursor: usize,
}
