//! Candidate sources - one full implementation of the sort contract.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The deliberately slow starting point of every fresh run.
///
/// A candidate is a Rust module exposing
/// `pub fn solve(input: Vec<i32>) -> Vec<i32>`.
pub const ORIGIN_SOURCE: &str = r#"pub fn solve(input: Vec<i32>) -> Vec<i32> {
    let mut arr = input;
    let n = arr.len();
    if n < 2 {
        return arr;
    }
    for i in 0..n - 1 {
        for j in 0..n - i - 1 {
            if arr[j] > arr[j + 1] {
                arr.swap(j, j + 1);
            }
        }
    }
    arr
}
"#;

/// Immutable candidate text, tagged with the generation that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSource {
    /// Generation index (0 for the initial source)
    generation: u32,

    /// Source text
    text: Arc<str>,
}

impl CandidateSource {
    /// Create a candidate for the given generation.
    pub fn new(generation: u32, text: impl Into<Arc<str>>) -> Self {
        Self {
            generation,
            text: text.into(),
        }
    }

    /// The initial source of a run (generation 0).
    pub fn initial(text: impl Into<Arc<str>>) -> Self {
        Self::new(0, text)
    }

    /// The origin bubble sort.
    pub fn origin() -> Self {
        Self::initial(ORIGIN_SOURCE)
    }

    /// Generation that produced this candidate.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Source text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
