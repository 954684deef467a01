// ============================================================
// Layer 3 — Document Domain Type
// ============================================================
// A plain text document read from the corpus directory.
// Only the file name and its raw text — cleaning, chunking
// and tokenisation all happen later in the data layer.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// A raw text document loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// File name the text came from, kept for log messages
    pub source: String,

    /// Full file contents before cleaning
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text:   text.into(),
        }
    }

    /// Number of whitespace separated words in the raw text
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}
