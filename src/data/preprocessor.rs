// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises raw corpus text before whitespace tokenisation.
//
// The vocabulary is word level, so every stray character that
// survives cleaning becomes (part of) a vocabulary entry.
// Cleaning keeps the vocabulary small and the ids stable:
//
//   1. Tabs, non-breaking and zero-width spaces → plain space
//   2. \r → \n, other control characters → space
//   3. Lowercase everything
//   4. Collapse runs of spaces, trim every line
//   5. Allow at most one blank line between paragraphs
//
// Reference: Rust Book §8 (Strings in Rust)
//            Rust Book §13 (Iterators)

/// Stateless text normaliser applied to every corpus document.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw text string for downstream tokenisation.
    pub fn clean(&self, text: &str) -> String {
        let normalised: String = text
            .to_lowercase()
            .chars()
            .map(normalise_char)
            .collect();

        let mut result      = String::with_capacity(normalised.len());
        let mut blank_lines = 0usize;

        for line in normalised.lines() {
            let line = line.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ");

            if line.is_empty() {
                blank_lines += 1;
                // a single blank line separates paragraphs, more is noise
                if blank_lines > 1 || result.is_empty() {
                    continue;
                }
            } else {
                blank_lines = 0;
            }

            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str(&line);
        }

        result.trim().to_string()
    }

    /// Clean `text` and split it into whitespace separated words.
    pub fn words(&self, text: &str) -> Vec<String> {
        self.clean(text).split_whitespace().map(str::to_string).collect()
    }
}

fn normalise_char(c: char) -> char {
    match c {
        '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
        '\r' => '\n',
        c if c.is_control() && c != '\n' => ' ',
        c => c,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("hello   world"), "hello world");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  hello world  "), "hello world");
    }

    #[test]
    fn test_lowercases_for_word_vocabulary() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("The Movie WAS\tgreat"), "the movie was great");
    }

    #[test]
    fn test_removes_control_chars() {
        let p = Preprocessor::new();
        // \x01 is a control character that should become a space
        assert_eq!(p.clean("hello\x01world"), "hello world");
    }

    #[test]
    fn test_collapses_blank_lines() {
        let p = Preprocessor::new();
        let input  = "line1\n\n\n\n\nline2";
        let output = p.clean(input);
        // Should have at most 2 newlines between lines
        assert!(!output.contains("\n\n\n"));
    }

    #[test]
    fn test_words_splits_clean_text() {
        let p = Preprocessor::new();
        assert_eq!(p.words(" A  b\n\nc "), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(""), "");
    }
}
