// ============================================================
// Layer 4 — Sequence Chunker
// ============================================================
// Splits a long token sequence into overlapping windows no
// longer than the model's position table.
//
// Example with window=5, overlap=2 (stride 3):
//   tokens:  A B C D E F G H
//   chunk 1: A B C D E
//   chunk 2: D E F G H
//
// Reference: Rust Book §8 (Slices)

pub struct Chunker {
    /// Maximum number of tokens per window
    window: usize,
    /// Number of tokens shared between adjacent windows
    overlap: usize,
}

impl Chunker {
    /// # Panics
    /// Panics if `overlap >= window` (the stride would be zero).
    pub fn new(window: usize, overlap: usize) -> Self {
        assert!(
            overlap < window,
            "overlap ({}) must be less than window ({})",
            overlap,
            window
        );
        Self { window, overlap }
    }

    fn stride(&self) -> usize {
        self.window - self.overlap
    }

    /// Split `items` into overlapping windows; the last window may be shorter.
    pub fn chunk<T: Clone>(&self, items: &[T]) -> Vec<Vec<T>> {
        let mut chunks = Vec::new();
        let mut start  = 0usize;

        while start < items.len() {
            let end = (start + self.window).min(items.len());
            chunks.push(items[start..end].to_vec());
            if end == items.len() {
                break;
            }
            start += self.stride();
        }

        chunks
    }

    /// Number of windows `chunk` produces for `len` items
    pub fn num_chunks(&self, len: usize) -> usize {
        if len <= self.window {
            return usize::from(len > 0);
        }
        1 + (len - self.window).div_ceil(self.stride())
    }
}
