// ============================================================
// Layer 4 — Span Masker
// ============================================================
// Turns a token sequence into one masked training sample:
//
//   tokens:  the film was really good
//   visible: T   T    T   F      F       (End { n_tokens: 2 })
//   src:     the film was <mask> <mask>
//   tgt:     <bos> the film was really good
//
// `visible = false` marks the positions the generator has to
// fill; the discriminator and critic are scored on them.
//
// Two strategies:
//   End  — hide the last n tokens (continuation filling)
//   Span — hide one random contiguous span covering `ratio`
//          of the sequence
//
// At least one position is always hidden and, for sequences
// longer than one token, at least one stays visible.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::vocab::{BOS_ID, MASK_ID};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaskStrategy {
    End { n_tokens: usize },
    Span { ratio: f64 },
}

/// One masked sequence, before batching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskedSample {
    /// Tokens with hidden positions replaced by <mask>
    pub src: Vec<u32>,
    /// <bos> followed by the true tokens (one longer than `src`)
    pub tgt: Vec<u32>,
    /// `true` where the true token is visible to the generator
    pub visible: Vec<bool>,
}

impl MaskedSample {
    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn hidden_count(&self) -> usize {
        self.visible.iter().filter(|v| !**v).count()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Masker {
    strategy: MaskStrategy,
}

impl Masker {
    pub fn new(strategy: MaskStrategy) -> Self {
        Self { strategy }
    }

    /// Mask `tokens`; empty sequences produce no sample.
    pub fn mask<R: Rng + ?Sized>(&self, tokens: &[u32], rng: &mut R) -> Option<MaskedSample> {
        let len = tokens.len();
        if len == 0 {
            return None;
        }
        // keep one visible token whenever there is more than one
        let max_hidden = if len > 1 { len - 1 } else { 1 };

        let hidden = match self.strategy {
            MaskStrategy::End { n_tokens } => {
                let n = n_tokens.clamp(1, max_hidden);
                (len - n)..len
            }
            MaskStrategy::Span { ratio } => {
                let n     = ((len as f64 * ratio).round() as usize).clamp(1, max_hidden);
                let start = rng.gen_range(0..=len - n);
                start..start + n
            }
        };

        let visible: Vec<bool> = (0..len).map(|i| !hidden.contains(&i)).collect();
        let src = tokens
            .iter()
            .zip(&visible)
            .map(|(&t, &v)| if v { t } else { MASK_ID })
            .collect();
        let tgt = std::iter::once(BOS_ID).chain(tokens.iter().copied()).collect();

        Some(MaskedSample { src, tgt, visible })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_end_strategy_hides_the_tail() {
        let mut rng = StdRng::seed_from_u64(0);
        let sample  = Masker::new(MaskStrategy::End { n_tokens: 2 })
            .mask(&[10, 11, 12, 13, 14], &mut rng)
            .unwrap();

        assert_eq!(sample.src,     vec![10, 11, 12, MASK_ID, MASK_ID]);
        assert_eq!(sample.tgt,     vec![BOS_ID, 10, 11, 12, 13, 14]);
        assert_eq!(sample.visible, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_end_strategy_keeps_one_visible_token() {
        let mut rng = StdRng::seed_from_u64(0);
        let sample  = Masker::new(MaskStrategy::End { n_tokens: 10 })
            .mask(&[10, 11, 12], &mut rng)
            .unwrap();
        assert_eq!(sample.visible, vec![true, false, false]);
    }

    #[test]
    fn test_span_strategy_hides_one_contiguous_span() {
        let mut rng = StdRng::seed_from_u64(7);
        let masker  = Masker::new(MaskStrategy::Span { ratio: 0.4 });
        for _ in 0..20 {
            let sample = masker.mask(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], &mut rng).unwrap();
            assert_eq!(sample.hidden_count(), 4);

            let first = sample.visible.iter().position(|v| !v).unwrap();
            assert!(sample.visible[first..first + 4].iter().all(|v| !v));
        }
    }

    #[test]
    fn test_single_token_is_hidden_and_empty_is_skipped() {
        let mut rng = StdRng::seed_from_u64(0);
        let masker  = Masker::new(MaskStrategy::Span { ratio: 0.0 });
        assert_eq!(masker.mask(&[42], &mut rng).unwrap().src, vec![MASK_ID]);
        assert!(masker.mask(&[], &mut rng).is_none());
    }
}
