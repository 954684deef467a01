// ============================================================
// Layer 2 — Infill Use Case
// ============================================================
// Continuation filling with a trained checkpoint:
//   1. Clean and encode the user's text with the saved tokenizer
//   2. Keep the last max_seq_len tokens (the position table size)
//   3. Hide the last N of them
//   4. Let the generator fill the hidden tokens
//   5. Decode the visible context and the generated words

use anyhow::{bail, Result};
use rand::{rngs::StdRng, SeedableRng};
use tokenizers::Tokenizer;

use crate::data::{
    masker::{MaskStrategy, Masker},
    preprocessor::Preprocessor,
    vocab::{decode, encode},
};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::inferencer::Inferencer;

/// What the generator produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Infill {
    /// Visible words the generator conditioned on
    pub context:    String,
    /// Words it generated for the hidden positions
    pub completion: String,
}

pub struct InfillUseCase {
    tokenizer:  Tokenizer,
    inferencer: Inferencer,
}

impl InfillUseCase {
    pub fn new(checkpoint_dir: &str) -> Result<Self> {
        let tokenizer  = TokenizerStore::new(checkpoint_dir).load()?;
        let ckpt       = CheckpointManager::new(checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt, tokenizer.get_vocab_size(false))?;
        Ok(Self { tokenizer, inferencer })
    }

    /// Replace the last `hide_last` words of `text` with generated ones.
    pub fn infill(&mut self, text: &str, hide_last: usize) -> Result<Infill> {
        let tokens = prepare_tokens(&self.tokenizer, text, self.inferencer.max_seq_len())?;
        if tokens.is_empty() {
            bail!("Nothing to fill: the text contains no words");
        }

        let masker  = Masker::new(MaskStrategy::End { n_tokens: hide_last });
        let mut rng = StdRng::seed_from_u64(0);
        let Some(sample) = masker.mask(&tokens, &mut rng) else {
            bail!("Nothing to fill: the text contains no words");
        };

        let filled  = self.inferencer.fill(&sample)?;
        let visible = sample.len() - sample.hidden_count();
        tracing::debug!("Filling {} of {} positions", sample.hidden_count(), sample.len());

        Ok(Infill {
            context:    decode(&self.tokenizer, &filled[..visible])?,
            completion: decode(&self.tokenizer, &filled[visible..])?,
        })
    }
}

/// Cleaned, encoded text truncated to its last `max_len` tokens
fn prepare_tokens(tokenizer: &Tokenizer, text: &str, max_len: usize) -> Result<Vec<u32>> {
    let ids   = encode(tokenizer, &Preprocessor::new().clean(text))?;
    let start = ids.len().saturating_sub(max_len);
    Ok(ids[start..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer(corpus: &str) -> (tempfile::TempDir, Tokenizer) {
        let dir = tempfile::tempdir().unwrap();
        let tok = TokenizerStore::new(dir.path()).load_or_build(&[corpus.to_string()], 50).unwrap();
        (dir, tok)
    }

    #[test]
    fn test_prepare_keeps_the_tail_of_long_text() {
        let (_dir, tok) = tokenizer("one two three four five");
        let ids = prepare_tokens(&tok, "One two  THREE four five", 3).unwrap();
        assert_eq!(decode(&tok, &ids).unwrap(), "three four five");
    }

    #[test]
    fn test_prepare_of_blank_text_is_empty() {
        let (_dir, tok) = tokenizer("word");
        assert!(prepare_tokens(&tok, "   \n ", 8).unwrap().is_empty());
    }
}
