// ============================================================
// Layer 4 — Token Ids
// ============================================================
// Fixed ids of the special tokens every tokenizer built by
// TokenizerStore starts with, plus the two conversions the
// pipeline needs on top of tokenizers::Tokenizer.
//
//   0 <pad>   padding beyond a sequence's length
//   1 <unk>   out-of-vocabulary word
//   2 <bos>   first token of every target sequence
//   3 <eos>   reserved end marker
//   4 <mask>  hidden position the generator must fill
//
// Reference: HuggingFace tokenizers (WordLevel model)

use anyhow::{anyhow, Result};
use tokenizers::Tokenizer;

pub const PAD_ID:  u32 = 0;
pub const UNK_ID:  u32 = 1;
pub const BOS_ID:  u32 = 2;
pub const MASK_ID: u32 = 4;

/// Special tokens in id order
pub const SPECIAL_TOKENS: [&str; 5] = ["<pad>", "<unk>", "<bos>", "<eos>", "<mask>"];

/// Token ids of already cleaned `text`
pub fn encode(tokenizer: &Tokenizer, text: &str) -> Result<Vec<u32>> {
    let encoding = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow!("Cannot encode text: {e}"))?;
    Ok(encoding.get_ids().to_vec())
}

/// Space-joined words of `ids`; padding and <bos> are dropped,
/// <mask> and <unk> are kept so gaps stay visible.
pub fn decode(tokenizer: &Tokenizer, ids: &[u32]) -> Result<String> {
    let ids: Vec<u32> = ids
        .iter()
        .copied()
        .filter(|&id| !matches!(id, PAD_ID | BOS_ID))
        .collect();
    tokenizer
        .decode(&ids, false)
        .map_err(|e| anyhow!("Cannot decode ids {ids:?}: {e}"))
}
