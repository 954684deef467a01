// ============================================================
// Layer 4 — Masked Batcher
// ============================================================
// Stacks MaskedSamples into the six tensors the rollout
// trainer consumes, in a fixed positional order:
//
//   (src_tokens, src_lengths, src_mask,
//    tgt_tokens, tgt_lengths, tgt_mask)
//
//   src_tokens  [batch, time]      Int   <mask> at hidden positions
//   src_lengths [batch]            Int   real tokens per row
//   src_mask    [batch, time]      Bool  true = visible
//   tgt_tokens  [batch, time + 1]  Int   <bos> + true tokens
//   tgt_lengths [batch]            Int   src length + 1 (<bos>)
//   tgt_mask    [batch, time]      Bool  same visibility as src_mask
//
// Rows shorter than the longest sample are padded with <pad>
// and marked visible; the lengths keep padding out of every
// loss the model computes.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::{backend::AutodiffBackend, TensorData},
};

use crate::data::masker::MaskedSample;
use crate::data::vocab::PAD_ID;
use crate::domain::error::TrainError;

// ─── Batch ────────────────────────────────────────────────────────────────────
/// One immutable training batch. Every phase of a trainer run
/// reads the same Batch and none of them modifies it.
#[derive(Debug, Clone)]
pub struct Batch<B: Backend> {
    pub src_tokens:  Tensor<B, 2, Int>,
    pub src_lengths: Tensor<B, 1, Int>,
    pub src_mask:    Tensor<B, 2, Bool>,
    pub tgt_tokens:  Tensor<B, 2, Int>,
    pub tgt_lengths: Tensor<B, 1, Int>,
    pub tgt_mask:    Tensor<B, 2, Bool>,
}

/// Positional form of a batch at external boundaries.
pub type BatchParts<B> = (
    Tensor<B, 2, Int>,
    Tensor<B, 1, Int>,
    Tensor<B, 2, Bool>,
    Tensor<B, 2, Int>,
    Tensor<B, 1, Int>,
    Tensor<B, 2, Bool>,
);

impl<B: Backend> Batch<B> {
    pub fn from_parts(parts: BatchParts<B>) -> Self {
        let (src_tokens, src_lengths, src_mask, tgt_tokens, tgt_lengths, tgt_mask) = parts;
        Self { src_tokens, src_lengths, src_mask, tgt_tokens, tgt_lengths, tgt_mask }
    }

    pub fn into_parts(self) -> BatchParts<B> {
        (
            self.src_tokens,
            self.src_lengths,
            self.src_mask,
            self.tgt_tokens,
            self.tgt_lengths,
            self.tgt_mask,
        )
    }

    pub fn batch_size(&self) -> usize {
        self.src_tokens.dims()[0]
    }

    pub fn seq_len(&self) -> usize {
        self.src_tokens.dims()[1]
    }

    pub fn device(&self) -> B::Device {
        self.src_tokens.device()
    }

    /// True sequence without the leading <bos>: `tgt_tokens[:, 1:]`
    pub fn target(&self) -> Tensor<B, 2, Int> {
        let [batch, time] = self.tgt_tokens.dims();
        self.tgt_tokens.clone().slice([0..batch, 1..time])
    }

    /// Check that the six tensors agree on batch size and time.
    pub fn validate(&self) -> Result<(), TrainError> {
        let [batch, time] = self.src_tokens.dims();
        let checks = [
            ("src_lengths", self.src_lengths.dims().to_vec(), vec![batch]),
            ("src_mask",    self.src_mask.dims().to_vec(),    vec![batch, time]),
            ("tgt_tokens",  self.tgt_tokens.dims().to_vec(),  vec![batch, time + 1]),
            ("tgt_lengths", self.tgt_lengths.dims().to_vec(), vec![batch]),
            ("tgt_mask",    self.tgt_mask.dims().to_vec(),    vec![batch, time]),
        ];
        for (name, got, expected) in checks {
            if got != expected {
                return Err(TrainError::ModelForward(format!(
                    "batch field {name} has shape {got:?}, expected {expected:?}"
                )));
            }
        }
        if batch == 0 || time == 0 {
            return Err(TrainError::ModelForward("empty batch".to_string()));
        }
        Ok(())
    }
}

impl<B: AutodiffBackend> Batch<B> {
    /// The same batch on the inner (non-autodiff) backend.
    pub fn inner(&self) -> Batch<B::InnerBackend> {
        Batch {
            src_tokens:  self.src_tokens.clone().inner(),
            src_lengths: self.src_lengths.clone().inner(),
            src_mask:    self.src_mask.clone().inner(),
            tgt_tokens:  self.tgt_tokens.clone().inner(),
            tgt_lengths: self.tgt_lengths.clone().inner(),
            tgt_mask:    self.tgt_mask.clone().inner(),
        }
    }
}

/// Int [batch, time] tensor from a row-major id list
pub fn int_tensor<B: Backend>(
    values: Vec<i64>,
    shape:  [usize; 2],
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    Tensor::from_data(TensorData::new(values, shape), device)
}

/// Bool [batch, time] tensor from a row-major flag list
pub fn bool_tensor<B: Backend>(
    values: &[bool],
    shape:  [usize; 2],
    device: &B::Device,
) -> Tensor<B, 2, Bool> {
    let ints = values.iter().map(|&v| i64::from(v)).collect();
    int_tensor::<B>(ints, shape, device).equal_elem(1)
}

// ─── MaskedBatcher ────────────────────────────────────────────────────────────
/// Stateless: Burn's DataLoader hands over the target device
/// with every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaskedBatcher;

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
// This is what makes MaskedBatcher work with Burn's DataLoader.
// The DataLoader calls .batch(items, device) with each mini-batch.
impl<B: Backend> Batcher<B, MaskedSample, Batch<B>> for MaskedBatcher {
    /// Pad and stack `items` into a Batch. `items` must not be empty.
    fn batch(&self, items: Vec<MaskedSample>, device: &B::Device) -> Batch<B> {
        let batch_size = items.len();
        let time       = items.iter().map(MaskedSample::len).max().unwrap_or(0);

        let mut src     = Vec::with_capacity(batch_size * time);
        let mut tgt     = Vec::with_capacity(batch_size * (time + 1));
        let mut visible = Vec::with_capacity(batch_size * time);
        let mut lengths = Vec::with_capacity(batch_size);

        for item in &items {
            let pad = time - item.len();
            src.extend(item.src.iter().map(|&t| t as i64));
            src.extend(std::iter::repeat(PAD_ID as i64).take(pad));
            tgt.extend(item.tgt.iter().map(|&t| t as i64));
            tgt.extend(std::iter::repeat(PAD_ID as i64).take(pad));
            visible.extend_from_slice(&item.visible);
            visible.extend(std::iter::repeat(true).take(pad));
            lengths.push(item.len() as i64);
        }

        let src_lengths = Tensor::<B, 1, Int>::from_data(
            TensorData::new(lengths.clone(), [batch_size]), device,
        );
        let tgt_lengths = Tensor::<B, 1, Int>::from_data(
            TensorData::new(lengths.iter().map(|l| l + 1).collect::<Vec<_>>(), [batch_size]),
            device,
        );
        let mask = bool_tensor::<B>(&visible, [batch_size, time], device);

        Batch::from_parts((
            int_tensor(src, [batch_size, time], device),
            src_lengths,
            mask.clone(),
            int_tensor(tgt, [batch_size, time + 1], device),
            tgt_lengths,
            mask,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocab::{BOS_ID, MASK_ID};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn ints<const D: usize>(t: Tensor<TestBackend, D, Int>) -> Vec<i64> {
        t.into_data().iter::<i64>().collect()
    }

    #[test]
    fn test_pads_to_longest_sample() {
        let items = vec![
            MaskedSample { src: vec![7, MASK_ID], tgt: vec![BOS_ID, 7, 8], visible: vec![true, false] },
            MaskedSample { src: vec![MASK_ID], tgt: vec![BOS_ID, 9], visible: vec![false] },
        ];
        let batch: Batch<TestBackend> = MaskedBatcher.batch(items, &Default::default());

        batch.validate().unwrap();
        assert_eq!(batch.batch_size(), 2);
        assert_eq!(batch.seq_len(), 2);
        assert_eq!(ints(batch.src_tokens.clone()), vec![7, 4, 4, 0]);
        assert_eq!(ints(batch.tgt_tokens.clone()), vec![2, 7, 8, 2, 9, 0]);
        assert_eq!(ints(batch.src_lengths.clone()), vec![2, 1]);
        assert_eq!(ints(batch.tgt_lengths.clone()), vec![3, 2]);
        assert_eq!(ints(batch.src_mask.clone().int()), vec![1, 0, 0, 1]);
        assert_eq!(ints(batch.target()), vec![7, 8, 9, 0]);
    }

    #[test]
    fn test_parts_keep_positional_order() {
        let items = vec![MaskedSample { src: vec![MASK_ID], tgt: vec![BOS_ID, 5], visible: vec![false] }];
        let batch: Batch<TestBackend> = MaskedBatcher.batch(items, &Default::default());

        let (src, src_len, _, tgt, tgt_len, _) = batch.into_parts();
        assert_eq!(src.dims(), [1, 1]);
        assert_eq!(tgt.dims(), [1, 2]);
        assert_eq!(ints(src_len), vec![1]);
        assert_eq!(ints(tgt_len), vec![2]);
    }

    #[test]
    fn test_validate_rejects_misaligned_target() {
        let device = Default::default();
        let batch  = Batch::<TestBackend>::from_parts((
            int_tensor(vec![1, 2], [1, 2], &device),
            Tensor::from_data(TensorData::new(vec![2i64], [1]), &device),
            bool_tensor(&[true, false], [1, 2], &device),
            int_tensor(vec![2, 1], [1, 2], &device),
            Tensor::from_data(TensorData::new(vec![3i64], [1]), &device),
            bool_tensor(&[true, false], [1, 2], &device),
        ));
        assert!(matches!(batch.validate(), Err(TrainError::ModelForward(_))));
    }
}
