// ============================================================
// Layer 4 — Masked Dataset
// ============================================================
// Wraps the masked training sequences in Burn's Dataset trait
// so the DataLoader can shuffle and batch them.
//
// Reference: Burn Book §4 (Datasets)

use burn::data::dataset::Dataset;

use crate::data::masker::MaskedSample;

/// All masked training sequences of a run.
pub struct MaskedDataset {
    samples: Vec<MaskedSample>,
}

impl MaskedDataset {
    pub fn new(samples: Vec<MaskedSample>) -> Self {
        Self { samples }
    }
}

impl Dataset<MaskedSample> for MaskedDataset {
    fn get(&self, index: usize) -> Option<MaskedSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(token: u32) -> MaskedSample {
        MaskedSample { src: vec![token], tgt: vec![2, token], visible: vec![false] }
    }

    #[test]
    fn test_samples_are_indexed_in_order() {
        let dataset = MaskedDataset::new((10..13).map(sample).collect());
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.get(1), Some(sample(11)));
        assert_eq!(dataset.get(3), None);
    }
}
