// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the trainer and its collaborators.
//
// The rollout phases only ever see these traits, never the
// concrete CSV file or directory walker behind them:
//   - TextLoader implements DocumentSource
//   - CsvMetricSink and MemorySink implement MetricSink
//
// Traits that carry burn tensor types (the model adapter and
// the parameter store) live next to their burn code in the
// ml and infra layers so this layer stays framework free.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Object Oriented Patterns)

use anyhow::Result;
use crate::domain::document::Document;
use crate::domain::metric::Metric;

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Any component that can load raw training text.
///
/// Implementations:
///   - TextLoader → loads every .txt file in a directory
pub trait DocumentSource {
    /// Load all available documents from this source.
    fn load_all(&self) -> Result<Vec<Document>>;
}

// ─── MetricSink ───────────────────────────────────────────────────────────────
/// Receives named scalar observations from the training phases.
///
/// Logging never fails from the trainer's point of view:
/// a sink that cannot write reports the problem itself and
/// lets training continue.
///
/// Implementations:
///   - CsvMetricSink → appends rows to metrics.csv
///   - MemorySink    → keeps metrics in a Vec (tests, summaries)
pub trait MetricSink {
    /// Record `value` for metric `name` at trainer step `step`.
    fn log(&mut self, name: &str, step: usize, value: f64);
}

// ─── MemorySink ───────────────────────────────────────────────────────────────
/// Keeps every observation in memory, in emission order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    metrics: Vec<Metric>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Latest value logged under `name`, if any
    pub fn last(&self, name: &str) -> Option<f64> {
        self.metrics.iter().rev().find(|m| m.name == name).map(|m| m.value)
    }
}

impl MetricSink for MemorySink {
    fn log(&mut self, name: &str, step: usize, value: f64) {
        self.metrics.push(Metric::new(name, step, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order_and_last_value() {
        let mut sink = MemorySink::new();
        sink.log("discriminator", 0, 1.0);
        sink.log("discriminator", 1, 0.5);
        sink.log("critic/loss", 1, 2.0);

        assert_eq!(sink.metrics().len(), 3);
        assert_eq!(sink.metrics()[0], Metric::new("discriminator", 0, 1.0));
        assert_eq!(sink.last("discriminator"), Some(0.5));
        assert_eq!(sink.last("generator/advantage"), None);
    }
}
