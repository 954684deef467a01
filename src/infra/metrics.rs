// ============================================================
// Layer 6 — CSV Metric Sink
// ============================================================
// Appends every phase metric to a CSV file as it is emitted.
//
// Output file: <checkpoint_dir>/metrics.csv
//
// Example CSV output:
//   name,step,value
//   discriminator/real,0,0.693147
//   discriminator/fake,0,0.701220
//   discriminator,0,0.697184
//   generator/advantage,0,-0.012044
//   generator/reward/token,0,-34.551002
//   critic/loss,0,0.482113
//
// How to read the metrics:
//   - discriminator near ln 2 ≈ 0.693 → it cannot tell real
//     from generated any more
//   - generator/reward/token is a SUM over rollouts, so it
//     scales with num_rollouts
//   - critic/loss should fall as the baseline learns the reward
//
// A failed write never stops training: it is reported with
// tracing::warn! and the row is dropped.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use std::{
    collections::HashMap,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::traits::MetricSink;

pub struct CsvMetricSink {
    /// Full path to the CSV file
    csv_path: PathBuf,
    /// Most recent value per metric name, for console summaries
    latest:   HashMap<String, f64>,
}

impl CsvMetricSink {
    /// Writes the CSV header if the file doesn't exist yet, so
    /// resumed runs keep appending to the same log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "name,step,value")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path, latest: HashMap::new() })
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }

    /// Latest value logged under `name` by this sink
    pub fn last(&self, name: &str) -> Option<f64> {
        self.latest.get(name).copied()
    }

    fn append(&self, name: &str, step: usize, value: f64) -> std::io::Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(f, "{name},{step},{value:.6}")
    }
}

impl MetricSink for CsvMetricSink {
    fn log(&mut self, name: &str, step: usize, value: f64) {
        tracing::debug!(metric = name, step, value, "metric");
        self.latest.insert(name.to_string(), value);
        if let Err(e) = self.append(name, step, value) {
            tracing::warn!(
                "Dropping metric {} at step {}: cannot write '{}': {}",
                name, step, self.csv_path.display(), e
            );
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_follow_header() {
        let dir      = tempfile::tempdir().unwrap();
        let mut sink = CsvMetricSink::new(dir.path()).unwrap();

        sink.log("discriminator", 0, 0.5);
        sink.log("critic/loss", 3, 1.25);

        let csv = fs::read_to_string(sink.csv_path()).unwrap();
        assert_eq!(csv, "name,step,value\ndiscriminator,0,0.500000\ncritic/loss,3,1.250000\n");
        assert_eq!(sink.last("critic/loss"), Some(1.25));
    }

    #[test]
    fn test_reopening_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        CsvMetricSink::new(dir.path()).unwrap().log("discriminator", 0, 1.0);
        CsvMetricSink::new(dir.path()).unwrap().log("discriminator", 1, 2.0);

        let csv = fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_write_failure_does_not_panic() {
        let dir      = tempfile::tempdir().unwrap();
        let mut sink = CsvMetricSink::new(dir.path()).unwrap();
        fs::remove_file(sink.csv_path()).unwrap();
        fs::create_dir(sink.csv_path()).unwrap();

        sink.log("discriminator", 0, 1.0);
    }
}
