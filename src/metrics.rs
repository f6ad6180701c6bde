//! Metrics collection and reporting for split runs.
//!
//! [`MetricsCollector`] is a [`SplitObserver`]: attach a clone to the engine,
//! keep the other handle, and read the numbers back after the run. Clones
//! share the same storage, so one collector can follow several splits and
//! report their totals.
//!
//! # Overview
//!
//! - Counters: `files_written`, `rows_written`, `bytes_written`, `splits_completed`
//! - Gauges: `largest_file_bytes`, `execution_time_ms`
//! - Output as JSON ([`MetricsCollector::to_json`], [`MetricsCollector::save_to_file`])
//!   or as a human-readable block ([`MetricsCollector::print`])
//!
//! # Example
//!
//! ```no_run
//! use datashear::metrics::MetricsCollector;
//! use datashear::Splitter;
//!
//! # fn main() -> anyhow::Result<()> {
//! let metrics = MetricsCollector::new();
//! Splitter::new("orders.csv", "out")?
//!     .with_observer(metrics.clone())
//!     .by_rows(10_000, true)?;
//!
//! metrics.print();
//! metrics.save_to_file("metrics.json")?;
//! # Ok(())
//! # }
//! ```

use crate::engine::{OutputFile, SplitSummary};
use crate::observer::SplitObserver;
use crate::policy::SplitPolicy;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const FILES_WRITTEN: &str = "files_written";
pub const ROWS_WRITTEN: &str = "rows_written";
pub const BYTES_WRITTEN: &str = "bytes_written";
pub const SPLITS_COMPLETED: &str = "splits_completed";
pub const LARGEST_FILE_BYTES: &str = "largest_file_bytes";

/// Shared, cloneable metrics store.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsCollectorInner>>,
}

#[derive(Default)]
struct MetricsCollectorInner {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, f64>,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MetricsCollectorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn increment_counter(&self, name: &str, by: u64) {
        *self.lock().counters.entry(name.to_string()).or_default() += by;
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        self.lock().counters.get(name).copied().unwrap_or(0)
    }

    /// Raise a gauge to `value` if it is currently lower (or unset).
    pub fn max_gauge(&self, name: &str, value: f64) {
        let mut inner = self.lock();
        let slot = inner.gauges.entry(name.to_string()).or_insert(value);
        if *slot < value {
            *slot = value;
        }
    }

    #[must_use]
    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.lock().gauges.get(name).copied()
    }

    /// Start the clock. Only the first call counts, so the elapsed time spans
    /// every split this collector has observed.
    pub fn record_start(&self) {
        self.lock().start_time.get_or_insert_with(Instant::now);
    }

    pub fn record_end(&self) {
        self.lock().end_time = Some(Instant::now());
    }

    /// Time from the first start mark to the last end mark, if both are set.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let inner = self.lock();
        match (inner.start_time, inner.end_time) {
            (Some(start), Some(end)) => Some(end.saturating_duration_since(start)),
            _ => None,
        }
    }

    /// All metrics as a JSON object of `{ name: { value, description? } }`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let elapsed = self.elapsed();
        let inner = self.lock();
        let mut out = serde_json::Map::new();

        for (name, value) in &inner.counters {
            out.insert(name.clone(), json!({ "value": value }));
        }
        for (name, value) in &inner.gauges {
            out.insert(name.clone(), json!({ "value": value }));
        }
        if let Some(elapsed) = elapsed {
            out.insert(
                "execution_time_ms".to_string(),
                json!({
                    "value": elapsed.as_millis(),
                    "description": "Total split time in milliseconds",
                }),
            );
        }
        Value::Object(out)
    }

    /// Print all metrics to stdout.
    pub fn print(&self) {
        println!("\n========== Split Metrics ==========");
        if let Some(elapsed) = self.elapsed() {
            println!(
                "Execution Time: {:.3}s ({} ms)",
                elapsed.as_secs_f64(),
                elapsed.as_millis()
            );
            println!("-----------------------------------");
        }

        let inner = self.lock();
        for (name, value) in &inner.counters {
            println!("{name}: {value}");
        }
        for (name, value) in &inner.gauges {
            println!("{name}: {value}");
        }
        drop(inner);
        println!("===================================\n");
    }

    /// Save [`to_json`](Self::to_json) pretty-printed to `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path.as_ref())?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }
}

impl SplitObserver for MetricsCollector {
    fn on_split_started(&mut self, _source: &Path, _policy: &SplitPolicy) {
        self.record_start();
    }

    fn on_file_closed(&mut self, file: &OutputFile) {
        self.increment_counter(FILES_WRITTEN, 1);
        self.increment_counter(ROWS_WRITTEN, file.rows);
        self.increment_counter(BYTES_WRITTEN, file.bytes);
        self.max_gauge(LARGEST_FILE_BYTES, file.bytes as f64);
    }

    fn on_split_finished(&mut self, _summary: &SplitSummary) {
        self.increment_counter(SPLITS_COMPLETED, 1);
        self.record_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn closed(index: usize, rows: u64, bytes: u64) -> OutputFile {
        OutputFile {
            index,
            path: PathBuf::from(format!("out_{index}.csv")),
            rows,
            bytes,
            has_header: true,
        }
    }

    #[test]
    fn observer_accumulates_through_clones() {
        let metrics = MetricsCollector::new();
        let mut observer = metrics.clone();
        observer.on_file_closed(&closed(1, 3, 120));
        observer.on_file_closed(&closed(2, 1, 40));

        assert_eq!(metrics.counter(FILES_WRITTEN), 2);
        assert_eq!(metrics.counter(ROWS_WRITTEN), 4);
        assert_eq!(metrics.counter(BYTES_WRITTEN), 160);
        assert_eq!(metrics.gauge(LARGEST_FILE_BYTES), Some(120.0));
    }

    #[test]
    fn clock_spans_every_observed_split() {
        let metrics = MetricsCollector::new();
        let mut observer = metrics.clone();
        let policy = SplitPolicy::by_row_count(1).unwrap();

        observer.on_split_started(Path::new("a.csv"), &policy);
        let first = metrics.lock().start_time;
        std::thread::sleep(Duration::from_millis(5));
        observer.on_split_started(Path::new("b.csv"), &policy);

        assert!(first.is_some());
        assert_eq!(metrics.lock().start_time, first);
    }

    #[test]
    fn json_lists_counters_and_gauges() {
        let metrics = MetricsCollector::new();
        metrics.increment_counter(FILES_WRITTEN, 1);
        metrics.max_gauge(LARGEST_FILE_BYTES, 10.0);
        let json = metrics.to_json();
        assert_eq!(json[FILES_WRITTEN]["value"], 1);
        assert_eq!(json[LARGEST_FILE_BYTES]["value"], 10.0);
        assert!(json.get("execution_time_ms").is_none());
    }

    #[test]
    fn save_to_file_writes_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("metrics.json");
        let metrics = MetricsCollector::new();
        metrics.record_start();
        metrics.record_end();
        metrics.save_to_file(&path).unwrap();

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed["execution_time_ms"]["value"].is_u64());
    }
}
