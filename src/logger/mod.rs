//! Bounded in-memory error and performance log.
//!
//! Every appended record is mirrored to the `log` facade. The buffer keeps
//! the most recent records and drops the oldest once it is full.

mod record;

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use serde_json::json;

use crate::runtime::Runtime;

pub use record::{Category, LogEntry, LogRecord, PerformanceSample, Severity};

/// Default number of records kept.
pub const LOG_CAPACITY: usize = 100;

/// Operations slower than this are recorded as a low-severity record.
pub const SLOW_OPERATION_MS: u64 = 3000;

pub struct ErrorLogger<R: Runtime> {
    runtime: Arc<R>,
    capacity: usize,
    slow_threshold_ms: u64,
    next_id: AtomicU64,
    records: Mutex<VecDeque<LogRecord>>,
    samples: Mutex<VecDeque<PerformanceSample>>,
}

impl<R: Runtime> ErrorLogger<R> {
    pub fn new(runtime: Arc<R>) -> Self {
        Self {
            runtime,
            capacity: LOG_CAPACITY,
            slow_threshold_ms: SLOW_OPERATION_MS,
            next_id: AtomicU64::new(1),
            records: Mutex::new(VecDeque::with_capacity(LOG_CAPACITY)),
            samples: Mutex::new(VecDeque::new()),
        }
    }

    /// Sets the buffer capacity. Zero is raised to 1.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn with_slow_threshold_ms(mut self, threshold_ms: u64) -> Self {
        self.slow_threshold_ms = threshold_ms;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a record, evicting the oldest when full.
    pub fn log(&self, entry: LogEntry) -> LogRecord {
        let timestamp = self.runtime.now_ms();
        let seq = self.next_id.fetch_add(1, Ordering::Relaxed);

        let record = LogRecord {
            id: format!("{}-{}", timestamp, seq),
            timestamp,
            message: entry.message,
            stack: entry.stack,
            severity: entry.severity,
            category: entry.category,
            context: entry.context,
        };

        log::log!(
            record.severity.log_level(),
            "[{}/{}] {}",
            record.severity,
            record.category,
            record.message
        );

        let mut records = lock(&self.records);
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());

        record
    }

    /// All records, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        lock(&self.records).iter().cloned().collect()
    }

    /// Up to `n` records, newest first.
    pub fn recent(&self, n: usize) -> Vec<LogRecord> {
        lock(&self.records).iter().rev().take(n).cloned().collect()
    }

    pub fn by_category(&self, category: Category) -> Vec<LogRecord> {
        lock(&self.records)
            .iter()
            .filter(|r| r.category == category)
            .cloned()
            .collect()
    }

    /// Records at or above `severity`.
    pub fn at_least(&self, severity: Severity) -> Vec<LogRecord> {
        lock(&self.records)
            .iter()
            .filter(|r| r.severity >= severity)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.records).is_empty()
    }

    /// Drops all records and samples.
    pub fn clear(&self) {
        lock(&self.records).clear();
        lock(&self.samples).clear();
    }

    /// Records as a pretty-printed JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records())
    }

    /// Times `operation` and records a sample under `name`.
    pub async fn measure<F, T>(&self, name: &str, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        let started = tokio::time::Instant::now();
        let output = operation.await;
        self.record_sample(name, started.elapsed().as_millis() as u64);
        output
    }

    pub fn record_sample(&self, name: &str, duration_ms: u64) -> PerformanceSample {
        let sample = PerformanceSample {
            name: name.to_string(),
            duration_ms,
            timestamp: self.runtime.now_ms(),
        };
        debug!("{} took {}ms", name, duration_ms);

        {
            let mut samples = lock(&self.samples);
            while samples.len() >= self.capacity {
                samples.pop_front();
            }
            samples.push_back(sample.clone());
        }

        if duration_ms > self.slow_threshold_ms {
            self.log(
                LogEntry::new(
                    format!("Slow operation: {} took {}ms", name, duration_ms),
                    Severity::Low,
                    Category::Unknown,
                )
                .with_context(json!({"operation": name, "duration_ms": duration_ms})),
            );
        }

        sample
    }

    /// All performance samples, oldest first.
    pub fn samples(&self) -> Vec<PerformanceSample> {
        lock(&self.samples).iter().cloned().collect()
    }
}

/// Locks a mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;

    /// A runtime whose clock advances by one millisecond per reading.
    fn ticking_runtime() -> Arc<MockRuntime> {
        let mut runtime = MockRuntime::new();
        let clock = Arc::new(AtomicU64::new(1_700_000_000_000));
        runtime
            .expect_now_ms()
            .returning(move || clock.fetch_add(1, Ordering::SeqCst));
        Arc::new(runtime)
    }

    #[test]
    fn test_log_assigns_id_and_timestamp() {
        let logger = ErrorLogger::new(ticking_runtime());

        let record = logger.log(
            LogEntry::new("Network error", Severity::Medium, Category::Network)
                .with_stack("at fetch_rooms")
                .with_context(json!({"url": "/rooms"})),
        );

        assert_eq!(record.timestamp, 1_700_000_000_000);
        assert_eq!(record.id, "1700000000000-1");
        assert_eq!(record.stack.as_deref(), Some("at fetch_rooms"));
        assert_eq!(logger.records(), vec![record]);
    }

    #[test]
    fn test_buffer_keeps_the_most_recent_records() {
        let logger = ErrorLogger::new(ticking_runtime());

        for i in 0..150 {
            logger.log(LogEntry::new(
                format!("error {}", i),
                Severity::Low,
                Category::Unknown,
            ));
        }

        let records = logger.records();
        assert_eq!(records.len(), 100);
        assert_eq!(records.first().unwrap().message, "error 50");
        assert_eq!(records.last().unwrap().message, "error 149");
        assert!(records.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_custom_capacity() {
        let logger = ErrorLogger::new(ticking_runtime()).with_capacity(0);
        assert_eq!(logger.capacity(), 1);

        logger.log(LogEntry::new("first", Severity::Low, Category::Unknown));
        logger.log(LogEntry::new("second", Severity::Low, Category::Unknown));

        assert_eq!(logger.len(), 1);
        assert_eq!(logger.records()[0].message, "second");
    }

    #[test]
    fn test_recent_is_newest_first() {
        let logger = ErrorLogger::new(ticking_runtime());
        for name in ["a", "b", "c"] {
            logger.log(LogEntry::new(name, Severity::Low, Category::Unknown));
        }

        let recent: Vec<_> = logger.recent(2).into_iter().map(|r| r.message).collect();
        assert_eq!(recent, vec!["c", "b"]);
    }

    #[test]
    fn test_filters() {
        let logger = ErrorLogger::new(ticking_runtime());
        logger.log(LogEntry::new("offline", Severity::Medium, Category::Network));
        logger.log(LogEntry::new("forbidden", Severity::High, Category::Auth));
        logger.log(LogEntry::new("missing key", Severity::Critical, Category::Unknown));

        assert_eq!(logger.by_category(Category::Auth).len(), 1);
        let serious: Vec<_> = logger
            .at_least(Severity::High)
            .into_iter()
            .map(|r| r.message)
            .collect();
        assert_eq!(serious, vec!["forbidden", "missing key"]);
    }

    #[test]
    fn test_clear_and_export() {
        let logger = ErrorLogger::new(ticking_runtime());
        logger.log(LogEntry::new("boom", Severity::High, Category::Api));

        let exported: Vec<LogRecord> = serde_json::from_str(&logger.to_json().unwrap()).unwrap();
        assert_eq!(exported, logger.records());

        logger.clear();
        assert!(logger.is_empty());
        assert_eq!(logger.to_json().unwrap(), "[]");
    }

    #[test]
    fn test_slow_sample_creates_record() {
        let logger = ErrorLogger::new(ticking_runtime()).with_slow_threshold_ms(100);

        logger.record_sample("fetch rooms", 50);
        assert!(logger.is_empty());

        logger.record_sample("fetch gallery", 250);
        let records = logger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "Slow operation: fetch gallery took 250ms");
        assert_eq!(records[0].severity, Severity::Low);
        assert_eq!(logger.samples().len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_measure_returns_output_and_records_sample() {
        let logger = ErrorLogger::new(ticking_runtime());

        let value = logger
            .measure("load content", async {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                42
            })
            .await;

        assert_eq!(value, 42);
        let samples = logger.samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].name, "load content");
        assert!(samples[0].duration_ms >= 5);
    }
}
