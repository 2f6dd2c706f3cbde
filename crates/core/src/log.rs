//! Injectable logging capability.
//!
//! Components receive an `Arc<dyn ScanLog>` instead of consulting a global
//! debug flag. The production implementation forwards to `tracing`.

use std::sync::Mutex;

/// Logging capability handed to the cache, the lookup client and the scanner.
pub trait ScanLog: Send + Sync {
    /// Lifecycle messages that are always interesting.
    fn info(&self, message: &str);

    /// Per-scan chatter; only emitted when verbose logging is enabled.
    fn verbose(&self, message: &str);

    /// Failures. Always emitted.
    fn error(&self, message: &str);
}

/// `ScanLog` backed by `tracing` events under the `yadz` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog {
    verbose: bool,
}

impl TracingLog {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ScanLog for TracingLog {
    fn info(&self, message: &str) {
        tracing::info!(target: "yadz", "{message}");
    }

    fn verbose(&self, message: &str) {
        if self.verbose {
            tracing::debug!(target: "yadz", "{message}");
        }
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "yadz", "{message}");
    }
}

/// Severity recorded by [`MemoryLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Verbose,
    Error,
}

/// `ScanLog` that keeps every message in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded messages.
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Messages recorded at error level.
    pub fn errors(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(level, _)| *level == LogLevel::Error)
            .map(|(_, message)| message)
            .collect()
    }

    fn push(&self, level: LogLevel, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((level, message.to_string()));
        }
    }
}

impl ScanLog for MemoryLog {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn verbose(&self, message: &str) {
        self.push(LogLevel::Verbose, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}
