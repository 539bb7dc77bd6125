//! Diagnostics sink for the analysis core
//!
//! The analyzer never logs through a global logger directly. Callers pass a
//! [`Diagnostics`] implementation, so the core can run without any subscriber
//! installed and tests can inspect exactly what was reported.

use std::fmt;
use std::sync::Mutex;

/// Severity of a diagnostic record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Debug => write!(f, "DEBUG"),
            Level::Info => write!(f, "INFO"),
            Level::Warn => write!(f, "WARN"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// Receiver for analysis events (parsed modules, resolved and unresolved imports,
/// skipped files).
///
/// Must be `Send + Sync`: the per-file phase runs on the rayon pool.
pub trait Diagnostics: Send + Sync {
    fn record(&self, level: Level, message: &str);
}

/// Forwards every record to the `tracing` macros
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, level: Level, message: &str) {
        match level {
            Level::Debug => tracing::debug!("{}", message),
            Level::Info => tracing::info!("{}", message),
            Level::Warn => tracing::warn!("{}", message),
            Level::Error => tracing::error!("{}", message),
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn record(&self, _level: Level, _message: &str) {}
}

/// A single stored record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub level: Level,
    pub message: String,
}

/// Keeps records in memory, in arrival order
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    records: Mutex<Vec<Record>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn records(&self) -> Vec<Record> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Records at exactly `level`
    pub fn at_level(&self, level: Level) -> Vec<Record> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .collect()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn record(&self, level: Level, message: &str) {
        let record = Record {
            level,
            message: message.to_string(),
        };
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_diagnostics_keeps_order() {
        let diagnostics = CollectingDiagnostics::new();
        diagnostics.record(Level::Info, "first");
        diagnostics.record(Level::Error, "second");
        diagnostics.record(Level::Info, "third");

        let records = diagnostics.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].message, "first");
        assert_eq!(records[2].message, "third");
        assert_eq!(diagnostics.at_level(Level::Error).len(), 1);
    }

    #[test]
    fn test_null_diagnostics_is_usable_as_trait_object() {
        let sink: &dyn Diagnostics = &NullDiagnostics;
        sink.record(Level::Warn, "ignored");
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warn < Level::Error);
        assert_eq!(Level::Warn.to_string(), "WARN");
    }
}
