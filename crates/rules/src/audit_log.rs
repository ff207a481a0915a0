//! In-memory structured audit log for rule evaluation.
//!
//! Stores per-rule entries (one per evaluated subcontractor) capped at a
//! configurable maximum (default 500) with FIFO eviction. Uses
//! `std::sync::RwLock` so a shared log can be read while an engine records.

use std::collections::{HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity level for audit log entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

impl LogLevel {
    /// Numeric severity for comparison (higher = more severe).
    pub fn as_severity(&self) -> u8 {
        match self {
            LogLevel::Debug => 0,
            LogLevel::Info => 1,
            LogLevel::Error => 2,
        }
    }
}

/// Outcome of one (rule, subcontractor) evaluation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub rule_id: String,
    pub st_id: String,
    pub level: LogLevel,
    pub message: String,
    pub alert_count: usize,
    pub duration_ms: u64,
}

/// Filter for [`AuditLog::query`].
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    /// Minimum log level (inclusive).
    pub level: Option<LogLevel>,
    /// Only entries for this subcontractor.
    pub st_id: Option<String>,
    /// Maximum number of entries to return (default 100).
    pub limit: Option<usize>,
    /// Only entries at or after this instant.
    pub since: Option<DateTime<Utc>>,
}

/// In-memory per-rule audit log with FIFO eviction.
pub struct AuditLog {
    entries: RwLock<HashMap<String, VecDeque<LogEntry>>>,
    max_entries_per_rule: usize,
}

impl AuditLog {
    /// Create a new audit log with the default cap of 500 entries per rule.
    pub fn new() -> Self {
        Self::with_max_entries(500)
    }

    /// Create a new audit log with a custom per-rule entry cap.
    pub fn with_max_entries(max: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries_per_rule: max,
        }
    }

    /// Record a successful evaluation.
    pub fn record_success(&self, rule_id: &str, st_id: &str, alert_count: usize, duration_ms: u64) {
        let level = if alert_count > 0 { LogLevel::Info } else { LogLevel::Debug };
        self.push(LogEntry {
            timestamp: Utc::now(),
            rule_id: rule_id.to_string(),
            st_id: st_id.to_string(),
            level,
            message: format!("{alert_count} alert(s)"),
            alert_count,
            duration_ms,
        });
    }

    /// Record a failed evaluation.
    pub fn record_failure(&self, rule_id: &str, st_id: &str, message: &str, duration_ms: u64) {
        self.push(LogEntry {
            timestamp: Utc::now(),
            rule_id: rule_id.to_string(),
            st_id: st_id.to_string(),
            level: LogLevel::Error,
            message: message.to_string(),
            alert_count: 0,
            duration_ms,
        });
    }

    fn push(&self, entry: LogEntry) {
        let mut guard = self.write();
        let deque = guard.entry(entry.rule_id.clone()).or_default();
        deque.push_back(entry);
        while deque.len() > self.max_entries_per_rule {
            deque.pop_front();
        }
    }

    /// Entries for a rule, newest first.
    pub fn query(&self, rule_id: &str, query: &LogQuery) -> Vec<LogEntry> {
        let guard = self.read();
        let Some(deque) = guard.get(rule_id) else {
            return Vec::new();
        };

        let min_severity = query.level.map(|l| l.as_severity()).unwrap_or(0);
        let limit = query.limit.unwrap_or(100);

        deque
            .iter()
            .rev()
            .filter(|e| e.level.as_severity() >= min_severity)
            .filter(|e| query.st_id.as_ref().map_or(true, |st| &e.st_id == st))
            .filter(|e| query.since.map_or(true, |s| e.timestamp >= s))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Clear all log entries for a specific rule.
    pub fn clear(&self, rule_id: &str) {
        self.write().remove(rule_id);
    }

    // Poisoned guards are recovered; entries are appended or removed whole.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, VecDeque<LogEntry>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, VecDeque<LogEntry>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
