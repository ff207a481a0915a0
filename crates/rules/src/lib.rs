//! Inference rules over the oversight knowledge graph.
//!
//! This crate provides:
//! - the [`Rule`] trait and the built-in rule catalog ([`BuiltinRule`])
//! - the [`RuleEngine`], which runs every rule for every subcontractor with
//!   per-rule failure isolation and alert deduplication
//! - YAML-configurable escalation thresholds
//! - read-only projections over engine output (filtering, counters)
//! - an in-memory per-rule evaluation audit log

pub mod alert;
pub mod audit_log;
pub mod catalog;
pub mod context;
pub mod engine;
pub mod error;
pub mod projection;
pub mod rule;
pub mod thresholds;

pub use alert::{alert_id, AlertLevel, InferredAlert, RuleCategory};
pub use catalog::BuiltinRule;
pub use context::RuleContext;
pub use engine::{dedup_alerts, RuleEngine, RuleEngineResult, RuleFailure};
pub use error::RuleError;
pub use projection::{count_by_level, filter_alerts, sorted_by_severity, AlertFilter, LevelCounts};
pub use rule::{Rule, RuleInfo};
pub use thresholds::RuleThresholds;
