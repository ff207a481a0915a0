//! Alerts produced by rule evaluation.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use oversight_core::date::{parse_opt_date, start_of_day};
use oversight_core::NodeType;

/// Alert severity. Ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Haute,
    Moyenne,
    Basse,
}

impl AlertLevel {
    pub const ALL: [AlertLevel; 3] = [AlertLevel::Haute, AlertLevel::Moyenne, AlertLevel::Basse];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Haute => "HAUTE",
            AlertLevel::Moyenne => "MOYENNE",
            AlertLevel::Basse => "BASSE",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HAUTE" | "HIGH" => Ok(AlertLevel::Haute),
            "MOYENNE" | "MEDIUM" => Ok(AlertLevel::Moyenne),
            "BASSE" | "LOW" => Ok(AlertLevel::Basse),
            other => Err(format!("unknown alert level '{other}' (expected HAUTE, MOYENNE or BASSE)")),
        }
    }
}

/// Grouping metadata for rules. Not used for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Audit,
    Finding,
    Qe,
    Kqi,
    Inspection,
    Global,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Audit => "audit",
            RuleCategory::Finding => "finding",
            RuleCategory::Qe => "qe",
            RuleCategory::Kqi => "kqi",
            RuleCategory::Inspection => "inspection",
            RuleCategory::Global => "global",
        }
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic alert identity: `{rule_id}:{st_id}:{trigger_node_id}`.
pub fn alert_id(rule_id: &str, st_id: &str, trigger_node_id: &str) -> String {
    format!("{rule_id}:{st_id}:{trigger_node_id}")
}

/// An alert raised by one rule for one subcontractor and one trigger node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferredAlert {
    pub id: String,
    pub rule_id: String,
    pub rule_name: String,
    pub description: String,
    pub level: AlertLevel,
    pub st_id: String,
    pub st_name: String,
    pub trigger_node_id: String,
    pub trigger_node_type: NodeType,
    pub created_at: DateTime<Utc>,
    pub metadata: Value,
}

impl InferredAlert {
    /// Use the trigger node's own date as `created_at` when it parses.
    pub fn dated(mut self, raw: Option<&str>) -> Self {
        if let Some(date) = parse_opt_date(raw) {
            self.created_at = start_of_day(date);
        }
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}
