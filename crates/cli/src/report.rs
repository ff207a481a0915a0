use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use oversight_graph::{GraphStats, LoadReport};
use oversight_kqi::KqiAggregation;
use oversight_rules::{
    count_by_level, AlertLevel, InferredAlert, LevelCounts, RuleEngineResult, RuleFailure,
};

/// Everything one run produced, restricted to the requested view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'a> {
    pub as_of: NaiveDate,
    pub graph: GraphStats,
    pub skipped_nodes: usize,
    pub skipped_edges: usize,
    pub rules_evaluated: usize,
    pub rules_failed: usize,
    pub sts_evaluated: usize,
    pub execution_time_ms: u64,
    /// Counts over the whole pass, before filtering.
    pub alerts_by_level: &'a BTreeMap<AlertLevel, usize>,
    /// Counts over `alerts`.
    pub shown: LevelCounts,
    pub alerts: Vec<&'a InferredAlert>,
    pub failures: &'a [RuleFailure],
    pub kqi: BTreeMap<&'a str, &'a KqiAggregation>,
}

impl<'a> Report<'a> {
    pub fn new(
        as_of: NaiveDate,
        graph: GraphStats,
        load: &LoadReport,
        result: &'a RuleEngineResult,
        alerts: Vec<&'a InferredAlert>,
        kqi: BTreeMap<&'a str, &'a KqiAggregation>,
    ) -> Self {
        Self {
            as_of,
            graph,
            skipped_nodes: load.nodes_skipped,
            skipped_edges: load.edges_skipped,
            rules_evaluated: result.rules_evaluated,
            rules_failed: result.rules_failed,
            sts_evaluated: result.sts_evaluated,
            execution_time_ms: result.execution_time_ms,
            alerts_by_level: &result.alerts_by_level,
            shown: count_by_level(alerts.iter().copied()),
            alerts,
            failures: &result.failures,
            kqi,
        }
    }
}
