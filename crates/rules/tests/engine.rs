//! End-to-end evaluation of the sample snapshot in `data/snapshots/`.

use std::collections::BTreeMap;
use std::fs::File;
use std::sync::Arc;

use chrono::NaiveDate;

use oversight_core::{Kqi, NodeType};
use oversight_graph::{load_snapshot, GraphSnapshot};
use oversight_kqi::{aggregate_all_entities, KqiStatus};
use oversight_rules::audit_log::{AuditLog, LogLevel, LogQuery};
use oversight_rules::{
    dedup_alerts, AlertLevel, BuiltinRule, InferredAlert, Rule, RuleCategory, RuleContext,
    RuleEngine, RuleError, RuleThresholds,
};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn sample_graph() -> GraphSnapshot {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../data/snapshots/sample.json");
    let file = File::open(&path)
        .unwrap_or_else(|e| panic!("Failed to open {}: {}", path.display(), e));
    let (graph, report) = load_snapshot(file).unwrap();
    assert_eq!(report.nodes_skipped, 0);
    assert_eq!(report.edges_skipped, 0);
    graph
}

fn engine_with(rules: &[BuiltinRule]) -> RuleEngine {
    let boxed: Vec<Box<dyn Rule>> = rules.iter().map(|r| Box::new(*r) as Box<dyn Rule>).collect();
    RuleEngine::new(boxed).unwrap().with_as_of(Some(as_of()))
}

fn summary(alerts: &[InferredAlert]) -> Vec<(&str, &str, AlertLevel)> {
    alerts
        .iter()
        .map(|a| (a.rule_id.as_str(), a.trigger_node_id.as_str(), a.level))
        .collect()
}

// ── Test rules ──────────────────────────────────────────────

struct Failing;

impl Rule for Failing {
    fn id(&self) -> &str {
        "TEST-FAIL"
    }
    fn name(&self) -> &str {
        "always fails"
    }
    fn description(&self) -> &str {
        ""
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Global
    }
    fn default_level(&self) -> AlertLevel {
        AlertLevel::Basse
    }
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<InferredAlert>, RuleError> {
        Err(RuleError::evaluation(self.id(), format!("no data for {}", ctx.st_id())))
    }
}

struct Panicking;

impl Rule for Panicking {
    fn id(&self) -> &str {
        "TEST-PANIC"
    }
    fn name(&self) -> &str {
        "panics"
    }
    fn description(&self) -> &str {
        ""
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Global
    }
    fn default_level(&self) -> AlertLevel {
        AlertLevel::Basse
    }
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<InferredAlert>, RuleError> {
        if ctx.st_id() == "ST-002" {
            panic!("corrupted node");
        }
        Ok(vec![ctx.st_alert(self, AlertLevel::Basse, "ok")])
    }
}

// ── Full pass ───────────────────────────────────────────────

#[test]
fn sample_snapshot_full_pass() {
    let graph = sample_graph();
    let result = RuleEngine::with_builtin_rules().evaluate_all_as_of(&graph, as_of());

    assert_eq!(result.sts_evaluated, 3);
    assert_eq!(result.rules_evaluated, 3 * BuiltinRule::ALL.len());
    assert_eq!(result.rules_failed, 0);
    assert!(!result.is_degraded());

    let st1: Vec<InferredAlert> = result
        .alerts
        .iter()
        .filter(|a| a.st_id == "ST-001")
        .cloned()
        .collect();
    assert_eq!(
        summary(&st1),
        vec![
            ("RGL-001", "AUD-001", AlertLevel::Haute),
            ("RGL-002", "AUD-001", AlertLevel::Haute),
            ("RGL-003", "F-001", AlertLevel::Haute),
            ("RGL-005", "ST-001", AlertLevel::Moyenne),
            ("RGL-006", "KQI-003", AlertLevel::Haute),
            ("RGL-006", "KQI-002", AlertLevel::Moyenne),
            ("RGL-007", "QE-001", AlertLevel::Haute),
            ("RGL-008", "F-003", AlertLevel::Moyenne),
            ("RGL-009", "INS-001", AlertLevel::Haute),
            ("RGL-010", "EVR-001", AlertLevel::Haute),
            ("RGL-011", "QA-001", AlertLevel::Moyenne),
        ]
    );

    let by_st: BTreeMap<&str, usize> = result
        .alerts_by_st
        .iter()
        .map(|(st, n)| (st.as_str(), *n))
        .collect();
    assert_eq!(by_st, BTreeMap::from([("ST-001", 11), ("ST-002", 1)]));

    assert_eq!(result.alerts_by_level[&AlertLevel::Haute], 8);
    assert_eq!(result.alerts_by_level[&AlertLevel::Moyenne], 4);
    assert_eq!(result.alerts_by_level[&AlertLevel::Basse], 0);
    assert_eq!(result.alerts_by_level.values().sum::<usize>(), result.alerts.len());
}

#[test]
fn overdue_finding_found_through_audit() {
    let graph = sample_graph();
    let engine = engine_with(&[BuiltinRule::FindingOverdue]);

    let alerts = engine.evaluate_for_entity("ST-002", &graph);
    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.id, "RGL-008:ST-002:F-002");
    assert_eq!(alert.level, AlertLevel::Haute);
    assert_eq!(alert.trigger_node_id, "F-002");
    assert_eq!(alert.trigger_node_type, NodeType::Finding);
    assert_eq!(alert.st_name, "Pharma Beta");
    assert_eq!(alert.metadata["daysOpen"], 200);
    assert_eq!(alert.created_at.to_rfc3339(), "2023-12-13T00:00:00+00:00");
}

#[test]
fn thresholds_change_escalation() {
    let graph = sample_graph();
    let thresholds = RuleThresholds::from_yaml_str("finding_overdue_days:\n  moyenne: 90\n  haute: 365\n").unwrap();
    let engine = engine_with(&[BuiltinRule::FindingOverdue]).with_thresholds(thresholds);

    let alerts = engine.evaluate_for_entity("ST-002", &graph);
    assert_eq!(summary(&alerts), vec![("RGL-008", "F-002", AlertLevel::Moyenne)]);
}

// ── Determinism and equivalence ─────────────────────────────

#[test]
fn repeated_passes_are_identical() {
    let graph = sample_graph();
    let engine = RuleEngine::with_builtin_rules();
    let first = engine.evaluate_all_as_of(&graph, as_of());
    let second = engine.evaluate_all_as_of(&graph, as_of());

    assert_eq!(first.alerts, second.alerts);
    assert_eq!(first.alerts_by_level, second.alerts_by_level);
    assert_eq!(first.alerts_by_st, second.alerts_by_st);
}

#[test]
fn scoped_evaluation_matches_global_pass() {
    let graph = sample_graph();
    let engine = RuleEngine::with_builtin_rules();
    let global = engine.evaluate_all_as_of(&graph, as_of());

    for st in graph.sous_traitants() {
        let st_id = st.base.id.as_str();
        let scoped = engine.evaluate_for_entity_as_of(st_id, &graph, as_of());
        let expected: Vec<InferredAlert> = global
            .alerts
            .iter()
            .filter(|a| a.st_id == st_id)
            .cloned()
            .collect();
        assert_eq!(scoped, expected, "mismatch for {st_id}");
    }
}

#[test]
fn non_subcontractor_ids_yield_nothing() {
    let graph = sample_graph();
    let engine = RuleEngine::with_builtin_rules();
    assert!(engine.evaluate_for_entity_as_of("AUD-001", &graph, as_of()).is_empty());
    assert!(engine.evaluate_for_entity_as_of("ST-404", &graph, as_of()).is_empty());
}

#[test]
fn rule_output_has_unique_ids_and_dedup_is_idempotent() {
    let graph = sample_graph();
    let thresholds = RuleThresholds::default();

    for st in graph.sous_traitants() {
        let ctx = RuleContext::new(&graph, st, as_of(), &thresholds);
        for rule in BuiltinRule::ALL {
            let once = rule.evaluate(&ctx).unwrap();
            assert_eq!(dedup_alerts(once.clone()), once, "{} emitted duplicates", rule.id());

            let twice: Vec<InferredAlert> = once.iter().chain(once.iter()).cloned().collect();
            assert_eq!(dedup_alerts(twice), once);
        }
    }
}

// ── Failure isolation ───────────────────────────────────────

#[test]
fn failing_rules_do_not_abort_the_pass() {
    let graph = sample_graph();
    let baseline = RuleEngine::with_builtin_rules().evaluate_all_as_of(&graph, as_of());

    let mut engine = RuleEngine::with_builtin_rules();
    engine.add_rule(Failing).unwrap();
    engine.add_rule(Panicking).unwrap();
    let result = engine.evaluate_all_as_of(&graph, as_of());

    let rule_count = BuiltinRule::ALL.len() + 2;
    assert_eq!(result.rules_evaluated + result.rules_failed, rule_count * result.sts_evaluated);
    // Failing fails everywhere, Panicking only on ST-002.
    assert_eq!(result.rules_failed, 3 + 1);
    assert!(result.is_degraded());

    let panicked: Vec<_> = result
        .failures
        .iter()
        .filter(|f| f.rule_id == "TEST-PANIC")
        .collect();
    assert_eq!(panicked.len(), 1);
    assert_eq!(panicked[0].st_id, "ST-002");
    assert!(panicked[0].message.contains("corrupted node"));

    let builtin: Vec<InferredAlert> = result
        .alerts
        .iter()
        .filter(|a| a.rule_id.starts_with("RGL-"))
        .cloned()
        .collect();
    assert_eq!(builtin, baseline.alerts);
    // Panicking still contributes for the subcontractors it handled.
    assert_eq!(result.alerts.len(), baseline.alerts.len() + 2);
}

#[test]
fn disabled_engine_evaluates_nothing() {
    let graph = sample_graph();
    let mut engine = RuleEngine::with_builtin_rules();
    engine.set_enabled(false);

    let result = engine.evaluate_all_as_of(&graph, as_of());
    assert!(result.alerts.is_empty());
    assert_eq!(result.sts_evaluated, 0);
    assert_eq!(result.rules_evaluated, 0);
    assert!(engine.evaluate_for_entity_as_of("ST-001", &graph, as_of()).is_empty());
}

#[test]
fn audit_log_records_each_evaluation() {
    let graph = sample_graph();
    let log = Arc::new(AuditLog::new());
    let mut engine = RuleEngine::with_builtin_rules().with_audit_log(Arc::clone(&log));
    engine.add_rule(Failing).unwrap();
    engine.evaluate_all_as_of(&graph, as_of());

    let overdue = log.query("RGL-008", &LogQuery::default());
    assert_eq!(overdue.len(), 3);
    let st2 = log.query(
        "RGL-008",
        &LogQuery {
            st_id: Some("ST-002".into()),
            ..Default::default()
        },
    );
    assert_eq!(st2.len(), 1);
    assert_eq!(st2[0].alert_count, 1);
    assert_eq!(st2[0].level, LogLevel::Info);

    let failures = log.query(
        "TEST-FAIL",
        &LogQuery {
            level: Some(LogLevel::Error),
            ..Default::default()
        },
    );
    assert_eq!(failures.len(), 3);
}

// ── Output shape ────────────────────────────────────────────

#[test]
fn result_serializes_in_camel_case() {
    let graph = sample_graph();
    let result = engine_with(&[BuiltinRule::FindingOverdue]).evaluate_all(&graph);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["rulesEvaluated"], 3);
    assert_eq!(json["stsEvaluated"], 3);
    assert_eq!(json["alertsByLevel"]["HAUTE"], 1);
    assert_eq!(json["alertsByLevel"]["BASSE"], 0);
    assert_eq!(json["alertsBySt"]["ST-002"], 1);

    let alert = &json["alerts"][0];
    assert_eq!(alert["ruleId"], "RGL-008");
    assert_eq!(alert["triggerNodeType"], "Finding");
    assert_eq!(alert["level"], "MOYENNE");
}

#[test]
fn kqi_aggregation_agrees_with_kqi_rules() {
    let graph = sample_graph();
    let kqis: Vec<Kqi> = graph.kqis().cloned().collect();
    let st_ids: Vec<&str> = graph.sous_traitants().map(|st| st.base.id.as_str()).collect();
    let aggregations = aggregate_all_entities(&kqis, &st_ids);

    let st1 = &aggregations["ST-001"];
    assert_eq!(st1.status, KqiStatus::Critical);
    assert_eq!(st1.total_count, 3);
    assert_eq!(st1.alert_count, 2);
    assert_eq!(st1.warning_count, 1);
    assert_eq!(st1.degrading_count, 2);
    assert_eq!(st1.latest_period, "2024-Q2");

    assert_eq!(aggregations["ST-002"].status, KqiStatus::Good);
    assert_eq!(aggregations["ST-003"].total_count, 0);

    let kqi_alerts = engine_with(&[BuiltinRule::KqiAlerte]).evaluate_for_entity("ST-001", &graph);
    assert_eq!(kqi_alerts.len(), st1.alert_count);
}
