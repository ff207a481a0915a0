//! Rule registry and evaluation passes.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, error, info};

use oversight_core::config::EngineConfig;
use oversight_core::SousTraitant;
use oversight_graph::GraphSnapshot;

use crate::alert::{AlertLevel, InferredAlert};
use crate::audit_log::AuditLog;
use crate::catalog::BuiltinRule;
use crate::context::RuleContext;
use crate::error::RuleError;
use crate::rule::{Rule, RuleInfo};
use crate::thresholds::RuleThresholds;

/// One (rule, subcontractor) evaluation that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFailure {
    pub rule_id: String,
    pub st_id: String,
    pub message: String,
}

/// Output of [`RuleEngine::evaluate_all`].
///
/// `rules_evaluated` counts successful (rule, subcontractor) evaluations;
/// `rules_evaluated + rules_failed` always equals rules × `sts_evaluated`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEngineResult {
    pub alerts: Vec<InferredAlert>,
    pub rules_evaluated: usize,
    pub rules_failed: usize,
    pub sts_evaluated: usize,
    pub execution_time_ms: u64,
    pub alerts_by_level: BTreeMap<AlertLevel, usize>,
    pub alerts_by_st: BTreeMap<String, usize>,
    pub failures: Vec<RuleFailure>,
}

impl RuleEngineResult {
    fn empty() -> Self {
        Self {
            alerts: Vec::new(),
            rules_evaluated: 0,
            rules_failed: 0,
            sts_evaluated: 0,
            execution_time_ms: 0,
            alerts_by_level: BTreeMap::new(),
            alerts_by_st: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    /// Whether at least one rule failed during the pass.
    pub fn is_degraded(&self) -> bool {
        self.rules_failed > 0
    }
}

/// Drop alerts with an already seen id. The last occurrence wins; the
/// position of the first one is kept.
pub fn dedup_alerts(alerts: impl IntoIterator<Item = InferredAlert>) -> Vec<InferredAlert> {
    let mut unique: IndexMap<String, InferredAlert> = IndexMap::new();
    for alert in alerts {
        unique.insert(alert.id.clone(), alert);
    }
    unique.into_values().collect()
}

/// Holds the registered rules and evaluation settings.
///
/// Configure once, then evaluate any number of snapshots. Subcontractors are
/// visited in id order and rules in registration order, so a pass over a
/// given snapshot, rule set and evaluation date is fully deterministic
/// (apart from `execution_time_ms`).
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
    enabled: bool,
    thresholds: RuleThresholds,
    as_of: Option<NaiveDate>,
    audit_log: Option<Arc<AuditLog>>,
}

impl RuleEngine {
    /// Engine over `rules`. Fails on a duplicate rule id.
    pub fn new(rules: impl IntoIterator<Item = Box<dyn Rule>>) -> Result<Self, RuleError> {
        let mut engine = Self {
            rules: Vec::new(),
            enabled: true,
            thresholds: RuleThresholds::default(),
            as_of: None,
            audit_log: None,
        };
        for rule in rules {
            engine.register(rule)?;
        }
        Ok(engine)
    }

    /// Engine over the built-in catalog with default thresholds.
    pub fn with_builtin_rules() -> Self {
        Self {
            rules: BuiltinRule::all(),
            enabled: true,
            thresholds: RuleThresholds::default(),
            as_of: None,
            audit_log: None,
        }
    }

    /// Built-in catalog configured from the environment: thresholds file,
    /// enabled flag and pinned evaluation date.
    pub fn from_config(config: &EngineConfig) -> Result<Self, RuleError> {
        let thresholds = match &config.thresholds_path {
            Some(path) => RuleThresholds::load(path)?,
            None => RuleThresholds::default(),
        };
        let mut engine = Self::with_builtin_rules()
            .with_thresholds(thresholds)
            .with_as_of(config.as_of);
        engine.set_enabled(config.enabled);
        Ok(engine)
    }

    pub fn with_thresholds(mut self, thresholds: RuleThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Pin the evaluation date of [`evaluate_all`](Self::evaluate_all) and
    /// [`evaluate_for_entity`](Self::evaluate_for_entity); `None` means today.
    pub fn with_as_of(mut self, as_of: Option<NaiveDate>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_audit_log(mut self, audit_log: Arc<AuditLog>) -> Self {
        self.audit_log = Some(audit_log);
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    /// Register a rule. Returns error if its id is already registered.
    pub fn add_rule(&mut self, rule: impl Rule + 'static) -> Result<(), RuleError> {
        self.register(Box::new(rule))
    }

    fn register(&mut self, rule: Box<dyn Rule>) -> Result<(), RuleError> {
        if self.rule(rule.id()).is_some() {
            return Err(RuleError::DuplicateRule(rule.id().to_string()));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Remove a rule by id. Returns whether a rule was removed.
    pub fn remove_rule(&mut self, rule_id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id() != rule_id);
        self.rules.len() != before
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn rule(&self, rule_id: &str) -> Option<&dyn Rule> {
        self.rules().find(|r| r.id() == rule_id)
    }

    pub fn rule_infos(&self) -> Vec<RuleInfo> {
        self.rules().map(RuleInfo::of).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The pinned evaluation date, or today (UTC).
    pub fn evaluation_date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn evaluate_all(&self, graph: &GraphSnapshot) -> RuleEngineResult {
        self.evaluate_all_as_of(graph, self.evaluation_date())
    }

    /// Run every rule for every subcontractor of `graph`.
    pub fn evaluate_all_as_of(&self, graph: &GraphSnapshot, as_of: NaiveDate) -> RuleEngineResult {
        if !self.enabled {
            debug!("rule engine disabled, skipping evaluation");
            return RuleEngineResult::empty();
        }
        let started = Instant::now();

        let mut unique: IndexMap<String, InferredAlert> = IndexMap::new();
        let mut failures = Vec::new();
        let mut rules_evaluated = 0;
        let mut sts_evaluated = 0;
        for st in graph.sous_traitants() {
            sts_evaluated += 1;
            rules_evaluated += self.evaluate_st(graph, st, as_of, &mut unique, &mut failures);
        }

        let alerts: Vec<InferredAlert> = unique.into_values().collect();
        let mut alerts_by_level: BTreeMap<AlertLevel, usize> =
            AlertLevel::ALL.into_iter().map(|level| (level, 0)).collect();
        let mut alerts_by_st: BTreeMap<String, usize> = BTreeMap::new();
        for alert in &alerts {
            *alerts_by_level.entry(alert.level).or_default() += 1;
            *alerts_by_st.entry(alert.st_id.clone()).or_default() += 1;
        }

        let result = RuleEngineResult {
            rules_evaluated,
            rules_failed: failures.len(),
            sts_evaluated,
            execution_time_ms: started.elapsed().as_millis() as u64,
            alerts_by_level,
            alerts_by_st,
            failures,
            alerts,
        };
        info!(
            %as_of,
            sts = result.sts_evaluated,
            rules = self.rules.len(),
            alerts = result.alerts.len(),
            failed = result.rules_failed,
            elapsed_ms = result.execution_time_ms,
            "rule evaluation complete"
        );
        result
    }

    pub fn evaluate_for_entity(&self, st_id: &str, graph: &GraphSnapshot) -> Vec<InferredAlert> {
        self.evaluate_for_entity_as_of(st_id, graph, self.evaluation_date())
    }

    /// Run every rule for one subcontractor. Equal to the alerts of
    /// [`evaluate_all_as_of`](Self::evaluate_all_as_of) carrying `st_id`.
    /// Unknown ids (or ids of other node types) yield no alerts.
    pub fn evaluate_for_entity_as_of(
        &self,
        st_id: &str,
        graph: &GraphSnapshot,
        as_of: NaiveDate,
    ) -> Vec<InferredAlert> {
        if !self.enabled {
            return Vec::new();
        }
        let Some(st) = graph.sous_traitant(st_id) else {
            debug!(st_id, "not a subcontractor, nothing to evaluate");
            return Vec::new();
        };
        let mut unique = IndexMap::new();
        let mut failures = Vec::new();
        self.evaluate_st(graph, st, as_of, &mut unique, &mut failures);
        unique.into_values().collect()
    }

    /// Evaluate all rules for `st`, merging alerts into `unique`. Returns the
    /// number of rules that succeeded.
    fn evaluate_st(
        &self,
        graph: &GraphSnapshot,
        st: &SousTraitant,
        as_of: NaiveDate,
        unique: &mut IndexMap<String, InferredAlert>,
        failures: &mut Vec<RuleFailure>,
    ) -> usize {
        let ctx = RuleContext::new(graph, st, as_of, &self.thresholds);
        let st_id = ctx.st_id();
        let mut succeeded = 0;

        for rule in self.rules() {
            let started = Instant::now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(&ctx)));
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let message = match outcome {
                Ok(Ok(alerts)) => {
                    succeeded += 1;
                    if let Some(log) = &self.audit_log {
                        log.record_success(rule.id(), st_id, alerts.len(), elapsed_ms);
                    }
                    for alert in alerts {
                        unique.insert(alert.id.clone(), alert);
                    }
                    continue;
                }
                Ok(Err(err)) => err.to_string(),
                Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
            };

            error!(rule_id = rule.id(), st_id, error = %message, "rule evaluation failed");
            if let Some(log) = &self.audit_log {
                log.record_failure(rule.id(), st_id, &message, elapsed_ms);
            }
            failures.push(RuleFailure {
                rule_id: rule.id().to_string(),
                st_id: st_id.to_string(),
                message,
            });
        }
        succeeded
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::with_builtin_rules()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
