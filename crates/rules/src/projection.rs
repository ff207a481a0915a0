//! Read-only views over engine output for presentation layers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::alert::{AlertLevel, InferredAlert, RuleCategory};
use crate::rule::{Rule, RuleInfo};

/// Alert filter; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFilter {
    pub level: Option<AlertLevel>,
    pub st_id: Option<String>,
}

impl AlertFilter {
    pub fn matches(&self, alert: &InferredAlert) -> bool {
        if self.level.is_some_and(|level| alert.level != level) {
            return false;
        }
        if self.st_id.as_deref().is_some_and(|st| alert.st_id != st) {
            return false;
        }
        true
    }
}

/// Alerts accepted by `filter`, in their original order.
pub fn filter_alerts<'a>(alerts: &'a [InferredAlert], filter: &AlertFilter) -> Vec<&'a InferredAlert> {
    alerts.iter().filter(|a| filter.matches(a)).collect()
}

pub fn alerts_for_st<'a>(alerts: &'a [InferredAlert], st_id: &str) -> Vec<&'a InferredAlert> {
    alerts.iter().filter(|a| a.st_id == st_id).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub total: usize,
    pub haute: usize,
    pub moyenne: usize,
    pub basse: usize,
}

pub fn count_by_level<'a>(alerts: impl IntoIterator<Item = &'a InferredAlert>) -> LevelCounts {
    let mut counts = LevelCounts::default();
    for alert in alerts {
        counts.total += 1;
        match alert.level {
            AlertLevel::Haute => counts.haute += 1,
            AlertLevel::Moyenne => counts.moyenne += 1,
            AlertLevel::Basse => counts.basse += 1,
        }
    }
    counts
}

/// Registered rules grouped by category. Categories without rules are absent.
pub fn rules_by_category<'a>(rules: impl IntoIterator<Item = &'a dyn Rule>) -> BTreeMap<RuleCategory, Vec<RuleInfo>> {
    let mut grouped: BTreeMap<RuleCategory, Vec<RuleInfo>> = BTreeMap::new();
    for rule in rules {
        grouped.entry(rule.category()).or_default().push(RuleInfo::of(rule));
    }
    grouped
}

/// Alerts sorted most severe first, then by subcontractor and alert id.
pub fn sorted_by_severity(alerts: &[InferredAlert]) -> Vec<&InferredAlert> {
    let mut sorted: Vec<&InferredAlert> = alerts.iter().collect();
    sorted.sort_by(|a, b| {
        a.level
            .cmp(&b.level)
            .then_with(|| a.st_id.cmp(&b.st_id))
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuiltinRule;
    use chrono::NaiveDate;
    use oversight_core::date::start_of_day;
    use oversight_core::NodeType;

    fn alert(id: &str, st: &str, level: AlertLevel) -> InferredAlert {
        InferredAlert {
            id: id.to_string(),
            rule_id: "RGL-001".into(),
            rule_name: "rule".into(),
            description: String::new(),
            level,
            st_id: st.to_string(),
            st_name: st.to_string(),
            trigger_node_id: id.to_string(),
            trigger_node_type: NodeType::Audit,
            created_at: start_of_day(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            metadata: serde_json::Value::Null,
        }
    }

    fn sample() -> Vec<InferredAlert> {
        vec![
            alert("a", "ST-2", AlertLevel::Basse),
            alert("b", "ST-1", AlertLevel::Haute),
            alert("c", "ST-1", AlertLevel::Moyenne),
            alert("d", "ST-2", AlertLevel::Haute),
        ]
    }

    #[test]
    fn filters_by_level_and_st() {
        let alerts = sample();
        let ids = |v: Vec<&InferredAlert>| v.iter().map(|a| a.id.clone()).collect::<Vec<_>>();

        assert_eq!(ids(filter_alerts(&alerts, &AlertFilter::default())).len(), 4);
        let haute = AlertFilter {
            level: Some(AlertLevel::Haute),
            st_id: None,
        };
        assert_eq!(ids(filter_alerts(&alerts, &haute)), vec!["b", "d"]);
        let st2_haute = AlertFilter {
            level: Some(AlertLevel::Haute),
            st_id: Some("ST-2".into()),
        };
        assert_eq!(ids(filter_alerts(&alerts, &st2_haute)), vec!["d"]);
        assert_eq!(ids(alerts_for_st(&alerts, "ST-1")), vec!["b", "c"]);
    }

    #[test]
    fn counts_levels() {
        let alerts = sample();
        assert_eq!(
            count_by_level(&alerts),
            LevelCounts {
                total: 4,
                haute: 2,
                moyenne: 1,
                basse: 1,
            }
        );
        assert_eq!(count_by_level(&[]), LevelCounts::default());
    }

    #[test]
    fn severity_order() {
        let alerts = sample();
        let order: Vec<&str> = sorted_by_severity(&alerts).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn groups_catalog_by_category() {
        let rules = BuiltinRule::all();
        let grouped = rules_by_category(rules.iter().map(|r| r.as_ref()));
        assert_eq!(grouped[&RuleCategory::Finding].len(), 3);
        assert_eq!(grouped[&RuleCategory::Kqi].len(), 2);
        assert_eq!(grouped.values().map(Vec::len).sum::<usize>(), BuiltinRule::ALL.len());
    }
}
