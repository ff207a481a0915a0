//! Read-only evaluation context handed to rules, with the graph traversals
//! the built-in catalog shares.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use oversight_core::date::{days_between, parse_opt_date, start_of_day};
use oversight_core::{
    AccordQualite, Audit, EdgeType, EvaluationRisque, EvenementQualite, Finding, GraphNode,
    Inspection, Kqi, NodeType, SousTraitant,
};
use oversight_graph::GraphSnapshot;

use crate::alert::{alert_id, AlertLevel, InferredAlert};
use crate::rule::Rule;
use crate::thresholds::RuleThresholds;

/// Everything a rule may look at while evaluating one subcontractor.
///
/// Relations are followed in both directions: imported snapshots disagree on
/// whether e.g. `A_ETE_AUDITE_PAR` points from the subcontractor or to it.
/// Every collection helper returns nodes ordered by id, each at most once.
pub struct RuleContext<'a> {
    pub graph: &'a GraphSnapshot,
    pub st: &'a SousTraitant,
    /// Evaluation date used for every age computation.
    pub as_of: NaiveDate,
    pub thresholds: &'a RuleThresholds,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        graph: &'a GraphSnapshot,
        st: &'a SousTraitant,
        as_of: NaiveDate,
        thresholds: &'a RuleThresholds,
    ) -> Self {
        Self {
            graph,
            st,
            as_of,
            thresholds,
        }
    }

    pub fn st_id(&self) -> &'a str {
        &self.st.base.id
    }

    pub fn st_name(&self) -> &'a str {
        self.st.name()
    }

    /// Whole days from `raw` (a node date field) to the evaluation date.
    /// `None` when the field is missing or does not parse.
    pub fn days_since(&self, raw: Option<&str>) -> Option<i64> {
        parse_opt_date(raw).map(|date| days_between(date, self.as_of))
    }

    /// An alert of `rule` on `trigger_id`, dated at the evaluation date.
    pub fn alert(
        &self,
        rule: &dyn Rule,
        trigger_id: &str,
        trigger_type: NodeType,
        level: AlertLevel,
        description: impl Into<String>,
    ) -> InferredAlert {
        InferredAlert {
            id: alert_id(rule.id(), self.st_id(), trigger_id),
            rule_id: rule.id().to_string(),
            rule_name: rule.name().to_string(),
            description: description.into(),
            level,
            st_id: self.st_id().to_string(),
            st_name: self.st_name().to_string(),
            trigger_node_id: trigger_id.to_string(),
            trigger_node_type: trigger_type,
            created_at: start_of_day(self.as_of),
            metadata: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// An alert whose trigger is the subcontractor itself.
    pub fn st_alert(
        &self,
        rule: &dyn Rule,
        level: AlertLevel,
        description: impl Into<String>,
    ) -> InferredAlert {
        self.alert(rule, self.st_id(), NodeType::SousTraitant, level, description)
    }

    /// Nodes linked to `from` by `edge_type` that `pick` accepts.
    pub fn related<T: 'a>(
        &self,
        from: &str,
        edge_type: EdgeType,
        pick: impl Fn(&'a GraphNode) -> Option<&'a T>,
    ) -> Vec<&'a T> {
        let nodes: BTreeMap<&'a str, &'a GraphNode> = self
            .graph
            .neighbors(from, edge_type)
            .into_iter()
            .map(|(_, node)| (node.id(), node))
            .collect();
        nodes.into_values().filter_map(pick).collect()
    }

    pub fn audits(&self) -> Vec<&'a Audit> {
        self.related(self.st_id(), EdgeType::AEteAuditePar, as_audit)
    }

    pub fn inspections(&self) -> Vec<&'a Inspection> {
        self.related(self.st_id(), EdgeType::AEteInspectePar, as_inspection)
    }

    pub fn quality_events(&self) -> Vec<&'a EvenementQualite> {
        self.related(self.st_id(), EdgeType::QeConcerneSt, as_quality_event)
    }

    pub fn risk_evaluations(&self) -> Vec<&'a EvaluationRisque> {
        self.related(self.st_id(), EdgeType::AFaitObjetEvaluation, as_risk_evaluation)
    }

    pub fn quality_agreements(&self) -> Vec<&'a AccordQualite> {
        self.related(self.st_id(), EdgeType::EstCouvertParQa, as_quality_agreement)
    }

    /// Findings of the subcontractor's audits and inspections, plus findings
    /// attached to the subcontractor directly.
    pub fn findings(&self) -> Vec<&'a Finding> {
        let st_id = self.st_id();
        let mut sources: Vec<(&'a str, EdgeType)> = vec![
            (st_id, EdgeType::GenereFinding),
            (st_id, EdgeType::InspectionGenereFinding),
        ];
        sources.extend(
            self.audits()
                .into_iter()
                .map(|a| (a.base.id.as_str(), EdgeType::GenereFinding)),
        );
        sources.extend(
            self.inspections()
                .into_iter()
                .map(|i| (i.base.id.as_str(), EdgeType::InspectionGenereFinding)),
        );

        let mut found: BTreeMap<&'a str, &'a Finding> = BTreeMap::new();
        for (from, edge_type) in sources {
            for finding in self.related(from, edge_type, as_finding) {
                found.insert(finding.base.id.as_str(), finding);
            }
        }
        found.into_values().collect()
    }

    /// KQI measurements of the subcontractor: nodes carrying its id in
    /// `sous_traitant_id`, and nodes linked by `KQI_MESURE_ST`.
    pub fn kqis(&self) -> Vec<&'a Kqi> {
        let st_id = self.st_id();
        let mut found: BTreeMap<&'a str, &'a Kqi> = self
            .graph
            .kqis()
            .filter(|k| k.sous_traitant_id == st_id)
            .map(|k| (k.id(), k))
            .collect();
        for kqi in self.related(st_id, EdgeType::KqiMesureSt, as_kqi) {
            found.insert(kqi.id(), kqi);
        }
        found.into_values().collect()
    }
}

fn as_audit(node: &GraphNode) -> Option<&Audit> {
    match node {
        GraphNode::Audit(a) => Some(a),
        _ => None,
    }
}

fn as_inspection(node: &GraphNode) -> Option<&Inspection> {
    match node {
        GraphNode::Inspection(i) => Some(i),
        _ => None,
    }
}

fn as_finding(node: &GraphNode) -> Option<&Finding> {
    match node {
        GraphNode::Finding(f) => Some(f),
        _ => None,
    }
}

fn as_quality_event(node: &GraphNode) -> Option<&EvenementQualite> {
    match node {
        GraphNode::EvenementQualite(qe) => Some(qe),
        _ => None,
    }
}

fn as_risk_evaluation(node: &GraphNode) -> Option<&EvaluationRisque> {
    match node {
        GraphNode::EvaluationRisque(e) => Some(e),
        _ => None,
    }
}

fn as_quality_agreement(node: &GraphNode) -> Option<&AccordQualite> {
    match node {
        GraphNode::AccordQualite(qa) => Some(qa),
        _ => None,
    }
}

fn as_kqi(node: &GraphNode) -> Option<&Kqi> {
    match node {
        GraphNode::Kqi(k) => Some(k),
        _ => None,
    }
}
