use serde_json::json;

use oversight_core::{KqiStatut, NodeType, Tendance};
use oversight_kqi::latest_by_indicator;

use crate::alert::{AlertLevel, InferredAlert};
use crate::context::RuleContext;
use crate::rule::Rule;

pub(super) fn degradation(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<InferredAlert> {
    let bounds = ctx.thresholds.kqi_degradation;
    let degrading: Vec<_> = latest_by_indicator(ctx.kqis())
        .into_iter()
        .filter(|k| k.tendance == Tendance::Degradation)
        .collect();
    let count = degrading.len();
    if count == 0 || count < bounds.moyenne {
        return Vec::new();
    }
    let level = if count >= bounds.haute {
        AlertLevel::Haute
    } else {
        AlertLevel::Moyenne
    };
    let indicators: Vec<_> = degrading
        .iter()
        .map(|k| json!({ "name": k.indicateur, "value": k.valeur, "status": k.statut }))
        .collect();
    vec![ctx
        .st_alert(
            rule,
            level,
            format!("{count} indicateurs en dégradation pour {}", ctx.st_name()),
        )
        .with_metadata(json!({ "indicators": indicators }))]
}

pub(super) fn alerte(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<InferredAlert> {
    latest_by_indicator(ctx.kqis())
        .into_iter()
        .filter(|k| k.statut.is_alert())
        .map(|k| {
            let level = if k.statut == KqiStatut::Critique {
                AlertLevel::Haute
            } else {
                AlertLevel::Moyenne
            };
            ctx.alert(
                rule,
                k.id(),
                NodeType::Kqi,
                level,
                format!("KQI \"{}\" en {} (valeur: {})", k.indicateur, k.statut, k.valeur),
            )
            .with_metadata(json!({
                "indicateur": k.indicateur,
                "periode": k.periode,
                "valeur": k.valeur,
                "seuil_alerte": k.seuil_alerte,
                "seuil_objectif": k.seuil_objectif,
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::super::BuiltinRule;
    use super::*;
    use crate::thresholds::RuleThresholds;
    use oversight_core::{GraphNode, Kqi};

    fn kqi(id: &str, indicateur: &str, periode: &str, statut: KqiStatut, tendance: Tendance) -> GraphNode {
        GraphNode::Kqi(Kqi::new(id, "ST-1", indicateur, periode, statut, tendance))
    }

    fn run(rule: BuiltinRule, kqis: Vec<GraphNode>) -> Vec<InferredAlert> {
        let mut nodes = vec![st("ST-1", "Labo"), st("ST-2", "Autre")];
        nodes.extend(kqis);
        let graph = graph(nodes, vec![]);
        let thresholds = RuleThresholds::default();
        let st1 = graph.sous_traitant("ST-1").unwrap();
        let ctx = RuleContext::new(&graph, st1, as_of(), &thresholds);
        rule.evaluate(&ctx).unwrap()
    }

    #[test]
    fn degradation_counts_latest_period_only() {
        let kqis = vec![
            kqi("K1", "Délai", "2024-Q1", KqiStatut::Ok, Tendance::Degradation),
            kqi("K2", "Délai", "2024-Q2", KqiStatut::Ok, Tendance::Stable),
            kqi("K3", "Conformité", "2024-Q2", KqiStatut::Ok, Tendance::Degradation),
        ];
        assert!(run(BuiltinRule::KqiDegradation, kqis).is_empty());

        let kqis = vec![
            kqi("K1", "Délai", "2024-Q2", KqiStatut::Ok, Tendance::Degradation),
            kqi("K3", "Conformité", "2024-Q2", KqiStatut::Ok, Tendance::Degradation),
        ];
        let alerts = run(BuiltinRule::KqiDegradation, kqis);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Moyenne);
        assert_eq!(alerts[0].metadata["indicators"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn three_degrading_indicators_escalate() {
        let kqis = ["A", "B", "C"]
            .iter()
            .map(|name| kqi(&format!("K-{name}"), name, "2024-Q1", KqiStatut::Ok, Tendance::Degradation))
            .collect();
        let alerts = run(BuiltinRule::KqiDegradation, kqis);
        assert_eq!(alerts[0].level, AlertLevel::Haute);
    }

    #[test]
    fn one_alert_per_indicator_in_alert() {
        let kqis = vec![
            kqi("K1", "Délai", "2024-Q1", KqiStatut::Critique, Tendance::Stable),
            kqi("K2", "Délai", "2024-Q2", KqiStatut::Alerte, Tendance::Stable),
            kqi("K3", "Conformité", "2024-Q2", KqiStatut::Critique, Tendance::Stable),
            kqi("K4", "Retours", "2024-Q2", KqiStatut::Attention, Tendance::Stable),
        ];
        let alerts = run(BuiltinRule::KqiAlerte, kqis);
        let summary: Vec<(&str, AlertLevel)> = alerts
            .iter()
            .map(|a| (a.trigger_node_id.as_str(), a.level))
            .collect();
        assert_eq!(summary, vec![("K3", AlertLevel::Haute), ("K2", AlertLevel::Moyenne)]);
        assert_eq!(alerts[0].trigger_node_type, NodeType::Kqi);
        assert_eq!(alerts[0].created_at.date_naive(), as_of());
    }
}
