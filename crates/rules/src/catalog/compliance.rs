//! Quality events, regulatory inspections, risk evaluations and quality
//! agreements.

use serde_json::json;

use oversight_core::date::parse_opt_date;
use oversight_core::{Criticite, NodeType};

use crate::alert::{AlertLevel, InferredAlert};
use crate::context::RuleContext;
use crate::rule::Rule;

const QE_SUMMARY_CHARS: usize = 50;

pub(super) fn qe_critique(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<InferredAlert> {
    ctx.quality_events()
        .into_iter()
        .filter(|qe| qe.base.criticite == Some(Criticite::Critique) && !qe.base.is_closed())
        .map(|qe| {
            let text = qe
                .base
                .description
                .as_deref()
                .or(qe.base.nom.as_deref())
                .unwrap_or(&qe.base.id);
            ctx.alert(
                rule,
                &qe.base.id,
                NodeType::EvenementQualite,
                AlertLevel::Haute,
                format!("Événement qualité critique: {}", summarize(text)),
            )
            .dated(qe.date_creation.as_deref())
            .with_metadata(json!({
                "qeId": qe.base.id,
                "impact": qe.impact,
                "description": qe.base.description,
            }))
        })
        .collect()
}

fn summarize(text: &str) -> String {
    if text.chars().count() <= QE_SUMMARY_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(QE_SUMMARY_CHARS).collect();
    format!("{head}...")
}

pub(super) fn inspection_non_conforme(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<InferredAlert> {
    let mut alerts = Vec::new();
    for inspection in ctx.inspections() {
        let critiques = inspection.nb_critiques.unwrap_or(0);
        let (level, description) = if inspection.is_non_conforming() || critiques > 0 {
            (
                AlertLevel::Haute,
                format!(
                    "Inspection {} non conforme ({critiques} observation(s) critique(s))",
                    inspection.autorite.as_deref().unwrap_or("réglementaire")
                ),
            )
        } else if inspection.is_for_cause() {
            (
                AlertLevel::Moyenne,
                "Inspection For Cause conduite chez ce sous-traitant".to_string(),
            )
        } else {
            continue;
        };
        alerts.push(
            ctx.alert(rule, &inspection.base.id, NodeType::Inspection, level, description)
                .dated(inspection.date_fin.as_deref().or(inspection.date_debut.as_deref()))
                .with_metadata(json!({
                    "inspectionId": inspection.base.id,
                    "autorite": inspection.autorite,
                    "resultat": inspection.resultat,
                    "nbCritiques": critiques,
                })),
        );
    }
    alerts
}

pub(super) fn risque_eleve(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<InferredAlert> {
    ctx.risk_evaluations()
        .into_iter()
        .filter(|e| e.is_high())
        .map(|evaluation| {
            ctx.alert(
                rule,
                &evaluation.base.id,
                NodeType::EvaluationRisque,
                AlertLevel::Haute,
                format!("Évaluation de risque élevée pour {}", ctx.st_name()),
            )
            .dated(evaluation.date_evaluation.as_deref())
            .with_metadata(json!({
                "evaluationId": evaluation.base.id,
                "score": evaluation.score,
                "evolution": evaluation.evolution,
            }))
        })
        .collect()
}

pub(super) fn accord_qualite_expire(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<InferredAlert> {
    let mut alerts = Vec::new();
    for qa in ctx.quality_agreements() {
        let Some(end) = parse_opt_date(qa.date_fin.as_deref()) else {
            continue;
        };
        if end >= ctx.as_of {
            continue;
        }
        let in_revision = qa.revision_en_cours.unwrap_or(false);
        let level = if in_revision {
            AlertLevel::Basse
        } else {
            AlertLevel::Moyenne
        };
        alerts.push(
            ctx.alert(
                rule,
                &qa.base.id,
                NodeType::AccordQualite,
                level,
                format!("Accord qualité expiré depuis le {end}"),
            )
            .dated(qa.date_fin.as_deref())
            .with_metadata(json!({
                "accordId": qa.base.id,
                "dateFin": end.to_string(),
                "revisionEnCours": in_revision,
            })),
        );
    }
    alerts
}
