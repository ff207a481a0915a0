use serde_json::json;

use oversight_core::NodeType;

use crate::alert::{AlertLevel, InferredAlert};
use crate::context::RuleContext;
use crate::rule::Rule;

pub(super) fn for_cause(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<InferredAlert> {
    ctx.audits()
        .into_iter()
        .filter(|audit| audit.is_for_cause())
        .map(|audit| {
            let nom = audit.base.nom.as_deref().unwrap_or(&audit.base.id);
            ctx.alert(
                rule,
                &audit.base.id,
                NodeType::Audit,
                AlertLevel::Haute,
                format!("Audit For Cause \"{nom}\" déclenché pour {}", ctx.st_name()),
            )
            .dated(audit.date_debut.as_deref())
            .with_metadata(json!({
                "auditId": audit.base.id,
                "auditName": audit.base.nom,
                "declencheur": audit.declencheur,
            }))
        })
        .collect()
}

pub(super) fn non_satisfaisant(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<InferredAlert> {
    ctx.audits()
        .into_iter()
        .filter(|audit| audit.is_unsatisfactory())
        .map(|audit| {
            let nom = audit.base.nom.as_deref().unwrap_or(&audit.base.id);
            ctx.alert(
                rule,
                &audit.base.id,
                NodeType::Audit,
                AlertLevel::Haute,
                format!("Audit \"{nom}\" avec résultat non satisfaisant"),
            )
            .dated(audit.date_fin.as_deref())
            .with_metadata(json!({
                "auditId": audit.base.id,
                "resultat": audit.resultat,
            }))
        })
        .collect()
}
