use serde_json::json;
use tracing::debug;

use oversight_core::{Criticite, NodeType};

use crate::alert::{AlertLevel, InferredAlert};
use crate::context::RuleContext;
use crate::rule::Rule;

pub(super) fn critique_ouvert(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<InferredAlert> {
    let max_days = i64::from(ctx.thresholds.finding_critique_days);
    let mut alerts = Vec::new();
    for finding in ctx.findings() {
        if finding.base.criticite != Some(Criticite::Critique) || finding.base.is_closed() {
            continue;
        }
        let Some(days) = ctx.days_since(finding.date_detection.as_deref()) else {
            debug!(finding_id = %finding.base.id, "critical finding without detection date");
            continue;
        };
        if days <= max_days {
            continue;
        }
        alerts.push(
            ctx.alert(
                rule,
                &finding.base.id,
                NodeType::Finding,
                AlertLevel::Haute,
                format!("Finding critique ouvert depuis {days} jours"),
            )
            .dated(finding.date_detection.as_deref())
            .with_metadata(json!({
                "findingId": finding.base.id,
                "daysSinceDetection": days,
                "description": finding.base.description,
            })),
        );
    }
    alerts
}

pub(super) fn multiples(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<InferredAlert> {
    let bounds = ctx.thresholds.open_findings;
    let open: Vec<&str> = ctx
        .findings()
        .into_iter()
        .filter(|f| f.is_open())
        .map(|f| f.base.id.as_str())
        .collect();
    let count = open.len();
    if count <= bounds.moyenne {
        return Vec::new();
    }
    let level = if count > bounds.haute {
        AlertLevel::Haute
    } else {
        AlertLevel::Moyenne
    };
    vec![ctx
        .st_alert(
            rule,
            level,
            format!("{count} findings ouverts pour {}", ctx.st_name()),
        )
        .with_metadata(json!({ "count": count, "findingIds": open }))]
}

pub(super) fn overdue(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<InferredAlert> {
    let bounds = ctx.thresholds.finding_overdue_days;
    let mut alerts = Vec::new();
    for finding in ctx.findings() {
        if !finding.is_open() {
            continue;
        }
        let Some(days) = ctx.days_since(finding.date_detection.as_deref()) else {
            continue;
        };
        let level = if days > i64::from(bounds.haute) {
            AlertLevel::Haute
        } else if days > i64::from(bounds.moyenne) {
            AlertLevel::Moyenne
        } else {
            continue;
        };
        alerts.push(
            ctx.alert(
                rule,
                &finding.base.id,
                NodeType::Finding,
                level,
                format!("Finding ouvert depuis {days} jours sans clôture"),
            )
            .dated(finding.date_detection.as_deref())
            .with_metadata(json!({
                "findingId": finding.base.id,
                "daysOpen": days,
                "capaId": finding.capa_id,
            })),
        );
    }
    alerts
}
