//! Built-in rule catalog.
//!
//! Each variant of [`BuiltinRule`] is one rule; the escalation logic of each
//! is documented on the variant. Bounds come from [`RuleThresholds`].
//!
//! [`RuleThresholds`]: crate::thresholds::RuleThresholds

mod audit;
mod compliance;
mod finding;
mod kqi;

use crate::alert::{AlertLevel, InferredAlert, RuleCategory};
use crate::context::RuleContext;
use crate::error::RuleError;
use crate::rule::Rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinRule {
    /// RGL-001: every "For Cause" audit of the subcontractor. Always HAUTE.
    AuditForCause,
    /// RGL-002: every audit with result "Non satisfaisant". Always HAUTE.
    AuditNonSatisfaisant,
    /// RGL-003: every critical, not closed finding detected more than
    /// `finding_critique_days` ago. Always HAUTE; undated findings are skipped.
    FindingCritiqueOuvert,
    /// RGL-004: one alert on the subcontractor when its open findings exceed
    /// `open_findings.moyenne` (MOYENNE) or `open_findings.haute` (HAUTE).
    FindingsMultiples,
    /// RGL-005: one alert on the subcontractor when at least
    /// `kqi_degradation.moyenne` latest indicators are degrading (MOYENNE),
    /// HAUTE from `kqi_degradation.haute`.
    KqiDegradation,
    /// RGL-006: every latest indicator in Alerte (MOYENNE) or Critique (HAUTE).
    KqiAlerte,
    /// RGL-007: every critical, not closed quality event concerning the
    /// subcontractor. Always HAUTE.
    QeCritique,
    /// RGL-008: every open finding detected more than
    /// `finding_overdue_days.moyenne` days ago (MOYENNE), HAUTE beyond
    /// `finding_overdue_days.haute`.
    FindingOverdue,
    /// RGL-009: every non conforming inspection or inspection with critical
    /// observations (HAUTE); a conforming "For Cause" inspection is MOYENNE.
    InspectionNonConforme,
    /// RGL-010: every risk evaluation scored High. Always HAUTE.
    RisqueEleve,
    /// RGL-011: every quality agreement whose end date is before the
    /// evaluation date: MOYENNE, BASSE while a revision is in progress.
    AccordQualiteExpire,
}

impl BuiltinRule {
    pub const ALL: [BuiltinRule; 11] = [
        BuiltinRule::AuditForCause,
        BuiltinRule::AuditNonSatisfaisant,
        BuiltinRule::FindingCritiqueOuvert,
        BuiltinRule::FindingsMultiples,
        BuiltinRule::KqiDegradation,
        BuiltinRule::KqiAlerte,
        BuiltinRule::QeCritique,
        BuiltinRule::FindingOverdue,
        BuiltinRule::InspectionNonConforme,
        BuiltinRule::RisqueEleve,
        BuiltinRule::AccordQualiteExpire,
    ];

    /// Symbolic name, e.g. `FINDING_OVERDUE`.
    pub fn kind(&self) -> &'static str {
        match self {
            BuiltinRule::AuditForCause => "AUDIT_FOR_CAUSE",
            BuiltinRule::AuditNonSatisfaisant => "AUDIT_NON_SATISFAISANT",
            BuiltinRule::FindingCritiqueOuvert => "FINDING_CRITIQUE_OUVERT",
            BuiltinRule::FindingsMultiples => "FINDINGS_MULTIPLES",
            BuiltinRule::KqiDegradation => "KQI_DEGRADATION",
            BuiltinRule::KqiAlerte => "KQI_ALERTE",
            BuiltinRule::QeCritique => "QE_CRITIQUE",
            BuiltinRule::FindingOverdue => "FINDING_OVERDUE",
            BuiltinRule::InspectionNonConforme => "INSPECTION_NON_CONFORME",
            BuiltinRule::RisqueEleve => "RISQUE_ELEVE",
            BuiltinRule::AccordQualiteExpire => "ACCORD_QUALITE_EXPIRE",
        }
    }

    /// Look up a rule by symbolic name or id (`FINDING_OVERDUE`, `RGL-008`).
    pub fn lookup(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.kind().eq_ignore_ascii_case(key) || r.id().eq_ignore_ascii_case(key))
    }

    /// The whole catalog as trait objects, in id order.
    pub fn all() -> Vec<Box<dyn Rule>> {
        Self::ALL
            .into_iter()
            .map(|r| Box::new(r) as Box<dyn Rule>)
            .collect()
    }
}

impl Rule for BuiltinRule {
    fn id(&self) -> &str {
        match self {
            BuiltinRule::AuditForCause => "RGL-001",
            BuiltinRule::AuditNonSatisfaisant => "RGL-002",
            BuiltinRule::FindingCritiqueOuvert => "RGL-003",
            BuiltinRule::FindingsMultiples => "RGL-004",
            BuiltinRule::KqiDegradation => "RGL-005",
            BuiltinRule::KqiAlerte => "RGL-006",
            BuiltinRule::QeCritique => "RGL-007",
            BuiltinRule::FindingOverdue => "RGL-008",
            BuiltinRule::InspectionNonConforme => "RGL-009",
            BuiltinRule::RisqueEleve => "RGL-010",
            BuiltinRule::AccordQualiteExpire => "RGL-011",
        }
    }

    fn name(&self) -> &str {
        match self {
            BuiltinRule::AuditForCause => "Audit For Cause déclenché",
            BuiltinRule::AuditNonSatisfaisant => "Audit non satisfaisant",
            BuiltinRule::FindingCritiqueOuvert => "Finding critique non clôturé",
            BuiltinRule::FindingsMultiples => "Accumulation de findings",
            BuiltinRule::KqiDegradation => "Dégradation KQI",
            BuiltinRule::KqiAlerte => "KQI en alerte",
            BuiltinRule::QeCritique => "Événement qualité critique",
            BuiltinRule::FindingOverdue => "Finding en retard de clôture",
            BuiltinRule::InspectionNonConforme => "Inspection non conforme",
            BuiltinRule::RisqueEleve => "Risque élevé",
            BuiltinRule::AccordQualiteExpire => "Accord qualité expiré",
        }
    }

    fn description(&self) -> &str {
        match self {
            BuiltinRule::AuditForCause => "Un audit \"For Cause\" a été déclenché pour ce sous-traitant",
            BuiltinRule::AuditNonSatisfaisant => {
                "Un audit s'est terminé avec un résultat non satisfaisant"
            }
            BuiltinRule::FindingCritiqueOuvert => {
                "Un finding critique reste ouvert au-delà du délai acceptable"
            }
            BuiltinRule::FindingsMultiples => "Trop de findings ouverts pour le même sous-traitant",
            BuiltinRule::KqiDegradation => "Plusieurs KQI montrent une tendance à la dégradation",
            BuiltinRule::KqiAlerte => "Un ou plusieurs KQI dépassent le seuil d'alerte",
            BuiltinRule::QeCritique => "Un événement qualité critique impacte ce sous-traitant",
            BuiltinRule::FindingOverdue => "Un finding reste ouvert sans date de clôture",
            BuiltinRule::InspectionNonConforme => {
                "Une inspection réglementaire a relevé une non-conformité"
            }
            BuiltinRule::RisqueEleve => "La dernière évaluation de risque est élevée",
            BuiltinRule::AccordQualiteExpire => "L'accord qualité du sous-traitant est arrivé à échéance",
        }
    }

    fn category(&self) -> RuleCategory {
        match self {
            BuiltinRule::AuditForCause | BuiltinRule::AuditNonSatisfaisant => RuleCategory::Audit,
            BuiltinRule::FindingCritiqueOuvert
            | BuiltinRule::FindingsMultiples
            | BuiltinRule::FindingOverdue => RuleCategory::Finding,
            BuiltinRule::KqiDegradation | BuiltinRule::KqiAlerte => RuleCategory::Kqi,
            BuiltinRule::QeCritique => RuleCategory::Qe,
            BuiltinRule::InspectionNonConforme => RuleCategory::Inspection,
            BuiltinRule::RisqueEleve | BuiltinRule::AccordQualiteExpire => RuleCategory::Global,
        }
    }

    fn default_level(&self) -> AlertLevel {
        match self {
            BuiltinRule::FindingsMultiples
            | BuiltinRule::KqiDegradation
            | BuiltinRule::FindingOverdue
            | BuiltinRule::AccordQualiteExpire => AlertLevel::Moyenne,
            _ => AlertLevel::Haute,
        }
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<InferredAlert>, RuleError> {
        let alerts = match self {
            BuiltinRule::AuditForCause => audit::for_cause(self, ctx),
            BuiltinRule::AuditNonSatisfaisant => audit::non_satisfaisant(self, ctx),
            BuiltinRule::FindingCritiqueOuvert => finding::critique_ouvert(self, ctx),
            BuiltinRule::FindingsMultiples => finding::multiples(self, ctx),
            BuiltinRule::KqiDegradation => kqi::degradation(self, ctx),
            BuiltinRule::KqiAlerte => kqi::alerte(self, ctx),
            BuiltinRule::QeCritique => compliance::qe_critique(self, ctx),
            BuiltinRule::FindingOverdue => finding::overdue(self, ctx),
            BuiltinRule::InspectionNonConforme => compliance::inspection_non_conforme(self, ctx),
            BuiltinRule::RisqueEleve => compliance::risque_eleve(self, ctx),
            BuiltinRule::AccordQualiteExpire => compliance::accord_qualite_expire(self, ctx),
        };
        Ok(alerts)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;
    use oversight_core::{BaseNode, EdgeType, GraphEdge, GraphNode, SousTraitant};
    use oversight_graph::GraphSnapshot;

    pub fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    /// `days` before [`as_of`], ISO formatted.
    pub fn days_ago(days: i64) -> String {
        (as_of() - chrono::Duration::days(days)).format("%Y-%m-%d").to_string()
    }

    pub fn st(id: &str, nom: &str) -> GraphNode {
        let mut base = BaseNode::new(id);
        base.nom = Some(nom.to_string());
        GraphNode::SousTraitant(SousTraitant {
            base,
            ..Default::default()
        })
    }

    pub fn edge(id: &str, source: &str, target: &str, edge_type: EdgeType) -> GraphEdge {
        GraphEdge::new(id, source, target, edge_type)
    }

    pub fn graph(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> GraphSnapshot {
        GraphSnapshot::from_parts(nodes, edges).unwrap()
    }
}
