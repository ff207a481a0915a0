use serde::{Deserialize, Deserializer, Serialize};

/// Discriminant of a knowledge-graph node (`_type` in snapshots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    SousTraitant,
    Contrat,
    AccordQualite,
    Audit,
    Inspection,
    Finding,
    EvenementQualite,
    Decision,
    EvaluationRisque,
    ReunionQualite,
    EtudeClinique,
    DomaineService,
    ContexteReglementaire,
    Alerte,
    Evenement,
    #[serde(rename = "KQI")]
    Kqi,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::SousTraitant => "SousTraitant",
            NodeType::Contrat => "Contrat",
            NodeType::AccordQualite => "AccordQualite",
            NodeType::Audit => "Audit",
            NodeType::Inspection => "Inspection",
            NodeType::Finding => "Finding",
            NodeType::EvenementQualite => "EvenementQualite",
            NodeType::Decision => "Decision",
            NodeType::EvaluationRisque => "EvaluationRisque",
            NodeType::ReunionQualite => "ReunionQualite",
            NodeType::EtudeClinique => "EtudeClinique",
            NodeType::DomaineService => "DomaineService",
            NodeType::ContexteReglementaire => "ContexteReglementaire",
            NodeType::Alerte => "Alerte",
            NodeType::Evenement => "Evenement",
            NodeType::Kqi => "KQI",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relation kinds of the oversight schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    EstSousTraitantDe,
    EstLieAuContrat,
    EstCouvertParQa,
    AVersionSuivante,
    QaAVersionSuivante,
    PossedeService,
    AEteAuditePar,
    AEteInspectePar,
    GenereFinding,
    InspectionGenereFinding,
    QeConcerneSt,
    SurvenuDansEtude,
    QeDeclencheAlerte,
    AuditDeclencheAlerte,
    DecisionJustifieeParAudit,
    DecisionJustifieeParQe,
    DecisionJustifieeParInspection,
    DecisionJustifieeParFinding,
    ResulteDeEvaluation,
    AFaitObjetEvaluation,
    APourContexte,
    AEteSuiviPar,
    ImpliqueSt,
    CauseEvenement,
    EvtConcerneSt,
    KqiMesureSt,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::EstSousTraitantDe => "EST_SOUS_TRAITANT_DE",
            EdgeType::EstLieAuContrat => "EST_LIE_AU_CONTRAT",
            EdgeType::EstCouvertParQa => "EST_COUVERT_PAR_QA",
            EdgeType::AVersionSuivante => "A_VERSION_SUIVANTE",
            EdgeType::QaAVersionSuivante => "QA_A_VERSION_SUIVANTE",
            EdgeType::PossedeService => "POSSEDE_SERVICE",
            EdgeType::AEteAuditePar => "A_ETE_AUDITE_PAR",
            EdgeType::AEteInspectePar => "A_ETE_INSPECTE_PAR",
            EdgeType::GenereFinding => "GENERE_FINDING",
            EdgeType::InspectionGenereFinding => "INSPECTION_GENERE_FINDING",
            EdgeType::QeConcerneSt => "QE_CONCERNE_ST",
            EdgeType::SurvenuDansEtude => "SURVENU_DANS_ETUDE",
            EdgeType::QeDeclencheAlerte => "QE_DECLENCHE_ALERTE",
            EdgeType::AuditDeclencheAlerte => "AUDIT_DECLENCHE_ALERTE",
            EdgeType::DecisionJustifieeParAudit => "DECISION_JUSTIFIEE_PAR_AUDIT",
            EdgeType::DecisionJustifieeParQe => "DECISION_JUSTIFIEE_PAR_QE",
            EdgeType::DecisionJustifieeParInspection => "DECISION_JUSTIFIEE_PAR_INSPECTION",
            EdgeType::DecisionJustifieeParFinding => "DECISION_JUSTIFIEE_PAR_FINDING",
            EdgeType::ResulteDeEvaluation => "RESULTE_DE_EVALUATION",
            EdgeType::AFaitObjetEvaluation => "A_FAIT_OBJET_EVALUATION",
            EdgeType::APourContexte => "A_POUR_CONTEXTE",
            EdgeType::AEteSuiviPar => "A_ETE_SUIVI_PAR",
            EdgeType::ImpliqueSt => "IMPLIQUE_ST",
            EdgeType::CauseEvenement => "CAUSE_EVENEMENT",
            EdgeType::EvtConcerneSt => "EVT_CONCERNE_ST",
            EdgeType::KqiMesureSt => "KQI_MESURE_ST",
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity classification shared by findings, quality events and others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Criticite {
    Critique,
    Majeur,
    Standard,
    Mineur,
}

impl Criticite {
    /// Case-insensitive parse; `None` for empty or unknown labels.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "critique" | "critical" => Some(Criticite::Critique),
            "majeur" | "majeure" | "major" => Some(Criticite::Majeur),
            "standard" => Some(Criticite::Standard),
            "mineur" | "mineure" | "minor" => Some(Criticite::Mineur),
            _ => None,
        }
    }
}

/// Deserialize an optional criticité, treating `""` and unknown labels as absent.
pub(crate) fn deserialize_criticite<'de, D>(deserializer: D) -> Result<Option<Criticite>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|s| {
        let parsed = Criticite::parse(s);
        if parsed.is_none() && !s.trim().is_empty() {
            tracing::warn!(criticite = %s, "unrecognized criticite, treated as absent");
        }
        parsed
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_uses_schema_names() {
        let json = serde_json::to_string(&NodeType::Kqi).unwrap();
        assert_eq!(json, "\"KQI\"");
        let parsed: NodeType = serde_json::from_str("\"EvenementQualite\"").unwrap();
        assert_eq!(parsed, NodeType::EvenementQualite);
    }

    #[test]
    fn edge_type_display_matches_serde() {
        for edge_type in [
            EdgeType::AEteAuditePar,
            EdgeType::QeDeclencheAlerte,
            EdgeType::KqiMesureSt,
            EdgeType::DecisionJustifieeParInspection,
        ] {
            let json = serde_json::to_string(&edge_type).unwrap();
            assert_eq!(json, format!("\"{}\"", edge_type));
        }
    }

    #[test]
    fn criticite_parse_is_lenient() {
        assert_eq!(Criticite::parse("CRITIQUE"), Some(Criticite::Critique));
        assert_eq!(Criticite::parse(" Majeur "), Some(Criticite::Majeur));
        assert_eq!(Criticite::parse(""), None);
        assert_eq!(Criticite::parse("???"), None);
    }
}
