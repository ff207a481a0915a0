//! Knowledge-graph node and edge model.
//!
//! A node is a tagged union over the 16 entity kinds of the oversight schema,
//! discriminated by the `_type` field. Every variant shares [`BaseNode`];
//! type-specific fields are optional because imported data is frequently
//! sparse. Fields not known to the model survive in [`BaseNode::extra`].

use serde::{Deserialize, Serialize};

use crate::entity::{deserialize_criticite, Criticite, EdgeType, NodeType};
use crate::kqi::Kqi;

/// Fields common to every node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statut: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_criticite",
        skip_serializing_if = "Option::is_none"
    )]
    pub criticite: Option<Criticite>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_donnees: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BaseNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Whether `statut` marks the item as closed ("Clôturé", "Cloturée", "Closed", ...).
    pub fn is_closed(&self) -> bool {
        self.statut.as_deref().map(is_closed_label).unwrap_or(false)
    }
}

fn is_closed_label(statut: &str) -> bool {
    let folded: String = statut
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'ô' => 'o',
            'é' | 'è' => 'e',
            other => other,
        })
        .collect();
    folded.starts_with("clotur") || folded == "closed" || folded == "ferme"
}

// ── Variant payloads ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SousTraitant {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_creation: Option<String>,
    pub type_service: Option<String>,
    pub pays: Option<String>,
    /// 1 = direct, 2 = indirect subcontracting tier.
    pub niveau_actuel: Option<u8>,
}

impl SousTraitant {
    /// Display name, falling back to the id.
    pub fn name(&self) -> &str {
        self.base.nom.as_deref().unwrap_or(&self.base.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contrat {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_debut: Option<String>,
    pub date_fin: Option<String>,
    pub type_contrat: Option<String>,
    pub montant_annuel: Option<String>,
    pub version: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccordQualite {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_debut: Option<String>,
    pub date_fin: Option<String>,
    pub version: Option<u32>,
    pub revision_en_cours: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_debut: Option<String>,
    pub date_fin: Option<String>,
    /// Qualification, Routine, For Cause or Remote.
    pub type_audit: Option<String>,
    /// Satisfaisant, Satisfaisant avec observations or Non satisfaisant.
    pub resultat: Option<String>,
    pub declencheur: Option<String>,
}

impl Audit {
    pub fn is_for_cause(&self) -> bool {
        label_eq(self.type_audit.as_deref(), "for cause")
    }

    pub fn is_unsatisfactory(&self) -> bool {
        label_eq(self.resultat.as_deref(), "non satisfaisant")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_debut: Option<String>,
    pub date_fin: Option<String>,
    pub autorite: Option<String>,
    /// Routine, For Cause or Pre-Approval.
    pub type_inspection: Option<String>,
    /// Conforme or Non conforme.
    pub resultat: Option<String>,
    pub nb_observations: Option<u32>,
    pub nb_critiques: Option<u32>,
}

impl Inspection {
    pub fn is_for_cause(&self) -> bool {
        label_eq(self.type_inspection.as_deref(), "for cause")
    }

    pub fn is_non_conforming(&self) -> bool {
        label_eq(self.resultat.as_deref(), "non conforme")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_detection: Option<String>,
    pub date_cloture: Option<String>,
    pub capa_id: Option<String>,
    pub concerne_st2: Option<String>,
}

impl Finding {
    /// Open means neither a closing date nor a closed status.
    pub fn is_open(&self) -> bool {
        let has_closing_date = self
            .date_cloture
            .as_deref()
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false);
        !has_closing_date && !self.base.is_closed()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvenementQualite {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_creation: Option<String>,
    pub date_cloture: Option<String>,
    /// Faible, Moyen or Élevé.
    pub impact: Option<String>,
    pub nb_echantillons_impactes: Option<u32>,
    pub retard_jours: Option<f64>,
    pub nb_erreurs: Option<u32>,
    pub delai_detection_mois: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_decision: Option<String>,
    pub decideur: Option<String>,
    pub nature: Option<String>,
    pub duree_mois: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRisque {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_evaluation: Option<String>,
    /// Low, Medium or High.
    pub score: Option<String>,
    pub evolution: Option<String>,
    pub findings_critiques: Option<u32>,
    pub qe_critiques: Option<u32>,
    pub kqi_alertes: Option<u32>,
    pub inspection_recente: Option<bool>,
    pub audit_for_cause: Option<bool>,
    pub prochaine_evaluation: Option<String>,
}

impl EvaluationRisque {
    pub fn is_high(&self) -> bool {
        let score = self.score.as_deref();
        label_eq(score, "high") || label_eq(score, "élevé") || label_eq(score, "haut")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReunionQualite {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_reunion: Option<String>,
    pub trimestre: Option<String>,
    pub semestre: Option<String>,
    pub periodicite: Option<String>,
    pub motif: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EtudeClinique {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_debut: Option<String>,
    pub date_fin: Option<String>,
    pub phase: Option<String>,
    pub indication: Option<String>,
    pub nb_patients: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomaineService {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_creation: Option<String>,
    pub categorie: Option<String>,
    pub complexite: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContexteReglementaire {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_application: Option<String>,
    pub reference: Option<String>,
    pub impact: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alerte {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_creation: Option<String>,
    pub date_resolution: Option<String>,
    pub niveau: Option<String>,
    pub regle_id: Option<String>,
    pub declencheur: Option<String>,
    pub st_concerne: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evenement {
    #[serde(flatten)]
    pub base: BaseNode,
    pub date_creation: Option<String>,
    pub date_cloture: Option<String>,
    pub type_evenement: Option<String>,
    pub source: Option<String>,
    pub impact: Option<String>,
}

fn label_eq(value: Option<&str>, expected: &str) -> bool {
    value
        .map(|v| v.trim().to_lowercase() == expected)
        .unwrap_or(false)
}

// ── Tagged union ────────────────────────────────────────────────────

/// A knowledge-graph node, tagged by `_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum GraphNode {
    SousTraitant(SousTraitant),
    Contrat(Contrat),
    AccordQualite(AccordQualite),
    Audit(Audit),
    Inspection(Inspection),
    Finding(Finding),
    EvenementQualite(EvenementQualite),
    Decision(Decision),
    EvaluationRisque(EvaluationRisque),
    ReunionQualite(ReunionQualite),
    EtudeClinique(EtudeClinique),
    DomaineService(DomaineService),
    ContexteReglementaire(ContexteReglementaire),
    Alerte(Alerte),
    Evenement(Evenement),
    #[serde(rename = "KQI")]
    Kqi(Kqi),
}

macro_rules! with_base {
    ($node:expr, $b:ident => $body:expr) => {
        match $node {
            GraphNode::SousTraitant(n) => { let $b = &n.base; $body }
            GraphNode::Contrat(n) => { let $b = &n.base; $body }
            GraphNode::AccordQualite(n) => { let $b = &n.base; $body }
            GraphNode::Audit(n) => { let $b = &n.base; $body }
            GraphNode::Inspection(n) => { let $b = &n.base; $body }
            GraphNode::Finding(n) => { let $b = &n.base; $body }
            GraphNode::EvenementQualite(n) => { let $b = &n.base; $body }
            GraphNode::Decision(n) => { let $b = &n.base; $body }
            GraphNode::EvaluationRisque(n) => { let $b = &n.base; $body }
            GraphNode::ReunionQualite(n) => { let $b = &n.base; $body }
            GraphNode::EtudeClinique(n) => { let $b = &n.base; $body }
            GraphNode::DomaineService(n) => { let $b = &n.base; $body }
            GraphNode::ContexteReglementaire(n) => { let $b = &n.base; $body }
            GraphNode::Alerte(n) => { let $b = &n.base; $body }
            GraphNode::Evenement(n) => { let $b = &n.base; $body }
            GraphNode::Kqi(n) => { let $b = &n.base; $body }
        }
    };
}

impl GraphNode {
    pub fn base(&self) -> &BaseNode {
        with_base!(self, b => b)
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            GraphNode::SousTraitant(_) => NodeType::SousTraitant,
            GraphNode::Contrat(_) => NodeType::Contrat,
            GraphNode::AccordQualite(_) => NodeType::AccordQualite,
            GraphNode::Audit(_) => NodeType::Audit,
            GraphNode::Inspection(_) => NodeType::Inspection,
            GraphNode::Finding(_) => NodeType::Finding,
            GraphNode::EvenementQualite(_) => NodeType::EvenementQualite,
            GraphNode::Decision(_) => NodeType::Decision,
            GraphNode::EvaluationRisque(_) => NodeType::EvaluationRisque,
            GraphNode::ReunionQualite(_) => NodeType::ReunionQualite,
            GraphNode::EtudeClinique(_) => NodeType::EtudeClinique,
            GraphNode::DomaineService(_) => NodeType::DomaineService,
            GraphNode::ContexteReglementaire(_) => NodeType::ContexteReglementaire,
            GraphNode::Alerte(_) => NodeType::Alerte,
            GraphNode::Evenement(_) => NodeType::Evenement,
            GraphNode::Kqi(_) => NodeType::Kqi,
        }
    }

    /// `nom`, else `description`, else the id.
    pub fn label(&self) -> &str {
        let base = self.base();
        base.nom
            .as_deref()
            .or(base.description.as_deref())
            .unwrap_or(&base.id)
    }

    pub fn criticite(&self) -> Option<Criticite> {
        self.base().criticite
    }
}

// ── Edges ───────────────────────────────────────────────────────────

/// A typed relation between two nodes.
///
/// `source`/`target` may reference ids missing from the snapshot; traversal
/// skips such edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "_type")]
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_lien: Option<String>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl GraphEdge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        edge_type: EdgeType,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type,
            date_lien: None,
            attributes: serde_json::Map::new(),
        }
    }

    /// The endpoint opposite `node_id`, if the edge touches it.
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            Some(&self.target)
        } else if self.target == node_id {
            Some(&self.source)
        } else {
            None
        }
    }
}
