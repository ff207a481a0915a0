use serde::{Deserialize, Serialize};

use crate::node::BaseNode;
use crate::normalize::{deserialize_statut, deserialize_tendance, KqiStatut, Tendance};

/// One periodic Key Quality Indicator measurement for a subcontractor.
///
/// Measurements sharing `(sous_traitant_id, indicateur)` form a time series
/// ordered by `periode`. `statut` and `tendance` pass through the
/// normalization layer on deserialization, so legacy labels are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kqi {
    #[serde(flatten)]
    pub base: BaseNode,
    #[serde(default)]
    pub sous_traitant_id: String,
    #[serde(default)]
    pub sous_traitant_nom: String,
    #[serde(default)]
    pub indicateur: String,
    /// Sortable period label such as `2024-Q3` or `2024-07`.
    #[serde(default)]
    pub periode: String,
    #[serde(default)]
    pub valeur: f64,
    #[serde(default)]
    pub seuil_alerte: f64,
    #[serde(default)]
    pub seuil_objectif: f64,
    #[serde(default, deserialize_with = "deserialize_statut")]
    pub statut: KqiStatut,
    #[serde(default, deserialize_with = "deserialize_tendance")]
    pub tendance: Tendance,
}

impl Kqi {
    pub fn new(
        id: impl Into<String>,
        sous_traitant_id: impl Into<String>,
        indicateur: impl Into<String>,
        periode: impl Into<String>,
        statut: KqiStatut,
        tendance: Tendance,
    ) -> Self {
        Self {
            base: BaseNode::new(id),
            sous_traitant_id: sous_traitant_id.into(),
            sous_traitant_nom: String::new(),
            indicateur: indicateur.into(),
            periode: periode.into(),
            valeur: 0.0,
            seuil_alerte: 0.0,
            seuil_objectif: 0.0,
            statut,
            tendance,
        }
    }

    pub fn id(&self) -> &str {
        &self.base.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_labels_are_normalized_on_load() {
        let kqi: Kqi = serde_json::from_str(
            r#"{
                "id": "KQI-1",
                "sous_traitant_id": "ST-001",
                "sous_traitant_nom": "Labo Alpha",
                "indicateur": "Taux de conformité",
                "periode": "2024-Q3",
                "valeur": 87.5,
                "seuil_alerte": 80,
                "seuil_objectif": 95,
                "statut": "À surveiller",
                "tendance": "↓ Dégradation"
            }"#,
        )
        .unwrap();

        assert_eq!(kqi.id(), "KQI-1");
        assert_eq!(kqi.statut, KqiStatut::Attention);
        assert_eq!(kqi.tendance, Tendance::Degradation);
        assert_eq!(kqi.seuil_alerte, 80.0);
    }

    #[test]
    fn missing_labels_default_to_neutral() {
        let kqi: Kqi = serde_json::from_str(
            r#"{"id": "KQI-2", "sous_traitant_id": "ST-001", "indicateur": "Délai", "periode": "2024-Q1", "statut": null}"#,
        )
        .unwrap();
        assert_eq!(kqi.statut, KqiStatut::Ok);
        assert_eq!(kqi.tendance, Tendance::Stable);
    }

    #[test]
    fn serializes_canonical_labels() {
        let kqi = Kqi::new("K", "ST", "Délai", "2024-Q2", KqiStatut::Ok, Tendance::Amelioration);
        let value = serde_json::to_value(&kqi).unwrap();
        assert_eq!(value["statut"], "OK");
        assert_eq!(value["tendance"], "Amélioration");
        assert!(value.get("nom").is_none());
    }
}
