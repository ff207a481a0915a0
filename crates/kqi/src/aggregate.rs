use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use oversight_core::{Kqi, KqiStatut, Tendance};

use crate::period::is_sortable_period;

/// Overall KQI health of one subcontractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KqiStatus {
    Good,
    Warning,
    Critical,
}

impl KqiStatus {
    /// French display label.
    pub fn label(&self) -> &'static str {
        match self {
            KqiStatus::Good => "OK",
            KqiStatus::Warning => "Attention",
            KqiStatus::Critical => "Critique",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KqiStatus::Good => "good",
            KqiStatus::Warning => "warning",
            KqiStatus::Critical => "critical",
        }
    }
}

impl std::fmt::Display for KqiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status summary over the latest measurement of each indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KqiAggregation {
    pub st_id: String,
    pub status: KqiStatus,
    pub total_count: usize,
    pub alert_count: usize,
    pub warning_count: usize,
    pub ok_count: usize,
    pub degrading_count: usize,
    /// Greatest period among the latest measurements, empty without data.
    pub latest_period: String,
}

impl KqiAggregation {
    /// The "no data" aggregation: fully compliant.
    pub fn empty(st_id: impl Into<String>) -> Self {
        Self {
            st_id: st_id.into(),
            status: KqiStatus::Good,
            total_count: 0,
            alert_count: 0,
            warning_count: 0,
            ok_count: 0,
            degrading_count: 0,
            latest_period: String::new(),
        }
    }
}

/// The measurement with the greatest `periode` per indicator, ordered by
/// indicator name. On equal periods the first measurement seen wins.
pub fn latest_by_indicator<'a>(measurements: impl IntoIterator<Item = &'a Kqi>) -> Vec<&'a Kqi> {
    let mut latest: BTreeMap<&str, &Kqi> = BTreeMap::new();
    for kqi in measurements {
        if !is_sortable_period(&kqi.periode) {
            warn!(
                kqi_id = kqi.id(),
                periode = %kqi.periode,
                "period label is not year-first; latest-period selection may be wrong"
            );
        }
        latest
            .entry(kqi.indicateur.as_str())
            .and_modify(|current| {
                if kqi.periode > current.periode {
                    *current = kqi;
                }
            })
            .or_insert(kqi);
    }
    latest.into_values().collect()
}

/// Aggregate the measurements of `entity_id` out of `measurements`.
pub fn aggregate_for_entity(measurements: &[Kqi], entity_id: &str) -> KqiAggregation {
    let latest = latest_by_indicator(
        measurements
            .iter()
            .filter(|k| k.sous_traitant_id == entity_id),
    );
    if latest.is_empty() {
        return KqiAggregation::empty(entity_id);
    }

    let alert_count = latest.iter().filter(|k| k.statut.is_alert()).count();
    let warning_count = latest
        .iter()
        .filter(|k| k.statut == KqiStatut::Attention)
        .count();
    let ok_count = latest.iter().filter(|k| k.statut == KqiStatut::Ok).count();
    let degrading_count = latest
        .iter()
        .filter(|k| k.tendance == Tendance::Degradation)
        .count();

    let status = if alert_count > 0 {
        KqiStatus::Critical
    } else if warning_count > 0 || degrading_count > 0 {
        KqiStatus::Warning
    } else {
        KqiStatus::Good
    };

    let latest_period = latest
        .iter()
        .map(|k| k.periode.as_str())
        .max()
        .unwrap_or_default()
        .to_string();

    KqiAggregation {
        st_id: entity_id.to_string(),
        status,
        total_count: latest.len(),
        alert_count,
        warning_count,
        ok_count,
        degrading_count,
        latest_period,
    }
}

/// Aggregate every id in `entity_ids`, in parallel.
pub fn aggregate_all_entities<S>(measurements: &[Kqi], entity_ids: &[S]) -> BTreeMap<String, KqiAggregation>
where
    S: AsRef<str> + Sync,
{
    let aggregations: BTreeMap<String, KqiAggregation> = entity_ids
        .par_iter()
        .map(|id| {
            let agg = aggregate_for_entity(measurements, id.as_ref());
            (agg.st_id.clone(), agg)
        })
        .collect();
    debug!(
        entities = aggregations.len(),
        measurements = measurements.len(),
        "KQI aggregation complete"
    );
    aggregations
}
