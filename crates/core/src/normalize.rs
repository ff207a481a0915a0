//! Canonicalization of free-text KQI status and trend labels.
//!
//! Upstream data (CSV exports, legacy caches, hand-edited sheets) carries
//! labels such as `"Conforme"`, `"À surveiller"` or `"↓ Dégradation"`. The
//! functions here map any input onto the closed [`KqiStatut`] / [`Tendance`]
//! enumerations. They are total: unrecognized input falls back to the
//! neutral value and is reported through `tracing` as a data-quality signal.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Canonical KQI status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum KqiStatut {
    #[default]
    #[serde(rename = "OK")]
    Ok,
    Attention,
    Alerte,
    Critique,
}

impl KqiStatut {
    pub const ALL: [KqiStatut; 4] = [
        KqiStatut::Ok,
        KqiStatut::Attention,
        KqiStatut::Alerte,
        KqiStatut::Critique,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KqiStatut::Ok => "OK",
            KqiStatut::Attention => "Attention",
            KqiStatut::Alerte => "Alerte",
            KqiStatut::Critique => "Critique",
        }
    }

    /// `Alerte` or `Critique`.
    pub fn is_alert(&self) -> bool {
        matches!(self, KqiStatut::Alerte | KqiStatut::Critique)
    }
}

impl std::fmt::Display for KqiStatut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical KQI trend across periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Tendance {
    #[serde(rename = "Amélioration")]
    Amelioration,
    #[default]
    Stable,
    #[serde(rename = "Dégradation")]
    Degradation,
}

impl Tendance {
    pub const ALL: [Tendance; 3] = [Tendance::Amelioration, Tendance::Stable, Tendance::Degradation];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tendance::Amelioration => "Amélioration",
            Tendance::Stable => "Stable",
            Tendance::Degradation => "Dégradation",
        }
    }
}

impl std::fmt::Display for Tendance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Synonym tables ──────────────────────────────────────────────────

const STATUT_SYNONYMS: &[(&str, KqiStatut)] = &[
    ("ok", KqiStatut::Ok),
    ("attention", KqiStatut::Attention),
    ("alerte", KqiStatut::Alerte),
    ("critique", KqiStatut::Critique),
    // legacy CSV labels
    ("conforme", KqiStatut::Ok),
    ("à surveiller", KqiStatut::Attention),
    ("a surveiller", KqiStatut::Attention),
    // english and assessment wording
    ("good", KqiStatut::Ok),
    ("warning", KqiStatut::Attention),
    ("alert", KqiStatut::Alerte),
    ("critical", KqiStatut::Critique),
    ("satisfaisant", KqiStatut::Ok),
    ("non satisfaisant", KqiStatut::Critique),
];

const TENDANCE_SYNONYMS: &[(&str, Tendance)] = &[
    ("amélioration", Tendance::Amelioration),
    ("stable", Tendance::Stable),
    ("dégradation", Tendance::Degradation),
    ("amelioration", Tendance::Amelioration),
    ("degradation", Tendance::Degradation),
    ("improvement", Tendance::Amelioration),
    ("degrading", Tendance::Degradation),
    ("declining", Tendance::Degradation),
];

fn lookup<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

// ── Normalization ───────────────────────────────────────────────────

/// Map any status label onto [`KqiStatut`].
///
/// Empty or missing input yields `OK`. Exact synonyms win over keyword
/// fallback; `"Conforme"` → `OK`, `"À surveiller"` → `Attention`.
pub fn normalize_statut(raw: Option<&str>) -> KqiStatut {
    let Some(raw) = raw else {
        return KqiStatut::Ok;
    };
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        return KqiStatut::Ok;
    }
    if let Some(statut) = lookup(STATUT_SYNONYMS, &key) {
        return statut;
    }

    if key.contains("critique") || key.contains("critical") {
        return KqiStatut::Critique;
    }
    if key.contains("alerte") || key.contains("alert") {
        return KqiStatut::Alerte;
    }
    if key.contains("attention") || key.contains("warning") || key.contains("surveiller") {
        return KqiStatut::Attention;
    }

    warn!(statut = %raw, "unrecognized KQI statut, normalized to OK");
    KqiStatut::Ok
}

/// Map any trend label onto [`Tendance`].
///
/// Arrow prefixes are honoured (`↑` improvement, `↓` degradation, `→`/`-`
/// stable). Empty or missing input yields `Stable`.
pub fn normalize_tendance(raw: Option<&str>) -> Tendance {
    let Some(raw) = raw else {
        return Tendance::Stable;
    };
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        return Tendance::Stable;
    }
    if let Some(tendance) = lookup(TENDANCE_SYNONYMS, &key) {
        return tendance;
    }

    if key.contains('↑') {
        return Tendance::Amelioration;
    }
    if key.contains('↓') {
        return Tendance::Degradation;
    }
    if key.contains('→') || key.contains('−') || key.contains('-') {
        return Tendance::Stable;
    }

    if key.contains("amélioration") || key.contains("amelioration") || key.contains("improv") {
        return Tendance::Amelioration;
    }
    if key.contains("dégradation") || key.contains("degradation") || key.contains("declin") {
        return Tendance::Degradation;
    }

    warn!(tendance = %raw, "unrecognized KQI tendance, normalized to Stable");
    Tendance::Stable
}

/// True when `raw` is already one of the canonical status labels.
pub fn is_statut_normalized(raw: &str) -> bool {
    KqiStatut::ALL.iter().any(|s| s.as_str() == raw)
}

/// True when `raw` is already one of the canonical trend labels.
pub fn is_tendance_normalized(raw: &str) -> bool {
    Tendance::ALL.iter().any(|t| t.as_str() == raw)
}

// ── serde boundary ──────────────────────────────────────────────────

/// Deserialize a status through [`normalize_statut`]; null and missing map to `OK`.
pub fn deserialize_statut<'de, D>(deserializer: D) -> Result<KqiStatut, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(normalize_statut(raw.as_deref()))
}

/// Deserialize a trend through [`normalize_tendance`]; null and missing map to `Stable`.
pub fn deserialize_tendance<'de, D>(deserializer: D) -> Result<Tendance, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(normalize_tendance(raw.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statut_canonical_values_are_identity() {
        for statut in KqiStatut::ALL {
            assert_eq!(normalize_statut(Some(statut.as_str())), statut);
            assert!(is_statut_normalized(statut.as_str()));
        }
    }

    #[test]
    fn statut_legacy_labels() {
        assert_eq!(normalize_statut(Some("Conforme")), KqiStatut::Ok);
        assert_eq!(normalize_statut(Some("À surveiller")), KqiStatut::Attention);
        assert_eq!(normalize_statut(Some("a surveiller")), KqiStatut::Attention);
        assert_eq!(normalize_statut(Some("Non satisfaisant")), KqiStatut::Critique);
        assert_eq!(normalize_statut(Some("  WARNING ")), KqiStatut::Attention);
    }

    #[test]
    fn statut_keyword_fallback() {
        assert_eq!(normalize_statut(Some("Niveau critique atteint")), KqiStatut::Critique);
        assert_eq!(normalize_statut(Some("CRITICAL!!")), KqiStatut::Critique);
        assert_eq!(normalize_statut(Some("en alerte")), KqiStatut::Alerte);
        assert_eq!(normalize_statut(Some("sous surveiller")), KqiStatut::Attention);
    }

    #[test]
    fn statut_defaults_for_missing_and_gibberish() {
        assert_eq!(normalize_statut(None), KqiStatut::Ok);
        assert_eq!(normalize_statut(Some("")), KqiStatut::Ok);
        assert_eq!(normalize_statut(Some("   ")), KqiStatut::Ok);
        assert_eq!(normalize_statut(Some("zzqx 42")), KqiStatut::Ok);
    }

    #[test]
    fn tendance_symbols_and_accents() {
        assert_eq!(normalize_tendance(Some("↑ Amélioration")), Tendance::Amelioration);
        assert_eq!(normalize_tendance(Some("↓ Dégradation")), Tendance::Degradation);
        assert_eq!(normalize_tendance(Some("→ Stable")), Tendance::Stable);
        assert_eq!(normalize_tendance(Some("DÉGRADATION")), Tendance::Degradation);
        assert_eq!(normalize_tendance(Some("degradation")), Tendance::Degradation);
        assert_eq!(normalize_tendance(Some("Improving")), Tendance::Amelioration);
        assert_eq!(normalize_tendance(Some("declining")), Tendance::Degradation);
    }

    #[test]
    fn tendance_defaults() {
        assert_eq!(normalize_tendance(None), Tendance::Stable);
        assert_eq!(normalize_tendance(Some("")), Tendance::Stable);
        assert_eq!(normalize_tendance(Some("???")), Tendance::Stable);
    }

    #[test]
    fn normalization_is_total_over_arbitrary_input() {
        let inputs = [
            "", " ", "ok", "Ok", "oK", "é", "↑", "↓↓", "-", "Attention!", "ALERTE",
            "critique/alerte", "null", "N/A", "0", "🙂", "\u{0}", "très très long libellé inconnu",
        ];
        for input in inputs {
            let statut = normalize_statut(Some(input));
            assert!(KqiStatut::ALL.contains(&statut));
            let tendance = normalize_tendance(Some(input));
            assert!(Tendance::ALL.contains(&tendance));
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        for input in ["Conforme", "À surveiller", "↓ Dégradation", "garbage"] {
            let once = normalize_statut(Some(input));
            assert_eq!(normalize_statut(Some(once.as_str())), once);
            let once = normalize_tendance(Some(input));
            assert_eq!(normalize_tendance(Some(once.as_str())), once);
        }
    }

    #[test]
    fn membership_checks_are_exact() {
        assert!(is_tendance_normalized("Dégradation"));
        assert!(!is_tendance_normalized("Degradation"));
        assert!(!is_statut_normalized("ok"));
        assert!(!is_statut_normalized(""));
    }
}
