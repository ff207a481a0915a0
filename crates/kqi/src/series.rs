use std::collections::BTreeMap;

use oversight_core::Kqi;

/// Measurements grouped by indicator name, each series newest period first.
pub fn group_by_indicator<'a>(
    measurements: impl IntoIterator<Item = &'a Kqi>,
) -> BTreeMap<&'a str, Vec<&'a Kqi>> {
    let mut grouped: BTreeMap<&str, Vec<&Kqi>> = BTreeMap::new();
    for kqi in measurements {
        grouped.entry(kqi.indicateur.as_str()).or_default().push(kqi);
    }
    for series in grouped.values_mut() {
        // stable sort keeps input order among equal periods
        series.sort_by(|a, b| b.periode.cmp(&a.periode));
    }
    grouped
}

/// Percent change from `previous` to `current`; `None` when `previous` is 0.
pub fn evolution(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

const PERCENT_INDICATORS: &[&str] = &[
    "taux de conformité",
    "taux de livraison",
    "taux de rétention",
    "taux de réponse",
];
const DAY_INDICATORS: &[&str] = &["délai", "durée", "temps"];

/// Render a measurement value with the unit implied by its indicator name.
pub fn format_value(value: f64, indicateur: &str) -> String {
    let name = indicateur.to_lowercase();
    if PERCENT_INDICATORS.iter().any(|p| name.contains(p)) {
        return format!("{value:.1}%");
    }
    if DAY_INDICATORS.iter().any(|d| name.contains(d)) {
        return format!("{value:.0} j");
    }
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oversight_core::{KqiStatut, Tendance};

    fn kqi(id: &str, indicateur: &str, periode: &str) -> Kqi {
        Kqi::new(id, "ST-1", indicateur, periode, KqiStatut::Ok, Tendance::Stable)
    }

    #[test]
    fn groups_sorted_newest_first() {
        let data = vec![
            kqi("a", "Délai", "2024-Q1"),
            kqi("b", "Taux de conformité", "2024-Q2"),
            kqi("c", "Délai", "2024-Q3"),
            kqi("d", "Délai", "2024-Q2"),
        ];
        let grouped = group_by_indicator(&data);
        let delai: Vec<&str> = grouped["Délai"].iter().map(|k| k.id()).collect();
        assert_eq!(delai, vec!["c", "d", "a"]);
        assert_eq!(grouped["Taux de conformité"].len(), 1);
    }

    #[test]
    fn evolution_percent() {
        assert_eq!(evolution(110.0, 100.0), Some(10.0));
        assert_eq!(evolution(50.0, 100.0), Some(-50.0));
        assert_eq!(evolution(5.0, 0.0), None);
    }

    #[test]
    fn value_units() {
        assert_eq!(format_value(92.345, "Taux de conformité"), "92.3%");
        assert_eq!(format_value(12.4, "Délai de livraison"), "12 j");
        assert_eq!(format_value(3.0, "Nombre d'écarts"), "3");
        assert_eq!(format_value(3.14159, "Score"), "3.14");
    }
}
