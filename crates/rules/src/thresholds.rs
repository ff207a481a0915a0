//! Escalation thresholds of the built-in rules.
//!
//! Defaults reproduce the historical constants; a YAML file may override any
//! subset of them:
//!
//! ```yaml
//! finding_critique_days: 45
//! finding_overdue_days:
//!   moyenne: 60
//!   haute: 120
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// A two-step escalation bound: reaching `moyenne` raises a MOYENNE alert,
/// reaching `haute` escalates it to HAUTE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Escalation<T> {
    pub moyenne: T,
    pub haute: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleThresholds {
    /// A critical finding alerts once detected more than this many days ago.
    pub finding_critique_days: u32,
    /// Open finding count, compared strictly (`count > bound`).
    pub open_findings: Escalation<usize>,
    /// Degrading latest-per-indicator KQI count, compared inclusively
    /// (`count >= bound`).
    pub kqi_degradation: Escalation<usize>,
    /// Days an open finding has been detected, compared strictly.
    pub finding_overdue_days: Escalation<u32>,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            finding_critique_days: 30,
            open_findings: Escalation { moyenne: 3, haute: 5 },
            kqi_degradation: Escalation { moyenne: 2, haute: 3 },
            finding_overdue_days: Escalation {
                moyenne: 90,
                haute: 180,
            },
        }
    }
}

impl RuleThresholds {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RuleError> {
        let thresholds: RuleThresholds = serde_yaml::from_str(yaml)?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let thresholds = Self::from_yaml_str(&yaml)?;
        tracing::info!(path = %path.display(), "loaded rule thresholds");
        Ok(thresholds)
    }

    /// Escalation bounds must not decrease.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.open_findings.moyenne > self.open_findings.haute {
            return Err(RuleError::Config(format!(
                "open_findings: moyenne ({}) exceeds haute ({})",
                self.open_findings.moyenne, self.open_findings.haute
            )));
        }
        if self.kqi_degradation.moyenne > self.kqi_degradation.haute {
            return Err(RuleError::Config(format!(
                "kqi_degradation: moyenne ({}) exceeds haute ({})",
                self.kqi_degradation.moyenne, self.kqi_degradation.haute
            )));
        }
        if self.finding_overdue_days.moyenne > self.finding_overdue_days.haute {
            return Err(RuleError::Config(format!(
                "finding_overdue_days: moyenne ({}) exceeds haute ({})",
                self.finding_overdue_days.moyenne, self.finding_overdue_days.haute
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let t = RuleThresholds::from_yaml_str("finding_critique_days: 45\n").unwrap();
        assert_eq!(t.finding_critique_days, 45);
        assert_eq!(t.finding_overdue_days, RuleThresholds::default().finding_overdue_days);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RuleThresholds::from_yaml_str("finding_critical_days: 45\n").unwrap_err();
        assert!(matches!(err, RuleError::Parse(_)));
    }

    #[test]
    fn decreasing_bounds_are_rejected() {
        let err = RuleThresholds::from_yaml_str(
            "finding_overdue_days:\n  moyenne: 200\n  haute: 100\n",
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "open_findings:\n  moyenne: 1\n  haute: 2").unwrap();
        let t = RuleThresholds::load(file.path()).unwrap();
        assert_eq!(t.open_findings, Escalation { moyenne: 1, haute: 2 });

        let missing = RuleThresholds::load(Path::new("/nonexistent/thresholds.yml"));
        assert!(matches!(missing, Err(RuleError::Io { .. })));
    }
}
