use serde::Serialize;

use crate::alert::{AlertLevel, InferredAlert, RuleCategory};
use crate::context::RuleContext;
use crate::error::RuleError;

/// An inference rule.
///
/// `evaluate` must be pure: the same context yields the same alerts, with
/// the same ids, and nothing is mutated. Returning `Err` (or panicking)
/// only drops this rule's alerts for the subcontractor being evaluated.
pub trait Rule: Send + Sync {
    /// Unique identifier, e.g. `RGL-001`.
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn category(&self) -> RuleCategory;
    fn default_level(&self) -> AlertLevel;
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<InferredAlert>, RuleError>;
}

/// Serializable description of a registered rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: RuleCategory,
    pub default_level: AlertLevel,
}

impl RuleInfo {
    pub fn of(rule: &dyn Rule) -> Self {
        Self {
            id: rule.id().to_string(),
            name: rule.name().to_string(),
            description: rule.description().to_string(),
            category: rule.category(),
            default_level: rule.default_level(),
        }
    }
}
