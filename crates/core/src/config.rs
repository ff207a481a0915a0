use std::env;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).map(|v| v.to_lowercase()) {
        Some(v) if v == "true" || v == "1" || v == "yes" => true,
        Some(v) if v == "false" || v == "0" || v == "no" => false,
        Some(v) => {
            tracing::warn!(key, value = %v, "invalid boolean, using default");
            default
        }
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub engine: EngineConfig,
    pub data: DataConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `OVERSIGHT_PROFILE`. When set (e.g. `AUDIT`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("OVERSIGHT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            engine: EngineConfig::from_env_profiled(p),
            data: DataConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  engine:  enabled={}, thresholds={}, as_of={}",
            self.engine.enabled,
            display_path(self.engine.thresholds_path.as_ref()),
            self.engine
                .as_of
                .map(|d| d.to_string())
                .unwrap_or_else(|| "(today)".to_string()),
        );
        tracing::info!(
            "  data:    snapshot={}, kqi={}",
            display_path(self.data.snapshot_path.as_ref()),
            display_path(self.data.kqi_path.as_ref()),
        );
    }
}

fn display_path(path: Option<&PathBuf>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string())
}

// ── Engine ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Master switch for the rule engine.
    pub enabled: bool,
    /// YAML file overriding the built-in rule thresholds.
    pub thresholds_path: Option<PathBuf>,
    /// Pinned evaluation date; `None` means today.
    pub as_of: Option<NaiveDate>,
}

impl EngineConfig {
    fn from_env_profiled(p: &str) -> Self {
        let as_of = profiled_env_opt(p, "OVERSIGHT_AS_OF").and_then(|raw| {
            let parsed = crate::date::parse_date(&raw);
            if parsed.is_none() {
                tracing::warn!(value = %raw, "invalid OVERSIGHT_AS_OF, evaluating as of today");
            }
            parsed
        });
        Self {
            enabled: profiled_env_bool(p, "OVERSIGHT_ENGINE_ENABLED", true),
            thresholds_path: profiled_env_opt(p, "OVERSIGHT_THRESHOLDS").map(PathBuf::from),
            as_of,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            thresholds_path: None,
            as_of: None,
        }
    }
}

// ── Data sources ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON graph snapshot (`{"nodes": [...], "edges": [...]}`).
    pub snapshot_path: Option<PathBuf>,
    /// Separate JSON array of KQI measurements; when absent the KQI nodes
    /// of the snapshot are used.
    pub kqi_path: Option<PathBuf>,
}

impl DataConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            snapshot_path: profiled_env_opt(p, "OVERSIGHT_SNAPSHOT").map(PathBuf::from),
            kqi_path: profiled_env_opt(p, "OVERSIGHT_KQI").map(PathBuf::from),
        }
    }
}
