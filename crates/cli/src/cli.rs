use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use oversight_core::Config;
use oversight_rules::AlertLevel;

/// Subcontractor oversight: infer alerts from a knowledge-graph snapshot.
///
/// Loads a JSON snapshot, runs every built-in rule for every subcontractor
/// and prints the alerts together with the KQI status of each
/// subcontractor. Flags override the environment configuration.
#[derive(Parser, Debug)]
#[command(name = "oversight", about = "Infer oversight alerts from a graph snapshot")]
pub struct CliArgs {
    /// Configuration profile ({PROFILE}_{KEY} variables take precedence)
    #[arg(long, env = "OVERSIGHT_PROFILE", default_value = "")]
    pub profile: String,

    /// JSON graph snapshot ({"nodes": [...], "edges": [...]})
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// JSON array of KQI measurements (default: KQI nodes of the snapshot)
    #[arg(long)]
    pub kqi: Option<PathBuf>,

    /// YAML file overriding rule thresholds
    #[arg(long)]
    pub thresholds: Option<PathBuf>,

    /// Evaluation date (YYYY-MM-DD, default: today)
    #[arg(long, value_parser = parse_as_of)]
    pub as_of: Option<NaiveDate>,

    /// Only show alerts of this level: HAUTE, MOYENNE or BASSE
    #[arg(long)]
    pub level: Option<AlertLevel>,

    /// Only show alerts and KQI status of this subcontractor
    #[arg(long)]
    pub st: Option<String>,

    /// Print a JSON report instead of the terminal view
    #[arg(long)]
    pub json: bool,

    /// List the registered rules and exit
    #[arg(long)]
    pub list_rules: bool,
}

impl CliArgs {
    /// Resolved configuration: environment first, then explicit flags.
    pub fn config(&self) -> Config {
        let mut config = Config::for_profile(&self.profile);
        if let Some(path) = &self.snapshot {
            config.data.snapshot_path = Some(path.clone());
        }
        if let Some(path) = &self.kqi {
            config.data.kqi_path = Some(path.clone());
        }
        if let Some(path) = &self.thresholds {
            config.engine.thresholds_path = Some(path.clone());
        }
        if self.as_of.is_some() {
            config.engine.as_of = self.as_of;
        }
        config
    }
}

fn parse_as_of(raw: &str) -> Result<NaiveDate, String> {
    oversight_core::date::parse_date(raw).ok_or_else(|| format!("invalid date '{raw}'"))
}
