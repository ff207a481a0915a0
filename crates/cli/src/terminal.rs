use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::collections::BTreeMap;
use std::io::{self, Write};

use oversight_core::Kqi;
use oversight_kqi::{evolution, format_value, group_by_indicator, KqiAggregation, KqiStatus};
use oversight_rules::{AlertLevel, InferredAlert, RuleCategory, RuleInfo};

use crate::report::Report;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const HEADER: Color = Color::Magenta;
    const DIM: Color = Color::DarkGrey;
    const HAUTE: Color = Color::Red;
    const MOYENNE: Color = Color::Yellow;
    const BASSE: Color = Color::Cyan;
    const GOOD: Color = Color::Green;

    fn level(level: AlertLevel) -> Color {
        match level {
            AlertLevel::Haute => Self::HAUTE,
            AlertLevel::Moyenne => Self::MOYENNE,
            AlertLevel::Basse => Self::BASSE,
        }
    }

    fn kqi(status: KqiStatus) -> Color {
        match status {
            KqiStatus::Critical => Self::HAUTE,
            KqiStatus::Warning => Self::MOYENNE,
            KqiStatus::Good => Self::GOOD,
        }
    }
}

/// Human-readable rendering of a run on stdout.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    pub fn print_report(&self, report: &Report<'_>) -> Result<()> {
        self.print_header(report)?;
        self.print_alerts(&report.alerts)?;
        self.print_kqi(&report.kqi)?;
        if !report.failures.is_empty() {
            let mut stdout = io::stdout();
            execute!(
                stdout,
                Print("\n"),
                SetForegroundColor(Colors::HAUTE),
                Print(format!("{} rule evaluation(s) failed:\n", report.failures.len())),
                ResetColor,
            )?;
            for failure in report.failures {
                execute!(
                    stdout,
                    Print(format!(
                        "  {} on {}: {}\n",
                        failure.rule_id, failure.st_id, failure.message
                    )),
                )?;
            }
            stdout.flush()?;
        }
        Ok(())
    }

    fn print_header(&self, report: &Report<'_>) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("oversight"),
            ResetColor,
            Print(format!(" - evaluation as of {}\n", report.as_of)),
            SetForegroundColor(Colors::DIM),
            Print(format!(
                "Graph: {} nodes, {} edges ({} dangling, {} nodes and {} edges skipped)\n",
                report.graph.node_count,
                report.graph.edge_count,
                report.graph.dangling_edges,
                report.skipped_nodes,
                report.skipped_edges,
            )),
            Print(format!(
                "Rules: {} evaluations over {} subcontractors, {} failed, {} ms\n",
                report.rules_evaluated,
                report.sts_evaluated,
                report.rules_failed,
                report.execution_time_ms,
            )),
            Print("---\n"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    fn print_alerts(&self, alerts: &[&InferredAlert]) -> Result<()> {
        let mut stdout = io::stdout();
        if alerts.is_empty() {
            execute!(
                stdout,
                SetForegroundColor(Colors::DIM),
                Print("No alerts.\n"),
                ResetColor,
            )?;
            return Ok(());
        }

        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print(format!("Alerts ({}):\n", alerts.len())),
            SetForegroundColor(Colors::DIM),
            Print(format!(
                "{:<8} {:<8} {:<10} {:<14} {}\n",
                "LEVEL", "RULE", "ST", "TRIGGER", "DESCRIPTION"
            )),
            Print(format!("{}\n", "-".repeat(80))),
            ResetColor,
        )?;
        for alert in alerts {
            execute!(
                stdout,
                SetForegroundColor(Colors::level(alert.level)),
                Print(format!("{:<8} ", alert.level.as_str())),
                ResetColor,
                Print(format!(
                    "{:<8} {:<10} {:<14} {}\n",
                    alert.rule_id, alert.st_id, alert.trigger_node_id, alert.description
                )),
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    fn print_kqi(&self, kqi: &BTreeMap<&str, &KqiAggregation>) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::HEADER),
            Print("KQI status:\n"),
            ResetColor,
        )?;
        for (st_id, aggregation) in kqi {
            let detail = if aggregation.total_count == 0 {
                "no measurements".to_string()
            } else {
                format!(
                    "{} indicators, {} in alert, {} warning, {} degrading (latest {})",
                    aggregation.total_count,
                    aggregation.alert_count,
                    aggregation.warning_count,
                    aggregation.degrading_count,
                    aggregation.latest_period,
                )
            };
            execute!(
                stdout,
                Print(format!("  {:<10} ", st_id)),
                SetForegroundColor(Colors::kqi(aggregation.status)),
                Print(format!("{:<10} ", aggregation.status.label())),
                ResetColor,
                SetForegroundColor(Colors::DIM),
                Print(format!("{detail}\n")),
                ResetColor,
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Print each indicator of one subcontractor with its latest value and
    /// the change since the previous period.
    pub fn print_kqi_series(&self, st_id: &str, measurements: &[&Kqi]) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::HEADER),
            Print(format!("KQI series for {st_id}:\n")),
            ResetColor,
        )?;
        for (indicateur, series) in group_by_indicator(measurements.iter().copied()) {
            let Some(latest) = series.first() else {
                continue;
            };
            let change = series
                .get(1)
                .and_then(|previous| evolution(latest.valeur, previous.valeur))
                .map(|pct| format!("{pct:+.1}% vs {}", series[1].periode))
                .unwrap_or_else(|| "no previous period".to_string());
            execute!(
                stdout,
                Print(format!(
                    "  {:<28} {:<8} {:>10}  ",
                    indicateur,
                    latest.periode,
                    format_value(latest.valeur, indicateur)
                )),
                SetForegroundColor(Colors::DIM),
                Print(format!("{} ({}, {})\n", change, latest.statut, latest.tendance)),
                ResetColor,
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Print the registered rules grouped by category.
    pub fn print_rules(&self, rules: &BTreeMap<RuleCategory, Vec<RuleInfo>>) -> Result<()> {
        let mut stdout = io::stdout();
        for (category, infos) in rules {
            execute!(
                stdout,
                SetForegroundColor(Colors::HEADER),
                Print(format!("{category}:\n")),
                ResetColor,
            )?;
            for info in infos {
                execute!(
                    stdout,
                    Print(format!("  {:<8} ", info.id)),
                    SetForegroundColor(Colors::level(info.default_level)),
                    Print(format!("{:<8} ", info.default_level.as_str())),
                    ResetColor,
                    Print(format!("{}\n", info.name)),
                    SetForegroundColor(Colors::DIM),
                    Print(format!("           {}\n", info.description)),
                    ResetColor,
                )?;
            }
        }
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_colors() {
        assert_eq!(Colors::level(AlertLevel::Haute), Color::Red);
        assert_eq!(Colors::kqi(KqiStatus::Good), Color::Green);
        assert_eq!(Colors::kqi(KqiStatus::Critical), Colors::level(AlertLevel::Haute));
    }
}
