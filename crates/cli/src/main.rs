mod cli;
mod report;
mod terminal;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use oversight_core::config::load_dotenv;
use oversight_core::Kqi;
use oversight_graph::{load_kqi_list, load_snapshot};
use oversight_kqi::aggregate_all_entities;
use oversight_rules::projection::rules_by_category;
use oversight_rules::{sorted_by_severity, AlertFilter, RuleEngine};

use crate::cli::CliArgs;
use crate::report::Report;
use crate::terminal::Terminal;

fn main() -> Result<()> {
    load_dotenv();

    // Logs go to stderr so --json output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let terminal = Terminal::new();

    let config = args.config();
    config.log_summary();

    let engine =
        RuleEngine::from_config(&config.engine).context("failed to configure rule engine")?;

    if args.list_rules {
        let grouped = rules_by_category(engine.rules());
        if args.json {
            println!("{}", serde_json::to_string_pretty(&grouped)?);
        } else {
            terminal.print_rules(&grouped)?;
        }
        return Ok(());
    }

    let snapshot_path = config
        .data
        .snapshot_path
        .as_deref()
        .context("no snapshot given (use --snapshot or OVERSIGHT_SNAPSHOT)")?;
    let (graph, load) = load_snapshot(open(snapshot_path)?)
        .with_context(|| format!("failed to load snapshot {}", snapshot_path.display()))?;

    let kqis: Vec<Kqi> = match config.data.kqi_path.as_deref() {
        Some(path) => load_kqi_list(open(path)?)
            .with_context(|| format!("failed to load KQI list {}", path.display()))?,
        None => graph.kqis().cloned().collect(),
    };

    let as_of = engine.evaluation_date();
    let result = engine.evaluate_all_as_of(&graph, as_of);
    if result.is_degraded() {
        warn!(failed = result.rules_failed, "some rule evaluations failed");
    }

    let st_ids: Vec<&str> = graph
        .sous_traitants()
        .map(|st| st.base.id.as_str())
        .filter(|id| args.st.as_deref().map_or(true, |wanted| *id == wanted))
        .collect();
    let aggregations = aggregate_all_entities(&kqis, &st_ids);
    info!(
        measurements = kqis.len(),
        subcontractors = aggregations.len(),
        "KQI aggregation complete"
    );

    let filter = AlertFilter {
        level: args.level,
        st_id: args.st.clone(),
    };
    let shown = sorted_by_severity(&result.alerts)
        .into_iter()
        .filter(|alert| filter.matches(alert))
        .collect();
    let kqi: BTreeMap<&str, _> = aggregations
        .iter()
        .map(|(st_id, aggregation)| (st_id.as_str(), aggregation))
        .collect();

    let report = Report::new(as_of, graph.stats(), &load, &result, shown, kqi);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        terminal.print_report(&report)?;
        if let Some(st_id) = args.st.as_deref() {
            let own: Vec<&Kqi> = kqis.iter().filter(|k| k.sous_traitant_id == st_id).collect();
            terminal.print_kqi_series(st_id, &own)?;
        }
    }
    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}
