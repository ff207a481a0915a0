//! JSON decoding of graph snapshots and KQI lists.
//!
//! Entries are decoded one by one: a malformed node or edge (unknown
//! `_type`, wrong field type) is reported and skipped instead of failing the
//! whole snapshot. Duplicate ids keep the first occurrence.

use std::io::Read;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use oversight_core::{GraphEdge, GraphNode, Kqi, Result};

use crate::store::GraphSnapshot;

#[derive(Debug, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    nodes: Vec<Value>,
    #[serde(default)]
    edges: Vec<Value>,
}

/// Outcome of decoding a snapshot.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub nodes_loaded: usize,
    pub nodes_skipped: usize,
    pub edges_loaded: usize,
    pub edges_skipped: usize,
}

/// Decode `{"nodes": [...], "edges": [...]}` into a [`GraphSnapshot`].
pub fn load_snapshot(reader: impl Read) -> Result<(GraphSnapshot, LoadReport)> {
    let doc: SnapshotDocument = serde_json::from_reader(reader)?;
    let mut snapshot = GraphSnapshot::new();
    let mut report = LoadReport::default();

    for (index, raw) in doc.nodes.into_iter().enumerate() {
        let decoded = serde_json::from_value::<GraphNode>(raw)
            .map_err(|e| e.to_string())
            .and_then(|node| snapshot.insert_node(node).map_err(|e| e.to_string()));
        match decoded {
            Ok(()) => report.nodes_loaded += 1,
            Err(error) => {
                warn!(index, %error, "skipping node");
                report.nodes_skipped += 1;
            }
        }
    }

    for (index, raw) in doc.edges.into_iter().enumerate() {
        let decoded = serde_json::from_value::<GraphEdge>(raw)
            .map_err(|e| e.to_string())
            .and_then(|edge| snapshot.insert_edge(edge).map_err(|e| e.to_string()));
        match decoded {
            Ok(()) => report.edges_loaded += 1,
            Err(error) => {
                warn!(index, %error, "skipping edge");
                report.edges_skipped += 1;
            }
        }
    }

    let dangling = snapshot.dangling_edges().count();
    if dangling > 0 {
        warn!(dangling, "snapshot contains edges referencing missing nodes");
    }
    info!(
        nodes = report.nodes_loaded,
        edges = report.edges_loaded,
        skipped_nodes = report.nodes_skipped,
        skipped_edges = report.edges_skipped,
        "snapshot loaded"
    );

    Ok((snapshot, report))
}

/// Decode a JSON array of KQI measurements, skipping malformed entries.
pub fn load_kqi_list(reader: impl Read) -> Result<Vec<Kqi>> {
    let raw: Vec<Value> = serde_json::from_reader(reader)?;
    let mut measurements = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<Kqi>(value) {
            Ok(kqi) => measurements.push(kqi),
            Err(error) => warn!(index, %error, "skipping KQI measurement"),
        }
    }
    Ok(measurements)
}
