use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use oversight_core::{EdgeType, GraphEdge, GraphNode, Kqi, OversightError, Result, SousTraitant};

#[derive(Debug, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub dangling_edges: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
    pub edges_by_type: BTreeMap<String, usize>,
}

/// Immutable-by-convention view of the graph for one evaluation pass.
///
/// Nodes and edges are keyed by id in ordered maps, so every iteration
/// (subcontractors, adjacency) is deterministic for a given content
/// regardless of insertion order. Edges may reference missing nodes;
/// traversal helpers skip them.
#[derive(Debug, Default, Clone)]
pub struct GraphSnapshot {
    nodes: BTreeMap<String, GraphNode>,
    edges: BTreeMap<String, GraphEdge>,
    outgoing: HashMap<String, BTreeSet<String>>,
    incoming: HashMap<String, BTreeSet<String>>,
}

impl GraphSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot, rejecting duplicate node or edge ids.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = GraphNode>,
        edges: impl IntoIterator<Item = GraphEdge>,
    ) -> Result<Self> {
        let mut snapshot = Self::new();
        for node in nodes {
            snapshot.insert_node(node)?;
        }
        for edge in edges {
            snapshot.insert_edge(edge)?;
        }
        Ok(snapshot)
    }

    pub fn insert_node(&mut self, node: GraphNode) -> Result<()> {
        let id = node.id().to_string();
        if self.nodes.contains_key(&id) {
            return Err(OversightError::DuplicateNodeId(id));
        }
        self.nodes.insert(id, node);
        Ok(())
    }

    pub fn insert_edge(&mut self, edge: GraphEdge) -> Result<()> {
        if self.edges.contains_key(&edge.id) {
            return Err(OversightError::DuplicateEdgeId(edge.id));
        }
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .insert(edge.id.clone());
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .insert(edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All subcontractors, ordered by id.
    pub fn sous_traitants(&self) -> impl Iterator<Item = &SousTraitant> {
        self.nodes.values().filter_map(|n| match n {
            GraphNode::SousTraitant(st) => Some(st),
            _ => None,
        })
    }

    pub fn sous_traitant(&self, id: &str) -> Option<&SousTraitant> {
        match self.nodes.get(id) {
            Some(GraphNode::SousTraitant(st)) => Some(st),
            _ => None,
        }
    }

    /// All KQI measurement nodes, ordered by id.
    pub fn kqis(&self) -> impl Iterator<Item = &Kqi> {
        self.nodes.values().filter_map(|n| match n {
            GraphNode::Kqi(k) => Some(k),
            _ => None,
        })
    }

    /// Outgoing edges of `edge_type` with their (existing) target nodes.
    pub fn outgoing(&self, node_id: &str, edge_type: EdgeType) -> Vec<(&GraphEdge, &GraphNode)> {
        self.walk(&self.outgoing, node_id, edge_type, |e| &e.target)
    }

    /// Incoming edges of `edge_type` with their (existing) source nodes.
    pub fn incoming(&self, node_id: &str, edge_type: EdgeType) -> Vec<(&GraphEdge, &GraphNode)> {
        self.walk(&self.incoming, node_id, edge_type, |e| &e.source)
    }

    /// Edges of `edge_type` touching `node_id` in either direction, paired
    /// with the node at the other end. Dangling edges are skipped.
    pub fn neighbors(&self, node_id: &str, edge_type: EdgeType) -> Vec<(&GraphEdge, &GraphNode)> {
        let mut result = self.outgoing(node_id, edge_type);
        for (edge, node) in self.incoming(node_id, edge_type) {
            // self-loops were already collected as outgoing
            if edge.source != edge.target {
                result.push((edge, node));
            }
        }
        result
    }

    fn walk<'a>(
        &'a self,
        index: &'a HashMap<String, BTreeSet<String>>,
        node_id: &str,
        edge_type: EdgeType,
        endpoint: impl Fn(&'a GraphEdge) -> &'a String,
    ) -> Vec<(&'a GraphEdge, &'a GraphNode)> {
        let Some(edge_ids) = index.get(node_id) else {
            return Vec::new();
        };
        edge_ids
            .iter()
            .filter_map(|eid| self.edges.get(eid))
            .filter(|e| e.edge_type == edge_type)
            .filter_map(|e| self.nodes.get(endpoint(e)).map(|n| (e, n)))
            .collect()
    }

    /// Edges whose source or target id is missing from the snapshot.
    pub fn dangling_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values().filter(|e| {
            !self.nodes.contains_key(&e.source) || !self.nodes.contains_key(&e.target)
        })
    }

    pub fn stats(&self) -> GraphStats {
        let mut nodes_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for node in self.nodes.values() {
            *nodes_by_type.entry(node.node_type().to_string()).or_default() += 1;
        }

        let mut edges_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for edge in self.edges.values() {
            *edges_by_type.entry(edge.edge_type.to_string()).or_default() += 1;
        }

        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            dangling_edges: self.dangling_edges().count(),
            nodes_by_type,
            edges_by_type,
        }
    }
}
