use crate::data_source::{AddressRecord, TransactionRecord};
use crate::flow_graph::VertexMap;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unordered pair of addresses, stored smallest first
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(String, String);

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }
}

/// A wallet address and the provider data behind it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressNode {
    pub id: String,
    pub info: AddressRecord,
}

/// All explored transactions between one pair of addresses.
///
/// `source` and `target` keep the direction of the first transaction seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEdge {
    pub source: String,
    pub target: String,
    pub info: Vec<TransactionRecord>,
    pub bidirectional: bool,
}

/// A directed graph of fund flows between the addresses of a traversal.
///
/// At most one edge exists per unordered address pair; transactions in the
/// opposite direction are folded into the existing edge and flag it as
/// bidirectional.
pub struct FlowGraph {
    /// Nodes are addresses, edges are merged transaction lists.
    pub graph: StableGraph<AddressNode, FlowEdge>,

    /// Address to node lookup.
    pub node_index: HashMap<String, NodeIndex>,

    /// Unordered address pair to edge lookup.
    pub pair_index: HashMap<PairKey, EdgeIndex>,
}

impl Default for FlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowGraph {
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            node_index: HashMap::new(),
            pair_index: HashMap::new(),
        }
    }

    /// Adds an address node, or returns the existing one.
    pub fn add_address(&mut self, address: &str, info: AddressRecord) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(address) {
            return idx;
        }
        let idx = self.graph.add_node(AddressNode {
            id: address.to_string(),
            info,
        });
        self.node_index.insert(address.to_string(), idx);
        idx
    }

    /// Folds one transaction from `owner` into the graph.
    ///
    /// Returns false when the transaction is dropped: it pays `owner` itself,
    /// or its destination is not a node of the graph.
    pub fn add_transaction(&mut self, owner: &str, tx: &TransactionRecord) -> bool {
        let Some(destination) = tx.destination.as_deref() else {
            return false;
        };
        if destination == owner {
            return false;
        }

        let key = PairKey::new(owner, destination);
        if let Some(&edge_idx) = self.pair_index.get(&key)
            && let Some(edge) = self.graph.edge_weight_mut(edge_idx)
        {
            edge.info.push(tx.clone());
            if edge.source != owner {
                edge.bidirectional = true;
            }
            return true;
        }

        if let (Some(&from_idx), Some(&to_idx)) =
            (self.node_index.get(owner), self.node_index.get(destination))
        {
            let edge_idx = self.graph.add_edge(
                from_idx,
                to_idx,
                FlowEdge {
                    source: owner.to_string(),
                    target: destination.to_string(),
                    info: vec![tx.clone()],
                    bidirectional: false,
                },
            );
            self.pair_index.insert(key, edge_idx);
            true
        } else {
            tracing::debug!(
                "Dropping {} from graph: destination {} was not visited",
                tx.txid,
                destination
            );
            false
        }
    }

    pub fn build_from_vertices(vertices: &VertexMap) -> Self {
        let mut graph = Self::new();

        for (address, record) in vertices.iter() {
            graph.add_address(address, record.clone());
        }

        for (address, record) in vertices.iter() {
            for tx in &record.transactions {
                graph.add_transaction(address, tx);
            }
        }

        graph
    }

    pub fn get_node(&self, address: &str) -> Option<&AddressNode> {
        self.node_index
            .get(address)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// The edge joining `a` and `b`, in either direction
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&FlowEdge> {
        self.pair_index
            .get(&PairKey::new(a, b))
            .and_then(|&idx| self.graph.edge_weight(idx))
    }

    /// Nodes in discovery order
    pub fn nodes(&self) -> Vec<&AddressNode> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect()
    }

    /// Edges in creation order
    pub fn edges(&self) -> Vec<&FlowEdge> {
        self.graph
            .edge_indices()
            .filter_map(|idx| self.graph.edge_weight(idx))
            .collect()
    }

    /// Renderer-facing snapshot of the graph
    pub fn model(&self) -> GraphModel {
        let positions: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .enumerate()
            .map(|(pos, idx)| (idx, pos))
            .collect();

        let nodes = self
            .nodes()
            .into_iter()
            .map(|node| Node {
                id: node.id.clone(),
                hue: heat_hue(node.info.txs),
                info: node.info.clone(),
                x: 0.0,
                y: 0.0,
            })
            .collect();

        let edges = self
            .graph
            .edge_references()
            .map(|edge| {
                let weight = edge.weight();
                Edge {
                    source: positions[&edge.source()],
                    target: positions[&edge.target()],
                    source_id: weight.source.clone(),
                    target_id: weight.target.clone(),
                    info: weight.info.clone(),
                    bidirectional: weight.bidirectional,
                }
            })
            .collect();

        GraphModel { nodes, edges }
    }

    /// Export to DOT format for Graphviz
    pub fn to_dot(&self) -> String {
        let mut dot = "digraph FlowGraph {\n".to_string();
        dot.push_str("  node [shape=circle, style=filled, fontsize=10];\n\n");

        for node in self.nodes() {
            let hue = heat_hue(node.info.txs) as f64 / 360.0;
            dot.push_str(&format!(
                "  \"{}\" [label=\"{}\\n{} txs\", fillcolor=\"{:.3} 1.000 1.000\"];\n",
                escape_dot(&node.id),
                escape_dot(&short_address(&node.id)),
                node.info.txs,
                hue
            ));
        }

        dot.push('\n');

        for edge in self.edges() {
            let dir = if edge.bidirectional { ", dir=both" } else { "" };
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"{}];\n",
                escape_dot(&edge.source),
                escape_dot(&edge.target),
                edge.info.len(),
                dir
            ));
        }

        dot.push_str("}\n");
        dot
    }

    /// Get graph statistics
    pub fn stats(&self) -> GraphStats {
        let edges = self.edges();
        GraphStats {
            total_addresses: self.graph.node_count(),
            total_edges: edges.len(),
            bidirectional_edges: edges.iter().filter(|e| e.bidirectional).count(),
            linked_transactions: edges.iter().map(|e| e.info.len()).sum(),
        }
    }
}

/// Hue (HSL degrees) for an address with `txs` transactions: busy addresses
/// shift from violet towards red.
pub fn heat_hue(txs: u64) -> u32 {
    let rings = ((txs as f64 + 10_000.0).sqrt() + 0.5 - 100.0).floor() as i64;
    let hue = 260 - 5 * rings;
    if hue < 0 { 360 } else { hue as u32 }
}

pub fn short_address(address: &str) -> String {
    if address.chars().count() > 14 {
        let head: String = address.chars().take(6).collect();
        let tail: String = address
            .chars()
            .rev()
            .take(6)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("{}...{}", head, tail)
    } else {
        address.to_string()
    }
}

/// Escape a string for use inside a quoted DOT ID
fn escape_dot(id: &str) -> String {
    id.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Node as handed to a renderer. `x`/`y` belong to the layout engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub info: AddressRecord,
    pub hue: u32,
    pub x: f64,
    pub y: f64,
}

/// Edge as handed to a renderer; `source`/`target` index into `nodes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub source_id: String,
    pub target_id: String,
    pub info: Vec<TransactionRecord>,
    pub bidirectional: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphModel {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStats {
    pub total_addresses: usize,
    pub total_edges: usize,
    pub bidirectional_edges: usize,
    pub linked_transactions: usize,
}
