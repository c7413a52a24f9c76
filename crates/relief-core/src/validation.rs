//! State comparison tools.
//!
//! Finds where two worlds diverge. Used to check that rejected operations
//! left nothing behind, that a reset restored the initial configuration, and
//! that two runs with the same seed stayed in lockstep.

use crate::id::NodeId;
use crate::snapshot::WorldSnapshot;
use crate::world::World;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Diff types
// ---------------------------------------------------------------------------

/// Difference between two worlds at the node level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeDiff {
    /// Node exists only in world A.
    OnlyInA(NodeId),
    /// Node exists only in world B.
    OnlyInB(NodeId),
    /// Node exists in both but differs in the listed fields.
    StateMismatch {
        node: NodeId,
        fields: Vec<&'static str>,
    },
}

/// Difference between two worlds at the route level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDiff {
    OnlyInA { from: NodeId, to: NodeId },
    OnlyInB { from: NodeId, to: NodeId },
    StateMismatch {
        from: NodeId,
        to: NodeId,
        fields: Vec<&'static str>,
    },
}

/// Full diff between two worlds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldDiff {
    pub is_identical: bool,
    pub node_diffs: Vec<NodeDiff>,
    pub edge_diffs: Vec<EdgeDiff>,
}

// ---------------------------------------------------------------------------
// Diffing
// ---------------------------------------------------------------------------

/// Compute a detailed diff between two worlds.
pub fn diff_worlds(a: &World, b: &World) -> WorldDiff {
    diff_snapshots(&WorldSnapshot::capture(a), &WorldSnapshot::capture(b))
}

/// Compute a detailed diff between two snapshots.
pub fn diff_snapshots(a: &WorldSnapshot, b: &WorldSnapshot) -> WorldDiff {
    let mut node_diffs = Vec::new();
    let mut edge_diffs = Vec::new();

    let b_nodes: BTreeMap<&NodeId, _> = b.nodes.iter().map(|n| (&n.id, n)).collect();
    for node in &a.nodes {
        let Some(other) = b_nodes.get(&node.id) else {
            node_diffs.push(NodeDiff::OnlyInA(node.id.clone()));
            continue;
        };
        let mut fields = Vec::new();
        if node.kind != other.kind {
            fields.push("kind");
        }
        if node.supplies != other.supplies {
            fields.push("supplies");
        }
        if node.needs != other.needs {
            fields.push("needs");
        }
        if node.status != other.status {
            fields.push("status");
        }
        if !fields.is_empty() {
            node_diffs.push(NodeDiff::StateMismatch {
                node: node.id.clone(),
                fields,
            });
        }
    }
    for node in &b.nodes {
        if a.node(node.id.as_str()).is_none() {
            node_diffs.push(NodeDiff::OnlyInB(node.id.clone()));
        }
    }

    for edge in &a.edges {
        let (from, to) = (edge.source.clone(), edge.target.clone());
        let Some(other) = b.edge(from.as_str(), to.as_str()) else {
            edge_diffs.push(EdgeDiff::OnlyInA { from, to });
            continue;
        };
        let mut fields = Vec::new();
        if edge.status != other.status {
            fields.push("status");
        }
        if edge.risk != other.risk {
            fields.push("risk");
        }
        if !fields.is_empty() {
            edge_diffs.push(EdgeDiff::StateMismatch { from, to, fields });
        }
    }
    for edge in &b.edges {
        if a.edge(edge.source.as_str(), edge.target.as_str()).is_none() {
            edge_diffs.push(EdgeDiff::OnlyInB {
                from: edge.source.clone(),
                to: edge.target.clone(),
            });
        }
    }

    WorldDiff {
        is_identical: node_diffs.is_empty() && edge_diffs.is_empty(),
        node_diffs,
        edge_diffs,
    }
}
