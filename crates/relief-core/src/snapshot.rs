//! Owned, read-only copies of the world for external consumers.
//!
//! Renderers and the advisory collaborator receive a [`WorldSnapshot`]
//! rather than a reference into the engine, so nothing they do can reach
//! back into live state.
//!
//! The relief metrics ([`coverage`], [`atkinson_index`]) are pure functions
//! of a starting snapshot and a current one.

use crate::model::{Edge, Node, NodeKind};
use crate::world::World;
use serde::{Deserialize, Serialize};

/// Structural copy of every node and route, in canonical order.
///
/// Nodes are sorted by id, routes by `(source, target)`. Two snapshots are
/// equal exactly when the worlds they were captured from are structurally
/// identical.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl WorldSnapshot {
    /// Capture the current state of `world`.
    pub fn capture(world: &World) -> Self {
        Self {
            nodes: world.nodes().cloned().collect(),
            edges: world.edges().cloned().collect(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|e| e.source.as_str() == source && e.target.as_str() == target)
    }

    /// Total supplies held across all nodes.
    pub fn total_supplies(&self) -> u64 {
        self.nodes.iter().map(|n| u64::from(n.supplies)).sum()
    }

    /// Total outstanding need across all nodes.
    pub fn total_needs(&self) -> u64 {
        self.nodes.iter().map(|n| u64::from(n.needs)).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Relief metrics
// ---------------------------------------------------------------------------

/// Inequality aversion used for the headline Atkinson index.
pub const ATKINSON_EPSILON: f64 = 0.5;

/// Share of each demand node's starting need that has since been met, in
/// `initial` order. Nodes that started with no need, or are missing from
/// `current`, are skipped.
pub fn needs_met_shares(initial: &WorldSnapshot, current: &WorldSnapshot) -> Vec<f64> {
    demand_progress(initial, current)
        .map(|(start, met)| f64::from(met) / f64::from(start))
        .collect()
}

/// Fraction of the total starting need that has been met, from deliveries
/// and outside aid alike. `None` when nothing was needed to begin with.
pub fn coverage(initial: &WorldSnapshot, current: &WorldSnapshot) -> Option<f64> {
    let (needed, met) = demand_progress(initial, current).fold((0u64, 0u64), |(n, m), (start, done)| {
        (n + u64::from(start), m + u64::from(done))
    });
    (needed > 0).then(|| met as f64 / needed as f64)
}

/// Atkinson inequality index of non-negative `values` for aversion
/// `epsilon >= 0`. Zero means perfectly even, values toward one mean the
/// total is concentrated in few entries.
///
/// `None` for an empty input or a zero mean, where the index is undefined.
pub fn atkinson_index(values: &[f64], epsilon: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return None;
    }
    let equally_distributed = if (epsilon - 1.0).abs() < f64::EPSILON {
        if values.iter().any(|&v| v <= 0.0) {
            0.0
        } else {
            (values.iter().map(|v| v.ln()).sum::<f64>() / n).exp()
        }
    } else {
        let power = 1.0 - epsilon;
        (values.iter().map(|v| v.powf(power)).sum::<f64>() / n).powf(1.0 / power)
    };
    Some((1.0 - equally_distributed / mean).clamp(0.0, 1.0))
}

/// `(starting need, need met since)` per demand node that started in need.
fn demand_progress<'a>(
    initial: &'a WorldSnapshot,
    current: &'a WorldSnapshot,
) -> impl Iterator<Item = (u32, u32)> + 'a {
    initial
        .nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Demand && n.needs > 0)
        .filter_map(move |start| {
            let now = current.node(start.id.as_str())?;
            Some((start.needs, start.needs - now.needs.min(start.needs)))
        })
}
