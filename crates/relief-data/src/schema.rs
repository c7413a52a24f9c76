//! Serde data file structs for scenario definitions.
//!
//! Nodes are declared by name and routes refer to them by name. The loader
//! resolves these into core [`Scenario`](relief_core::scenario::Scenario)
//! values, rejecting unknown and duplicate names.

use relief_core::model::{NodeKind, NodeStatus, RiskLevel, RouteStatus};
use serde::Deserialize;

/// A scenario file: a named set of nodes and the routes between them.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioData {
    /// Defaults to the file stem when omitted.
    #[serde(default)]
    pub name: Option<String>,
    pub nodes: Vec<NodeData>,
    #[serde(default)]
    pub routes: Vec<RouteData>,
}

/// A node definition.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeData {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub supplies: u32,
    #[serde(default)]
    pub needs: u32,
    /// When omitted, warehouses start `Operational` and demand sites
    /// `Critical`.
    #[serde(default)]
    pub status: Option<NodeStatus>,
}

impl NodeData {
    pub fn initial_status(&self) -> NodeStatus {
        self.status.unwrap_or(match self.kind {
            NodeKind::Warehouse => NodeStatus::Operational,
            NodeKind::Demand => NodeStatus::Critical,
        })
    }
}

/// A directed route definition.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteData {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub status: RouteStatus,
    #[serde(default)]
    pub risk: RiskLevel,
}
