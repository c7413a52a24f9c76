//! Entity definitions: nodes (warehouses and demand sites) and the directed
//! routes between them.

use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// What role a node plays in the logistics graph. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Supply source.
    Warehouse,
    /// Consumption point with an outstanding need.
    Demand,
}

/// Operational condition of a node.
///
/// Stored explicitly rather than derived: `Stable` and `Recovering` follow
/// from need levels, but `Inaccessible` and `CriticalIsolated` come from
/// connectivity and have no numeric derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeStatus {
    #[default]
    Operational,
    Critical,
    Stable,
    Inaccessible,
    CriticalIsolated,
    Recovering,
}

impl NodeStatus {
    /// Whether a convoy may be dispatched to a node in this status.
    pub fn accepts_deliveries(self) -> bool {
        !matches!(self, NodeStatus::Inaccessible | NodeStatus::CriticalIsolated)
    }
}

/// A location in the logistics graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Stock on hand. Warehouses hold it from the start; demand nodes only
    /// hold the surplus of deliveries that exceeded their need.
    #[serde(default)]
    pub supplies: u32,
    /// Outstanding unmet requirement. Zero for warehouses.
    #[serde(default)]
    pub needs: u32,
    #[serde(default)]
    pub status: NodeStatus,
}

impl Node {
    /// A warehouse holding `supplies`, status `Operational`.
    pub fn warehouse(id: impl Into<NodeId>, supplies: u32) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Warehouse,
            supplies,
            needs: 0,
            status: NodeStatus::Operational,
        }
    }

    /// A demand site with outstanding `needs`, status `Critical`.
    pub fn demand(id: impl Into<NodeId>, needs: u32) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Demand,
            supplies: 0,
            needs,
            status: NodeStatus::Critical,
        }
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_supplies(mut self, supplies: u32) -> Self {
        self.supplies = supplies;
        self
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Physical condition of a route. Governs whether dispatch is permitted and
/// which outcome distribution applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RouteStatus {
    #[default]
    Clear,
    Congested,
    Damaged,
    Destroyed,
}

/// Descriptive risk rating. Informational only: outcomes are driven by
/// [`RouteStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// A directed route between two nodes. `A -> B` does not imply `B -> A`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub status: RouteStatus,
    #[serde(default)]
    pub risk: RiskLevel,
}

impl Edge {
    pub fn new(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        status: RouteStatus,
        risk: RiskLevel,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            status,
            risk,
        }
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Warehouse => "Warehouse",
            NodeKind::Demand => "Demand",
        })
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeStatus::Operational => "Operational",
            NodeStatus::Critical => "Critical",
            NodeStatus::Stable => "Stable",
            NodeStatus::Inaccessible => "Inaccessible",
            NodeStatus::CriticalIsolated => "Critical (Isolated)",
            NodeStatus::Recovering => "Recovering",
        })
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RouteStatus::Clear => "Clear",
            RouteStatus::Congested => "Congested",
            RouteStatus::Damaged => "Damaged",
            RouteStatus::Destroyed => "Destroyed",
        })
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        })
    }
}
