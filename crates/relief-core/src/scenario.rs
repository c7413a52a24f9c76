//! Initial configurations. A [`Scenario`] is the recipe the engine builds its
//! world from, both at start-up and on every reset.

use crate::model::{Edge, Node, RiskLevel, RouteStatus};
use crate::world::{World, WorldError};
use serde::{Deserialize, Serialize};

pub const WAREHOUSE_A: &str = "Warehouse_A";
pub const VILLAGE_B: &str = "Village_B";
pub const CAMP_C: &str = "Camp_C";
pub const ZONE_D: &str = "Zone_D";

/// Errors raised while turning a scenario into a world.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario '{scenario}' is invalid: {source}")]
    Invalid {
        scenario: String,
        #[source]
        source: WorldError,
    },
    /// Supplies are conserved or destroyed, never created, so the starting
    /// total bounds every node's stock. It must fit a single node.
    #[error("scenario '{scenario}' holds {total} units of supplies, more than one node can store")]
    SupplyOverflow { scenario: String, total: u64 },
}

/// Nodes and routes of a starting world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub nodes: Vec<Node>,
    pub routes: Vec<Edge>,
}

impl Default for Scenario {
    /// The baseline: one warehouse feeding two demand sites, and a damaged
    /// onward route to a site that starts cut off.
    fn default() -> Self {
        use crate::model::NodeStatus::*;
        Self {
            name: "baseline".to_string(),
            nodes: vec![
                Node::warehouse(WAREHOUSE_A, 100),
                Node::demand(VILLAGE_B, 80),
                Node::demand(CAMP_C, 150).with_status(Operational),
                Node::demand(ZONE_D, 200).with_status(Inaccessible),
            ],
            routes: vec![
                Edge::new(WAREHOUSE_A, VILLAGE_B, RouteStatus::Clear, RiskLevel::Low),
                Edge::new(WAREHOUSE_A, CAMP_C, RouteStatus::Congested, RiskLevel::Medium),
                Edge::new(VILLAGE_B, ZONE_D, RouteStatus::Damaged, RiskLevel::High),
            ],
        }
    }
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_route(mut self, route: Edge) -> Self {
        self.routes.push(route);
        self
    }

    /// Total supplies across all nodes.
    pub fn total_supplies(&self) -> u64 {
        self.nodes.iter().map(|n| u64::from(n.supplies)).sum()
    }

    /// Build a fresh world. Nodes are added before routes, so routes may
    /// reference nodes in any order.
    pub fn build(&self) -> Result<World, ScenarioError> {
        let total = self.total_supplies();
        if total > u64::from(u32::MAX) {
            return Err(ScenarioError::SupplyOverflow {
                scenario: self.name.clone(),
                total,
            });
        }
        let mut world = World::new();
        let invalid = |source: WorldError| ScenarioError::Invalid {
            scenario: self.name.clone(),
            source,
        };
        for node in &self.nodes {
            world.add_node(node.clone()).map_err(invalid)?;
        }
        for route in &self.routes {
            world.add_edge(route.clone()).map_err(invalid)?;
        }
        Ok(world)
    }
}
