use crate::id::{EdgeKey, NodeId, NodeKey};
use crate::model::{Edge, Node, NodeStatus, RiskLevel, RouteStatus};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by the world model's structural checks.
///
/// These encode integrity rules only. Domain policy (route conditions,
/// outcomes) lives in [`crate::dispatch`] and [`crate::injector`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("route not found: {from} -> {to}")]
    RouteNotFound { from: NodeId, to: NodeId },
    #[error("invalid entity: {0}")]
    InvalidEntity(NodeId),
    #[error("quantity on {node} would become negative ({current} {delta:+})")]
    NegativeQuantity {
        node: NodeId,
        current: u32,
        delta: i64,
    },
    #[error("quantity on {node} would overflow ({current} {delta:+})")]
    QuantityOverflow {
        node: NodeId,
        current: u32,
        delta: i64,
    },
    #[error("duplicate node: {0}")]
    DuplicateNode(NodeId),
    #[error("duplicate route: {from} -> {to}")]
    DuplicateRoute { from: NodeId, to: NodeId },
}

// ---------------------------------------------------------------------------
// Core data structures
// ---------------------------------------------------------------------------

/// Adjacency lists for a single node, tracking incoming and outgoing routes.
#[derive(Debug, Clone, Default)]
struct NodeAdjacency {
    /// Routes whose target is this node.
    inputs: Vec<EdgeKey>,
    /// Routes whose source is this node.
    outputs: Vec<EdgeKey>,
}

/// Which stored quantity a mutation touches.
#[derive(Debug, Clone, Copy)]
enum Quantity {
    Supplies,
    Needs,
}

/// The world state: nodes, directed routes, and the indexes that keep
/// lookups by name and by ordered pair cheap.
///
/// Adjacency is stored in a `SecondaryMap` keyed by `NodeKey`, which keeps it
/// in lockstep with the primary `nodes` SlotMap. Every mutator checks its
/// preconditions before writing, so a failed call changes nothing.
#[derive(Debug, Clone, Default)]
pub struct World {
    nodes: SlotMap<NodeKey, Node>,
    edges: SlotMap<EdgeKey, Edge>,
    adjacency: SecondaryMap<NodeKey, NodeAdjacency>,
    /// Name index. Ordered so iteration is canonical.
    index: BTreeMap<NodeId, NodeKey>,
    /// At most one route per ordered `(source, target)` pair.
    routes: BTreeMap<(NodeKey, NodeKey), EdgeKey>,
}

impl World {
    /// Create a new, empty world.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Insert a node. Fails if a node with the same id already exists.
    pub fn add_node(&mut self, node: Node) -> Result<NodeKey, WorldError> {
        if self.index.contains_key(node.id.as_str()) {
            return Err(WorldError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        let key = self.nodes.insert(node);
        self.adjacency.insert(key, NodeAdjacency::default());
        self.index.insert(id, key);
        Ok(key)
    }

    /// Insert a directed route. Both endpoints must exist and the ordered
    /// pair must not already carry a route.
    pub fn add_edge(&mut self, edge: Edge) -> Result<EdgeKey, WorldError> {
        let from = self.key_for(edge.source.as_str())?;
        let to = self.key_for(edge.target.as_str())?;
        if self.routes.contains_key(&(from, to)) {
            return Err(WorldError::DuplicateRoute {
                from: edge.source,
                to: edge.target,
            });
        }

        let edge_key = self.edges.insert(edge);
        self.routes.insert((from, to), edge_key);
        if let Some(adj) = self.adjacency.get_mut(from) {
            adj.outputs.push(edge_key);
        }
        if let Some(adj) = self.adjacency.get_mut(to) {
            adj.inputs.push(edge_key);
        }
        Ok(edge_key)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Look up a node by id.
    pub fn find_node(&self, id: &str) -> Result<&Node, WorldError> {
        self.index
            .get(id)
            .and_then(|&key| self.nodes.get(key))
            .ok_or_else(|| WorldError::NodeNotFound(NodeId::new(id)))
    }

    /// Look up the route `source -> target`. Directed: the reverse route is
    /// never returned.
    pub fn find_edge(&self, source: &str, target: &str) -> Result<&Edge, WorldError> {
        self.edge_key(source, target)
            .and_then(|key| self.edges.get(key))
            .ok_or_else(|| WorldError::RouteNotFound {
                from: NodeId::new(source),
                to: NodeId::new(target),
            })
    }

    /// Returns true if a node with this id exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Returns true if the route `source -> target` exists.
    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        self.edge_key(source, target).is_some()
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of routes.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterate over all nodes, ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.index.values().filter_map(|&key| self.nodes.get(key))
    }

    /// Iterate over all routes, ordered by `(source, target)` id.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        let mut edges: Vec<&Edge> = self.edges.values().collect();
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
        edges.into_iter()
    }

    /// Routes leaving `id`, in insertion order. Empty for unknown ids.
    pub fn outgoing(&self, id: &str) -> impl Iterator<Item = &Edge> {
        self.adjacent(id, |adj| &adj.outputs)
    }

    /// Routes arriving at `id`, in insertion order. Empty for unknown ids.
    pub fn incoming(&self, id: &str) -> impl Iterator<Item = &Edge> {
        self.adjacent(id, |adj| &adj.inputs)
    }

    /// Current status of every node, ordered by id.
    pub fn node_statuses(&self) -> Vec<(NodeId, NodeStatus)> {
        self.nodes().map(|n| (n.id.clone(), n.status)).collect()
    }

    fn adjacent<'a>(
        &'a self,
        id: &str,
        side: impl Fn(&'a NodeAdjacency) -> &'a Vec<EdgeKey>,
    ) -> impl Iterator<Item = &'a Edge> {
        let keys: &[EdgeKey] = self
            .index
            .get(id)
            .and_then(|&key| self.adjacency.get(key))
            .map(|adj| side(adj).as_slice())
            .unwrap_or(&[]);
        keys.iter().filter_map(|&key| self.edges.get(key))
    }

    fn key_for(&self, id: &str) -> Result<NodeKey, WorldError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| WorldError::InvalidEntity(NodeId::new(id)))
    }

    fn edge_key(&self, source: &str, target: &str) -> Option<EdgeKey> {
        let from = *self.index.get(source)?;
        let to = *self.index.get(target)?;
        self.routes.get(&(from, to)).copied()
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    /// Set a node's status. Returns the previous status.
    pub fn set_node_status(
        &mut self,
        id: &str,
        status: NodeStatus,
    ) -> Result<NodeStatus, WorldError> {
        let key = self.key_for(id)?;
        let node = self
            .nodes
            .get_mut(key)
            .ok_or_else(|| WorldError::InvalidEntity(NodeId::new(id)))?;
        Ok(std::mem::replace(&mut node.status, status))
    }

    /// Add `delta` (possibly negative) to a node's supplies. Returns the new
    /// value. Fails without writing if the result would be negative.
    pub fn adjust_supplies(&mut self, id: &str, delta: i64) -> Result<u32, WorldError> {
        self.adjust(id, Quantity::Supplies, delta)
    }

    /// Add `delta` (possibly negative) to a node's needs. Returns the new
    /// value. Fails without writing if the result would be negative.
    pub fn adjust_needs(&mut self, id: &str, delta: i64) -> Result<u32, WorldError> {
        self.adjust(id, Quantity::Needs, delta)
    }

    /// Set the condition of the route `source -> target`. Returns the
    /// previous condition.
    pub fn set_route_status(
        &mut self,
        source: &str,
        target: &str,
        status: RouteStatus,
    ) -> Result<RouteStatus, WorldError> {
        let edge = self.edge_mut(source, target)?;
        Ok(std::mem::replace(&mut edge.status, status))
    }

    /// Set the risk rating of the route `source -> target`. Returns the
    /// previous rating.
    pub fn set_route_risk(
        &mut self,
        source: &str,
        target: &str,
        risk: RiskLevel,
    ) -> Result<RiskLevel, WorldError> {
        let edge = self.edge_mut(source, target)?;
        Ok(std::mem::replace(&mut edge.risk, risk))
    }

    fn edge_mut(&mut self, source: &str, target: &str) -> Result<&mut Edge, WorldError> {
        self.edge_key(source, target)
            .and_then(|key| self.edges.get_mut(key))
            .ok_or_else(|| WorldError::RouteNotFound {
                from: NodeId::new(source),
                to: NodeId::new(target),
            })
    }

    fn adjust(&mut self, id: &str, quantity: Quantity, delta: i64) -> Result<u32, WorldError> {
        let key = self.key_for(id)?;
        let node = self
            .nodes
            .get_mut(key)
            .ok_or_else(|| WorldError::InvalidEntity(NodeId::new(id)))?;
        let slot = match quantity {
            Quantity::Supplies => &mut node.supplies,
            Quantity::Needs => &mut node.needs,
        };

        let current = *slot;
        let next = i64::from(current).checked_add(delta);
        let value = match next {
            Some(v) if v < 0 => {
                return Err(WorldError::NegativeQuantity {
                    node: node.id.clone(),
                    current,
                    delta,
                });
            }
            Some(v) => u32::try_from(v).ok(),
            None => None,
        };
        let value = value.ok_or_else(|| WorldError::QuantityOverflow {
            node: node.id.clone(),
            current,
            delta,
        })?;

        *slot = value;
        Ok(value)
    }

    // -----------------------------------------------------------------------
    // Hashing
    // -----------------------------------------------------------------------

    /// Deterministic FNV-1a hash over nodes and routes in canonical order.
    /// Equal worlds hash equal regardless of insertion order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mut mix = |bytes: &[u8]| {
            for &b in bytes {
                h ^= u64::from(b);
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        for node in self.nodes() {
            mix(node.id.as_str().as_bytes());
            mix(&[0xff, node.kind as u8, node.status as u8]);
            mix(&node.supplies.to_le_bytes());
            mix(&node.needs.to_le_bytes());
        }
        for edge in self.edges() {
            mix(edge.source.as_str().as_bytes());
            mix(&[0xfe]);
            mix(edge.target.as_str().as_bytes());
            mix(&[0xfd, edge.status as u8, edge.risk as u8]);
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, RiskLevel, RouteStatus};

    fn small_world() -> World {
        let mut world = World::new();
        world.add_node(Node::warehouse("W", 100)).unwrap();
        world.add_node(Node::demand("D", 80)).unwrap();
        world.add_node(Node::demand("E", 10)).unwrap();
        world
            .add_edge(Edge::new("W", "D", RouteStatus::Clear, RiskLevel::Low))
            .unwrap();
        world
            .add_edge(Edge::new("D", "E", RouteStatus::Damaged, RiskLevel::High))
            .unwrap();
        world
    }

    #[test]
    fn find_node_and_edge() {
        let world = small_world();
        assert_eq!(world.find_node("W").unwrap().kind, NodeKind::Warehouse);
        assert_eq!(world.find_edge("W", "D").unwrap().risk, RiskLevel::Low);
        assert_eq!(world.node_count(), 3);
        assert_eq!(world.edge_count(), 2);
    }

    #[test]
    fn find_missing_entities() {
        let world = small_world();
        assert_eq!(
            world.find_node("Nowhere").unwrap_err(),
            WorldError::NodeNotFound(NodeId::new("Nowhere"))
        );
        assert!(matches!(
            world.find_edge("W", "E"),
            Err(WorldError::RouteNotFound { .. })
        ));
    }

    #[test]
    fn edges_are_directed() {
        let world = small_world();
        assert!(world.contains_edge("W", "D"));
        assert!(!world.contains_edge("D", "W"));
        assert!(world.find_edge("D", "W").is_err());
    }

    #[test]
    fn duplicate_node_rejected() {
        let mut world = small_world();
        let err = world.add_node(Node::demand("D", 5)).unwrap_err();
        assert_eq!(err, WorldError::DuplicateNode(NodeId::new("D")));
        assert_eq!(world.find_node("D").unwrap().needs, 80);
    }

    #[test]
    fn duplicate_route_rejected_but_reverse_allowed() {
        let mut world = small_world();
        let err = world
            .add_edge(Edge::new("W", "D", RouteStatus::Congested, RiskLevel::Medium))
            .unwrap_err();
        assert!(matches!(err, WorldError::DuplicateRoute { .. }));
        assert_eq!(world.find_edge("W", "D").unwrap().status, RouteStatus::Clear);

        world
            .add_edge(Edge::new("D", "W", RouteStatus::Clear, RiskLevel::Low))
            .unwrap();
        assert_eq!(world.edge_count(), 3);
    }

    #[test]
    fn dangling_route_rejected() {
        let mut world = small_world();
        let err = world
            .add_edge(Edge::new("W", "Ghost", RouteStatus::Clear, RiskLevel::Low))
            .unwrap_err();
        assert_eq!(err, WorldError::InvalidEntity(NodeId::new("Ghost")));
        assert_eq!(world.edge_count(), 2);
    }

    #[test]
    fn adjust_supplies_and_needs() {
        let mut world = small_world();
        assert_eq!(world.adjust_supplies("W", -30).unwrap(), 70);
        assert_eq!(world.adjust_supplies("W", 5).unwrap(), 75);
        assert_eq!(world.adjust_needs("D", -80).unwrap(), 0);
        assert_eq!(world.find_node("D").unwrap().needs, 0);
    }

    #[test]
    fn negative_quantity_rejected_without_mutation() {
        let mut world = small_world();
        let before = world.clone();
        let err = world.adjust_supplies("W", -101).unwrap_err();
        assert_eq!(
            err,
            WorldError::NegativeQuantity {
                node: NodeId::new("W"),
                current: 100,
                delta: -101,
            }
        );
        assert!(world.adjust_needs("E", -11).is_err());
        assert_eq!(world.state_hash(), before.state_hash());
    }

    #[test]
    fn overflow_rejected() {
        let mut world = small_world();
        assert!(matches!(
            world.adjust_supplies("W", i64::from(u32::MAX)),
            Err(WorldError::QuantityOverflow { .. })
        ));
        assert!(matches!(
            world.adjust_supplies("W", i64::MAX),
            Err(WorldError::QuantityOverflow { .. })
        ));
        assert_eq!(world.find_node("W").unwrap().supplies, 100);
    }

    #[test]
    fn unknown_entity_rejected() {
        let mut world = small_world();
        assert_eq!(
            world.set_node_status("Ghost", NodeStatus::Stable).unwrap_err(),
            WorldError::InvalidEntity(NodeId::new("Ghost"))
        );
        assert!(world.adjust_supplies("Ghost", 1).is_err());
        assert!(world.adjust_needs("Ghost", -1).is_err());
    }

    #[test]
    fn set_node_status_returns_previous() {
        let mut world = small_world();
        let prev = world.set_node_status("D", NodeStatus::Stable).unwrap();
        assert_eq!(prev, NodeStatus::Critical);
        assert_eq!(world.find_node("D").unwrap().status, NodeStatus::Stable);
    }

    #[test]
    fn route_mutators() {
        let mut world = small_world();
        let prev = world
            .set_route_status("D", "E", RouteStatus::Destroyed)
            .unwrap();
        assert_eq!(prev, RouteStatus::Damaged);
        world.set_route_risk("W", "D", RiskLevel::High).unwrap();
        assert_eq!(world.find_edge("W", "D").unwrap().risk, RiskLevel::High);
        assert!(world.set_route_status("E", "D", RouteStatus::Clear).is_err());
    }

    #[test]
    fn adjacency_queries() {
        let world = small_world();
        let out: Vec<&str> = world.outgoing("D").map(|e| e.target.as_str()).collect();
        let inc: Vec<&str> = world.incoming("D").map(|e| e.source.as_str()).collect();
        assert_eq!(out, vec!["E"]);
        assert_eq!(inc, vec!["W"]);
        assert_eq!(world.outgoing("Ghost").count(), 0);
    }

    #[test]
    fn iteration_is_canonical() {
        let mut a = World::new();
        a.add_node(Node::demand("B", 1)).unwrap();
        a.add_node(Node::warehouse("A", 1)).unwrap();
        let mut b = World::new();
        b.add_node(Node::warehouse("A", 1)).unwrap();
        b.add_node(Node::demand("B", 1)).unwrap();

        let ids: Vec<&str> = a.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn state_hash_tracks_mutations() {
        let mut world = small_world();
        let h0 = world.state_hash();
        world.adjust_needs("E", -1).unwrap();
        assert_ne!(world.state_hash(), h0);
        world.adjust_needs("E", 1).unwrap();
        assert_eq!(world.state_hash(), h0);
    }
}
