//! Event injectors: external happenings applied to the world, as opposed to
//! operator-initiated dispatches.

use crate::dispatch::{RejectReason, committed};
use crate::id::NodeId;
use crate::model::{NodeStatus, RiskLevel, RouteStatus};
use crate::world::World;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What a route collapse changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCollapse {
    pub from: NodeId,
    pub to: NodeId,
    /// Route condition before the collapse.
    pub route_was: RouteStatus,
    /// Target status before the collapse.
    pub target_was: NodeStatus,
}

/// What an external aid delivery changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AidDelivery {
    pub target: NodeId,
    pub amount: u32,
    pub needs_before: u32,
    pub needs_after: u32,
}

/// Destroy the route `source -> target` and isolate its target.
///
/// Sets the route to `Destroyed` with `High` risk and the target to
/// `CriticalIsolated`. Idempotent. Fails only if the route does not exist.
pub fn collapse_route(
    world: &mut World,
    source: &str,
    target: &str,
) -> Result<RouteCollapse, RejectReason> {
    let route_was = world
        .find_edge(source, target)
        .map_err(|_| RejectReason::NoRoute)?
        .status;
    let target_was = world
        .find_node(target)
        .map_err(|_| RejectReason::UnknownNode)?
        .status;

    committed(
        world.set_route_status(source, target, RouteStatus::Destroyed),
        "destroy route",
    );
    committed(world.set_route_risk(source, target, RiskLevel::High), "raise risk");
    committed(
        world.set_node_status(target, NodeStatus::CriticalIsolated),
        "isolate target",
    );

    if route_was != RouteStatus::Destroyed {
        warn!(from = source, to = target, "route collapsed");
    }
    Ok(RouteCollapse {
        from: NodeId::new(source),
        to: NodeId::new(target),
        route_was,
        target_was,
    })
}

/// Apply aid that originates outside the modeled graph.
///
/// Reduces the target's needs by `amount` (floored at zero) and marks it
/// `Recovering` whatever its prior status. No warehouse is drawn down.
pub fn deliver_external_aid(
    world: &mut World,
    target: &str,
    amount: u32,
) -> Result<AidDelivery, RejectReason> {
    let needs_before = world
        .find_node(target)
        .map_err(|_| RejectReason::UnknownNode)?
        .needs;
    let covered = amount.min(needs_before);

    committed(world.adjust_needs(target, -i64::from(covered)), "reduce needs");
    committed(
        world.set_node_status(target, NodeStatus::Recovering),
        "mark recovering",
    );

    Ok(AidDelivery {
        target: NodeId::new(target),
        amount,
        needs_before,
        needs_after: needs_before - covered,
    })
}
