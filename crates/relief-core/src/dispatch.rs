//! Dispatch: moving supplies from one node to another along a single
//! directed route.
//!
//! A dispatch runs in two phases:
//!
//! 1. **Validate** -- six preconditions, checked in order against a shared
//!    borrow of the world. The first failure short-circuits with a
//!    [`RejectReason`] and nothing is written.
//! 2. **Commit** -- resolve the outcome from the route condition (drawing
//!    from the injected [`UnitDraw`] only for damaged routes), deduct the
//!    amount from the source, and credit the target unless the convoy was
//!    lost.

use crate::config::EngineConfig;
use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::id::NodeId;
use crate::model::{NodeKind, NodeStatus, RouteStatus};
use crate::rng::UnitDraw;
use crate::world::{World, WorldError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Why an operation was refused. A rejected operation never mutates state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum RejectReason {
    #[error("amount must be greater than zero")]
    InvalidAmount,
    #[error("source or target node does not exist")]
    UnknownNode,
    #[error("no route from source to target")]
    NoRoute,
    #[error("route is destroyed")]
    RouteDestroyed,
    #[error("target is cut off")]
    TargetUnreachable,
    #[error("source does not hold enough supplies")]
    InsufficientSupply,
}

/// Resolved result of a dispatch that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    /// Delivered in full. No time cost is modeled.
    Delayed,
    /// Convoy lost; the deducted amount is gone.
    Failure,
}

/// Tagged result of a dispatch call, for the caller to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchReport {
    Success {
        source: NodeId,
        target: NodeId,
        amount: u32,
    },
    Delayed {
        source: NodeId,
        target: NodeId,
        amount: u32,
    },
    Failure {
        source: NodeId,
        target: NodeId,
        amount: u32,
    },
    Rejected(RejectReason),
}

impl DispatchReport {
    /// The resolved outcome, or `None` if the dispatch was rejected.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            DispatchReport::Success { .. } => Some(Outcome::Success),
            DispatchReport::Delayed { .. } => Some(Outcome::Delayed),
            DispatchReport::Failure { .. } => Some(Outcome::Failure),
            DispatchReport::Rejected(_) => None,
        }
    }

    /// Amount credited to the target, if anything arrived.
    pub fn delivered(&self) -> Option<u32> {
        match self {
            DispatchReport::Success { amount, .. } | DispatchReport::Delayed { amount, .. } => {
                Some(*amount)
            }
            _ => None,
        }
    }

    pub fn rejection(&self) -> Option<RejectReason> {
        match self {
            DispatchReport::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, DispatchReport::Rejected(_))
    }

    fn resolved(outcome: Outcome, source: &str, target: &str, amount: u32) -> Self {
        let (source, target) = (NodeId::new(source), NodeId::new(target));
        match outcome {
            Outcome::Success => DispatchReport::Success {
                source,
                target,
                amount,
            },
            Outcome::Delayed => DispatchReport::Delayed {
                source,
                target,
                amount,
            },
            Outcome::Failure => DispatchReport::Failure {
                source,
                target,
                amount,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Numeric parameters of outcome resolution and status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchRules {
    /// Probability that a dispatch over a `Damaged` route is lost.
    pub failure_probability: Fixed64,
    /// Remaining need below which a delivered-to node becomes `Recovering`.
    pub recovering_threshold: u32,
}

impl DispatchRules {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            failure_probability: f64_to_fixed64(config.damaged_failure_probability),
            recovering_threshold: config.recovering_threshold,
        }
    }
}

impl Default for DispatchRules {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Check the dispatch preconditions in order. Returns the condition of the
/// route to be used on success.
pub fn check_preconditions(
    world: &World,
    source: &str,
    target: &str,
    amount: u32,
) -> Result<RouteStatus, RejectReason> {
    if amount == 0 {
        return Err(RejectReason::InvalidAmount);
    }
    let from = world
        .find_node(source)
        .map_err(|_| RejectReason::UnknownNode)?;
    let to = world
        .find_node(target)
        .map_err(|_| RejectReason::UnknownNode)?;
    let route = world
        .find_edge(source, target)
        .map_err(|_| RejectReason::NoRoute)?;
    if route.status == RouteStatus::Destroyed {
        return Err(RejectReason::RouteDestroyed);
    }
    if !to.status.accepts_deliveries() {
        return Err(RejectReason::TargetUnreachable);
    }
    if from.supplies < amount {
        return Err(RejectReason::InsufficientSupply);
    }
    Ok(route.status)
}

/// Resolve the outcome for a route condition. Draws only for `Damaged`.
pub fn resolve_outcome(
    route: RouteStatus,
    rules: &DispatchRules,
    draw: &mut dyn UnitDraw,
) -> Result<Outcome, RejectReason> {
    match route {
        RouteStatus::Clear => Ok(Outcome::Success),
        RouteStatus::Congested => Ok(Outcome::Delayed),
        RouteStatus::Damaged => {
            if draw.chance(rules.failure_probability) {
                Ok(Outcome::Failure)
            } else {
                Ok(Outcome::Delayed)
            }
        }
        RouteStatus::Destroyed => Err(RejectReason::RouteDestroyed),
    }
}

/// Status a demand node moves to after a delivery leaves it with `needs`
/// outstanding, or `None` to keep its current status.
pub fn status_after_delivery(needs: u32, recovering_threshold: u32) -> Option<NodeStatus> {
    if needs == 0 {
        Some(NodeStatus::Stable)
    } else if needs < recovering_threshold {
        Some(NodeStatus::Recovering)
    } else {
        None
    }
}

/// Validate and, if valid, execute a dispatch of `amount` from `source` to
/// `target`.
pub fn dispatch(
    world: &mut World,
    draw: &mut dyn UnitDraw,
    rules: &DispatchRules,
    source: &str,
    target: &str,
    amount: u32,
) -> DispatchReport {
    let route = match check_preconditions(world, source, target, amount) {
        Ok(route) => route,
        Err(reason) => {
            debug!(from = source, to = target, amount, %reason, "dispatch rejected");
            return DispatchReport::Rejected(reason);
        }
    };
    let outcome = match resolve_outcome(route, rules, draw) {
        Ok(outcome) => outcome,
        Err(reason) => return DispatchReport::Rejected(reason),
    };

    // The convoy departs regardless of how it ends.
    if let Err(err) = world.adjust_supplies(source, -i64::from(amount)) {
        contract_violation(&err, "deduct source supplies");
        return DispatchReport::Rejected(RejectReason::InsufficientSupply);
    }

    match outcome {
        Outcome::Failure => {
            warn!(from = source, to = target, amount, "convoy lost on damaged route");
        }
        Outcome::Success | Outcome::Delayed => credit_target(world, target, amount, rules),
    }

    DispatchReport::resolved(outcome, source, target, amount)
}

/// Credit a delivered amount to the target and apply the post-delivery
/// status rule for demand nodes.
fn credit_target(world: &mut World, target: &str, amount: u32, rules: &DispatchRules) {
    let (kind, needs) = match world.find_node(target) {
        Ok(node) => (node.kind, node.needs),
        Err(err) => {
            contract_violation(&err, "read target");
            return;
        }
    };

    match kind {
        NodeKind::Warehouse => {
            committed(world.adjust_supplies(target, i64::from(amount)), "credit supplies");
        }
        NodeKind::Demand => {
            let covered = amount.min(needs);
            let surplus = amount - covered;
            committed(world.adjust_needs(target, -i64::from(covered)), "reduce needs");
            if surplus > 0 {
                committed(world.adjust_supplies(target, i64::from(surplus)), "store surplus");
            }
            if let Some(status) = status_after_delivery(needs - covered, rules.recovering_threshold)
            {
                committed(world.set_node_status(target, status), "update status");
            }
        }
    }
}

/// A world mutation that was validated beforehand must not fail.
pub(crate) fn committed<T>(result: Result<T, WorldError>, step: &'static str) {
    if let Err(err) = result {
        contract_violation(&err, step);
    }
}

fn contract_violation(err: &WorldError, step: &'static str) {
    error!(%err, step, "world rejected a pre-validated mutation");
    debug_assert!(false, "pre-validated mutation failed at {step}: {err}");
}
