//! Human-readable text for operation results. The engine itself never
//! formats user-facing messages.

use relief_core::dispatch::{DispatchReport, RejectReason};
use relief_core::injector::{AidDelivery, RouteCollapse};
use relief_core::snapshot::{
    ATKINSON_EPSILON, WorldSnapshot, atkinson_index, coverage, needs_met_shares,
};
use std::fmt::Write;

pub fn dispatch_message(report: &DispatchReport) -> String {
    match report {
        DispatchReport::Success {
            source,
            target,
            amount,
        } => format!("Success: {amount} units moved from {source} to {target}."),
        DispatchReport::Delayed {
            source,
            target,
            amount,
        } => format!("Delayed: {amount} units from {source} reached {target} after delays."),
        DispatchReport::Failure {
            source,
            target,
            amount,
        } => format!("Failure: convoy of {amount} units from {source} to {target} was lost."),
        DispatchReport::Rejected(reason) => format!("Rejected: {}.", rejection_hint(*reason)),
    }
}

pub fn collapse_message(result: &Result<RouteCollapse, RejectReason>) -> String {
    match result {
        Ok(collapse) => format!(
            "Route {} -> {} destroyed; {} is cut off.",
            collapse.from, collapse.to, collapse.to
        ),
        Err(reason) => format!("Rejected: {}.", rejection_hint(*reason)),
    }
}

pub fn aid_message(result: &Result<AidDelivery, RejectReason>) -> String {
    match result {
        Ok(aid) => format!(
            "External aid of {} units reached {}; remaining need {}.",
            aid.amount, aid.target, aid.needs_after
        ),
        Err(reason) => format!("Rejected: {}.", rejection_hint(*reason)),
    }
}

/// Operator-facing explanation of a rejection.
pub fn rejection_hint(reason: RejectReason) -> &'static str {
    match reason {
        RejectReason::InvalidAmount => "enter an amount greater than zero",
        RejectReason::UnknownNode => "no such location",
        RejectReason::NoRoute => "no direct route between these locations",
        RejectReason::RouteDestroyed => "the route is destroyed",
        RejectReason::TargetUnreachable => "the destination is cut off",
        RejectReason::InsufficientSupply => "not enough supplies at the source",
    }
}

/// Fixed-width table of every node and route, followed by the relief
/// metrics measured against `initial`.
pub fn status_table(snapshot: &WorldSnapshot, initial: &WorldSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:<10} {:>8} {:>8}  {}",
        "NODE", "KIND", "SUPPLIES", "NEEDS", "STATUS"
    );
    for node in &snapshot.nodes {
        let _ = writeln!(
            out,
            "{:<16} {:<10} {:>8} {:>8}  {}",
            node.id.as_str(),
            node.kind.to_string(),
            node.supplies,
            node.needs,
            node.status
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<34} {:<10} {}", "ROUTE", "STATUS", "RISK");
    for edge in &snapshot.edges {
        let route = format!("{} -> {}", edge.source, edge.target);
        let _ = writeln!(
            out,
            "{:<34} {:<10} {}",
            route,
            edge.status.to_string(),
            edge.risk
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", metrics_line(initial, snapshot));
    out
}

/// Coverage as a percentage and the Atkinson index, `n/a` where undefined.
pub fn metrics_line(initial: &WorldSnapshot, current: &WorldSnapshot) -> String {
    let coverage = coverage(initial, current)
        .map_or_else(|| "n/a".to_string(), |c| format!("{:.1}%", c * 100.0));
    let atkinson = atkinson_index(&needs_met_shares(initial, current), ATKINSON_EPSILON)
        .map_or_else(|| "n/a".to_string(), |a| format!("{a:.3}"));
    format!("COVERAGE {coverage}   ATKINSON(e={ATKINSON_EPSILON}) {atkinson}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use relief_core::id::NodeId;
    use relief_core::scenario::Scenario;

    #[test]
    fn dispatch_messages() {
        let report = DispatchReport::Failure {
            source: NodeId::new("Village_B"),
            target: NodeId::new("Zone_D"),
            amount: 10,
        };
        assert_eq!(
            dispatch_message(&report),
            "Failure: convoy of 10 units from Village_B to Zone_D was lost."
        );
        assert_eq!(
            dispatch_message(&DispatchReport::Rejected(RejectReason::InsufficientSupply)),
            "Rejected: not enough supplies at the source."
        );
    }

    #[test]
    fn injector_messages() {
        assert_eq!(
            aid_message(&Err(RejectReason::UnknownNode)),
            "Rejected: no such location."
        );
        let aid = AidDelivery {
            target: NodeId::new("Camp_C"),
            amount: 50,
            needs_before: 150,
            needs_after: 100,
        };
        assert!(aid_message(&Ok(aid)).contains("remaining need 100"));
    }

    #[test]
    fn table_lists_everything() {
        let world = Scenario::default().build().unwrap();
        let snapshot = WorldSnapshot::capture(&world);
        let table = status_table(&snapshot, &snapshot);
        assert!(table.contains("Zone_D"));
        assert!(table.contains("Inaccessible"));
        assert!(table.contains("Village_B -> Zone_D"));
        // Header, four nodes, blank, header, three routes, blank, metrics.
        assert_eq!(table.lines().count(), 12);
        assert_eq!(
            table.lines().last(),
            Some("COVERAGE 0.0%   ATKINSON(e=0.5) n/a")
        );
    }

    #[test]
    fn metrics_after_partial_relief() {
        let mut world = Scenario::default().build().unwrap();
        let start = WorldSnapshot::capture(&world);
        world.adjust_needs("Village_B", -30).unwrap();
        let now = WorldSnapshot::capture(&world);
        assert_eq!(metrics_line(&start, &now), "COVERAGE 7.0%   ATKINSON(e=0.5) 0.667");
    }
}
