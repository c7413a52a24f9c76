//! The engine: the single owner of live world state.

use crate::config::{ConfigError, EngineConfig};
use crate::dispatch::{self, DispatchReport, DispatchRules, Outcome, RejectReason};
use crate::event::{ChangeListener, Event, EventKind, EventLog, PassiveListener};
use crate::injector::{self, AidDelivery, RouteCollapse};
use crate::id::NodeId;
use crate::model::NodeStatus;
use crate::rng::{SimRng, UnitDraw};
use crate::scenario::{Scenario, ScenarioError};
use crate::snapshot::WorldSnapshot;
use crate::world::World;
use tracing::{debug, info, instrument};

/// Reasons an engine cannot be created.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error("invalid engine settings: {0}")]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Registered observers. Observers only ever see copies of engine state.
#[derive(Default)]
struct Listeners {
    events: Vec<PassiveListener>,
    changes: Vec<ChangeListener>,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("events", &self.events.len())
            .field("changes", &self.changes.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The simulation engine. Owns the single [`World`], the draw source for
/// stochastic outcomes, and the event log.
///
/// Operations take `&mut self`, so one engine serves exactly one operator at
/// a time. Every operation is assigned a sequence number, which tags the
/// events it records.
pub struct Engine {
    world: World,
    /// Pristine copy of the world built from `scenario`, restored on reset.
    initial: World,
    scenario: Scenario,
    config: EngineConfig,
    rules: DispatchRules,
    draw: Box<dyn UnitDraw>,
    events: EventLog,
    listeners: Listeners,
    /// Sequence number of the next operation.
    next_seq: u64,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("world", &self.world)
            .field("scenario", &self.scenario.name)
            .field("config", &self.config)
            .field("events", &self.events)
            .field("listeners", &self.listeners)
            .field("next_seq", &self.next_seq)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Build an engine from a scenario. Outcomes on damaged routes are drawn
    /// from a [`SimRng`] seeded with `config.seed`.
    pub fn new(scenario: Scenario, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let world = scenario.build()?;
        info!(
            scenario = %scenario.name,
            nodes = world.node_count(),
            routes = world.edge_count(),
            seed = config.seed,
            "engine created"
        );
        Ok(Self {
            initial: world.clone(),
            world,
            rules: DispatchRules::from_config(&config),
            draw: Box::new(SimRng::new(config.seed)),
            events: EventLog::new(config.event_capacity),
            listeners: Listeners::default(),
            next_seq: 0,
            scenario,
            config,
        })
    }

    /// Replace the draw source. Tests use this to force outcomes.
    pub fn with_draw(mut self, draw: impl UnitDraw + 'static) -> Self {
        self.set_draw(draw);
        self
    }

    pub fn set_draw(&mut self, draw: impl UnitDraw + 'static) {
        self.draw = Box::new(draw);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Read-only view of the live world.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rules(&self) -> &DispatchRules {
        &self.rules
    }

    /// Owned structural copy of the current world.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.world)
    }

    /// The world as the scenario built it, before any operation.
    pub fn initial_snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.initial)
    }

    pub fn state_hash(&self) -> u64 {
        self.world.state_hash()
    }

    /// Number of operations issued, including rejected ones and resets.
    pub fn operation_count(&self) -> u64 {
        self.next_seq
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Recorded events of one kind, oldest first.
    pub fn events_of(&self, kind: EventKind) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.kind() == kind)
    }

    /// Events dropped from the log because it was full.
    pub fn dropped_events(&self) -> u64 {
        self.events.evicted()
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Register a listener called with every recorded event.
    pub fn on_event(&mut self, listener: impl FnMut(&Event) + 'static) {
        self.listeners.events.push(Box::new(listener));
    }

    /// Register a listener called with a snapshot after every state change.
    pub fn on_change(&mut self, listener: impl FnMut(&WorldSnapshot) + 'static) {
        self.listeners.changes.push(Box::new(listener));
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Attempt to move `amount` supplies from `source` to `target`.
    #[instrument(skip_all, fields(from = source, to = target, amount))]
    pub fn dispatch(&mut self, source: &str, target: &str, amount: u32) -> DispatchReport {
        let seq = self.begin();
        let before = self.world.node_statuses();
        let report = dispatch::dispatch(
            &mut self.world,
            &mut *self.draw,
            &self.rules,
            source,
            target,
            amount,
        );

        let (source, target) = (NodeId::new(source), NodeId::new(target));
        let outcome = match &report {
            DispatchReport::Success { .. } => Outcome::Success,
            DispatchReport::Delayed { .. } => Outcome::Delayed,
            DispatchReport::Failure { .. } => Outcome::Failure,
            DispatchReport::Rejected(reason) => {
                self.record(Event::DispatchRejected {
                    seq,
                    source,
                    target,
                    amount,
                    reason: *reason,
                });
                return report;
            }
        };
        info!(from = %source, to = %target, amount, ?outcome, "dispatch resolved");
        self.record(Event::DispatchResolved {
            seq,
            source,
            target,
            amount,
            outcome,
        });
        self.record_status_changes(seq, before);
        self.notify_change();
        report
    }

    /// Destroy the route `source -> target` and isolate its target.
    #[instrument(skip_all, fields(from = source, to = target))]
    pub fn collapse_route(
        &mut self,
        source: &str,
        target: &str,
    ) -> Result<RouteCollapse, RejectReason> {
        let seq = self.begin();
        let before = self.world.node_statuses();
        match injector::collapse_route(&mut self.world, source, target) {
            Ok(collapse) => {
                self.record(Event::RouteCollapsed {
                    seq,
                    from: collapse.from.clone(),
                    to: collapse.to.clone(),
                });
                self.record_status_changes(seq, before);
                self.notify_change();
                Ok(collapse)
            }
            Err(reason) => Err(self.reject_injection(seq, reason)),
        }
    }

    /// Apply aid arriving from outside the modeled graph.
    #[instrument(skip_all, fields(node = target, amount))]
    pub fn deliver_external_aid(
        &mut self,
        target: &str,
        amount: u32,
    ) -> Result<AidDelivery, RejectReason> {
        let seq = self.begin();
        let before = self.world.node_statuses();
        match injector::deliver_external_aid(&mut self.world, target, amount) {
            Ok(aid) => {
                info!(node = target, amount, needs = aid.needs_after, "external aid delivered");
                self.record(Event::ExternalAidDelivered {
                    seq,
                    target: aid.target.clone(),
                    amount,
                    needs_after: aid.needs_after,
                });
                self.record_status_changes(seq, before);
                self.notify_change();
                Ok(aid)
            }
            Err(reason) => Err(self.reject_injection(seq, reason)),
        }
    }

    /// Restore the world built from the scenario and clear the event log.
    /// The draw source keeps its position.
    #[instrument(skip_all)]
    pub fn reset(&mut self) {
        let seq = self.begin();
        self.world = self.initial.clone();
        self.events.clear();
        info!(scenario = %self.scenario.name, "world reset");
        self.record(Event::WorldReset { seq });
        self.notify_change();
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn begin(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn reject_injection(&mut self, seq: u64, reason: RejectReason) -> RejectReason {
        debug!(%reason, "injection rejected");
        self.record(Event::InjectionRejected { seq, reason });
        reason
    }

    fn record(&mut self, event: Event) {
        for listener in &mut self.listeners.events {
            listener(&event);
        }
        self.events.push(event);
    }

    /// Record a status change event for every node whose status differs
    /// from `before`. The node set never changes during an operation, so
    /// both lists share the same order.
    fn record_status_changes(&mut self, seq: u64, before: Vec<(NodeId, NodeStatus)>) {
        let after = self.world.node_statuses();
        for ((node, from), (_, to)) in before.into_iter().zip(after) {
            if from != to {
                debug!(%node, %from, %to, "status changed");
                self.record(Event::NodeStatusChanged { seq, node, from, to });
            }
        }
    }

    fn notify_change(&mut self) {
        if self.listeners.changes.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for listener in &mut self.listeners.changes {
            listener(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Node, RiskLevel, RouteStatus};
    use crate::rng::ScriptedDraw;
    use crate::scenario::{CAMP_C, VILLAGE_B, WAREHOUSE_A, ZONE_D};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine() -> Engine {
        Engine::new(Scenario::default(), EngineConfig::default()).unwrap()
    }

    #[test]
    fn operations_are_numbered() {
        let mut engine = engine();
        engine.dispatch(WAREHOUSE_A, VILLAGE_B, 10);
        engine.dispatch(WAREHOUSE_A, VILLAGE_B, 0);
        let _ = engine.collapse_route(VILLAGE_B, ZONE_D);
        assert_eq!(engine.operation_count(), 3);
        let seqs: Vec<u64> = engine.events().map(Event::seq).collect();
        assert_eq!(seqs.first(), Some(&0));
        assert_eq!(seqs.last(), Some(&2));
    }

    #[test]
    fn resolved_dispatch_records_status_change() {
        let mut engine = engine();
        engine.dispatch(WAREHOUSE_A, VILLAGE_B, 80);
        let kinds: Vec<EventKind> = engine.events().map(Event::kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::DispatchResolved, EventKind::NodeStatusChanged]
        );
        let change = engine.events_of(EventKind::NodeStatusChanged).next().unwrap();
        assert_eq!(
            change,
            &Event::NodeStatusChanged {
                seq: 0,
                node: NodeId::new(VILLAGE_B),
                from: NodeStatus::Critical,
                to: NodeStatus::Stable,
            }
        );
    }

    #[test]
    fn rejected_dispatch_records_reason_only() {
        let mut engine = engine();
        let report = engine.dispatch(WAREHOUSE_A, ZONE_D, 10);
        assert_eq!(report.rejection(), Some(RejectReason::NoRoute));
        let events: Vec<&Event> = engine.events().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::DispatchRejected);
    }

    #[test]
    fn injected_draw_controls_damaged_route() {
        let mut engine = engine().with_draw(ScriptedDraw::new([0.9, 0.1]));
        engine.deliver_external_aid(ZONE_D, 0).unwrap();
        engine.world.adjust_supplies(VILLAGE_B, 50).unwrap();

        let first = engine.dispatch(VILLAGE_B, ZONE_D, 10);
        let second = engine.dispatch(VILLAGE_B, ZONE_D, 10);
        assert_eq!(first.outcome(), Some(Outcome::Delayed));
        assert_eq!(second.outcome(), Some(Outcome::Failure));
        assert_eq!(engine.world().find_node(VILLAGE_B).unwrap().supplies, 30);
        assert_eq!(engine.world().find_node(ZONE_D).unwrap().needs, 190);
    }

    #[test]
    fn change_listeners_see_committed_state_only() {
        let mut engine = engine();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.on_change(move |snap| sink.borrow_mut().push(snap.clone()));

        engine.dispatch(WAREHOUSE_A, VILLAGE_B, 500);
        assert!(seen.borrow().is_empty());

        engine.deliver_external_aid(CAMP_C, 50).unwrap();
        engine.reset();
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].node(CAMP_C).unwrap().needs, 100);
        assert_eq!(seen[1], engine.snapshot());
    }

    #[test]
    fn event_listeners_receive_every_event() {
        let mut engine = engine();
        let count = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&count);
        engine.on_event(move |_| *sink.borrow_mut() += 1);
        let _ = engine.collapse_route(VILLAGE_B, ZONE_D);
        let _ = engine.collapse_route(ZONE_D, VILLAGE_B);
        // Collapse, isolation status change, and the rejected injection.
        assert_eq!(*count.borrow(), 3);
    }

    #[test]
    fn reset_clears_log_and_restores_world() {
        let mut engine = engine();
        let initial = engine.snapshot();
        engine.dispatch(WAREHOUSE_A, CAMP_C, 60);
        let _ = engine.collapse_route(WAREHOUSE_A, VILLAGE_B);
        engine.reset();
        assert_eq!(engine.snapshot(), initial);
        let events: Vec<&Event> = engine.events().collect();
        assert_eq!(events, vec![&Event::WorldReset { seq: 2 }]);
        assert_eq!(engine.operation_count(), 3);
    }

    #[test]
    fn small_event_log_drops_oldest() {
        let config = EngineConfig {
            event_capacity: 2,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(Scenario::default(), config).unwrap();
        for _ in 0..3 {
            engine.dispatch(WAREHOUSE_A, VILLAGE_B, 0);
        }
        assert_eq!(engine.events().count(), 2);
        assert_eq!(engine.dropped_events(), 1);
    }

    #[test]
    fn unbounded_event_capacity_allocates_lazily() {
        let config = EngineConfig {
            event_capacity: usize::MAX,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(Scenario::default(), config).unwrap();
        engine.dispatch(WAREHOUSE_A, VILLAGE_B, 5);
        assert_eq!(engine.events().count(), 1);
        assert_eq!(engine.dropped_events(), 0);
    }

    #[test]
    fn invalid_settings_refuse_to_start() {
        let config = EngineConfig {
            damaged_failure_probability: f64::NAN,
            ..EngineConfig::default()
        };
        let err = Engine::new(Scenario::default(), config).unwrap_err();
        assert!(matches!(err, EngineError::Config(ConfigError::FailureProbability(_))));
        assert!(err.to_string().contains("damaged_failure_probability"));
    }

    #[test]
    fn unstorable_supply_total_refuses_to_start() {
        let scenario = Scenario::new("hoard")
            .with_node(Node::warehouse("A", u32::MAX))
            .with_node(Node::warehouse("B", u32::MAX))
            .with_route(Edge::new("A", "B", RouteStatus::Clear, RiskLevel::Low));
        assert!(matches!(
            Engine::new(scenario, EngineConfig::default()),
            Err(EngineError::Scenario(ScenarioError::SupplyOverflow { .. }))
        ));
    }

    #[test]
    fn full_supply_total_moves_without_loss() {
        let scenario = Scenario::new("brim")
            .with_node(Node::warehouse("A", u32::MAX - 10))
            .with_node(Node::warehouse("B", 10))
            .with_route(Edge::new("A", "B", RouteStatus::Clear, RiskLevel::Low));
        let mut engine = Engine::new(scenario, EngineConfig::default()).unwrap();
        let report = engine.dispatch("A", "B", u32::MAX - 10);
        assert_eq!(report.outcome(), Some(Outcome::Success));
        assert_eq!(engine.world().find_node("A").unwrap().supplies, 0);
        assert_eq!(engine.world().find_node("B").unwrap().supplies, u32::MAX);
        assert_eq!(engine.snapshot().total_supplies(), u64::from(u32::MAX));
    }

    #[test]
    fn initial_snapshot_survives_operations() {
        let mut engine = engine();
        let start = engine.snapshot();
        engine.dispatch(WAREHOUSE_A, VILLAGE_B, 30);
        assert_eq!(engine.initial_snapshot(), start);
        assert_ne!(engine.snapshot(), start);
    }

    #[test]
    fn debug_output_names_scenario() {
        let rendered = format!("{:?}", engine());
        assert!(rendered.contains("baseline"));
    }
}
