//! Shared test helpers for building engines and small worlds.

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::model::{Edge, Node, RiskLevel, RouteStatus};
use crate::rng::ScriptedDraw;
use crate::scenario::Scenario;

pub const SOURCE: &str = "Depot";
pub const TARGET: &str = "Site";

/// Engine on the baseline scenario with default settings.
pub fn baseline_engine() -> Engine {
    Engine::new(Scenario::default(), EngineConfig::default()).expect("baseline scenario is valid")
}

/// Engine on the baseline scenario with the given seed.
pub fn seeded_engine(seed: u64) -> Engine {
    Engine::new(Scenario::default(), EngineConfig::default().with_seed(seed))
        .expect("baseline scenario is valid")
}

/// Engine on the baseline scenario whose draws replay `draws`.
pub fn scripted_engine(draws: impl IntoIterator<Item = f64>) -> Engine {
    baseline_engine().with_draw(ScriptedDraw::new(draws))
}

/// A warehouse [`SOURCE`] holding `supplies`, one route of the given
/// condition, and a demand site [`TARGET`] needing `needs`.
pub fn two_node_scenario(supplies: u32, needs: u32, route: RouteStatus) -> Scenario {
    Scenario::new("two-node")
        .with_node(Node::warehouse(SOURCE, supplies))
        .with_node(Node::demand(TARGET, needs))
        .with_route(Edge::new(SOURCE, TARGET, route, RiskLevel::Medium))
}

/// Engine on [`two_node_scenario`] whose draws replay `draws`.
pub fn two_node_engine(
    supplies: u32,
    needs: u32,
    route: RouteStatus,
    draws: impl IntoIterator<Item = f64>,
) -> Engine {
    Engine::new(two_node_scenario(supplies, needs, route), EngineConfig::default())
        .expect("two-node scenario is valid")
        .with_draw(ScriptedDraw::new(draws))
}
