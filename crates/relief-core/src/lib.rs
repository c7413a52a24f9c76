//! Relief Core -- the world-state simulation engine for humanitarian
//! logistics coordination.
//!
//! The crate models a small directed graph of warehouses, demand sites, and
//! routes whose condition changes over time, and implements the operations an
//! operator (or the outside world) applies to it.
//!
//! # Operations
//!
//! - **Dispatch** -- move supplies from one node to another along a single
//!   directed route. Preconditions are validated before anything is written;
//!   the outcome depends on the route's condition and an injectable random
//!   draw.
//! - **Collapse route** -- an infrastructure failure destroys a route and
//!   isolates its target.
//! - **External aid** -- aid arriving from outside the modeled graph reduces a
//!   node's outstanding need.
//! - **Reset** -- replace the world with a fresh copy of the initial
//!   scenario.
//!
//! # Mutation Discipline
//!
//! Every operation validates first and commits second. A rejected operation
//! leaves the [`world::World`] structurally identical to its previous state:
//!
//! ```rust
//! use relief_core::engine::Engine;
//! use relief_core::config::EngineConfig;
//! use relief_core::scenario::Scenario;
//!
//! let mut engine = Engine::new(Scenario::default(), EngineConfig::default()).unwrap();
//! let before = engine.snapshot();
//! let report = engine.dispatch("Warehouse_A", "Village_B", 150);
//! assert!(report.is_rejected());
//! assert_eq!(engine.snapshot(), before);
//! ```
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- owns the world, the randomness source, and the
//!   event log; entry point for all operations.
//! - [`world::World`] -- nodes and routes with integrity-checked mutators.
//! - [`dispatch`] -- precondition checks, outcome resolution, and delivery.
//! - [`rng::UnitDraw`] -- the injectable uniform draw behind stochastic
//!   outcomes.
//! - [`snapshot::WorldSnapshot`] -- owned, serializable copy handed to
//!   renderers and advisors.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod event;
pub mod fixed;
pub mod id;
pub mod injector;
pub mod model;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod validation;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
