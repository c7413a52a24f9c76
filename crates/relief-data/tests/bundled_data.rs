//! Loads the scenario directories shipped under `data/` and runs them.

use relief_core::engine::Engine;
use relief_core::model::NodeStatus;
use relief_core::scenario::Scenario;
use relief_data::load_run_data;
use std::path::{Path, PathBuf};

fn data_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

#[test]
fn baseline_directory_matches_builtin_scenario() {
    let data = load_run_data(&data_dir("baseline")).unwrap();
    assert_eq!(data.scenario, Scenario::default());
    assert_eq!(data.config, Default::default());
}

#[test]
fn flood_directory_loads_and_runs() {
    let data = load_run_data(&data_dir("flood")).unwrap();
    assert_eq!(data.scenario.name, "flood");
    assert_eq!(data.config.seed, 42);
    assert_eq!(data.config.damaged_failure_probability, 0.35);
    assert_eq!(data.config.recovering_threshold, 50);

    let mut engine = Engine::new(data.scenario, data.config).unwrap();
    engine.dispatch("Depot_North", "Depot_South", 100);
    engine.dispatch("Depot_South", "Hill_Clinic", 60);
    let clinic = engine.world().find_node("Hill_Clinic").unwrap();
    assert_eq!((clinic.needs, clinic.status), (0, NodeStatus::Stable));
    assert_eq!(engine.world().find_node("Depot_South").unwrap().supplies, 160);
}
