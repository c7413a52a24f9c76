//! Loading scenarios and engine settings from RON, TOML, or JSON files.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, RunData, load_engine_config, load_run_data, load_scenario};
