//! Scenario and settings loading.
//!
//! Files are decoded by extension (`.ron`, `.toml`, `.json`), then scenario
//! files go through name resolution before they become core
//! [`Scenario`] values.

use crate::schema::ScenarioData;
use relief_core::config::EngineConfig;
use relief_core::model::{Edge, Node};
use relief_core::scenario::{Scenario, ScenarioError};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Base name of the scenario file in a data directory.
pub const SCENARIO_FILE: &str = "scenario";
/// Base name of the optional engine settings file in a data directory.
pub const ENGINE_FILE: &str = "engine";

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("no {base}.ron, {base}.toml or {base}.json in {dir}")]
    MissingFile { base: &'static str, dir: PathBuf },

    #[error("{path}: expected a .ron, .toml or .json file")]
    UnknownExtension { path: PathBuf },

    /// The same base name exists in more than one format.
    #[error("both {first} and {second} exist; keep only one")]
    AmbiguousFile { first: PathBuf, second: PathBuf },

    #[error("{path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A route names a node the file never declares.
    #[error("{path}: route refers to undeclared node '{name}'")]
    UnknownNode { path: PathBuf, name: String },

    #[error("{path}: node '{name}' is declared twice")]
    DuplicateNode { path: PathBuf, name: String },

    #[error("{path}: route {from} -> {to} is declared twice")]
    DuplicateRoute {
        path: PathBuf,
        from: String,
        to: String,
    },

    #[error("{path}: {message}")]
    InvalidSetting { path: PathBuf, message: String },

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Formats
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    /// Pick the format from a file's extension.
    pub fn of(path: &Path) -> Result<Self, DataLoadError> {
        let ext = path.extension().and_then(|e| e.to_str());
        Self::ALL
            .into_iter()
            .find(|f| Some(f.extension()) == ext)
            .ok_or_else(|| DataLoadError::UnknownExtension {
                path: path.to_path_buf(),
            })
    }

    fn decode<T: DeserializeOwned>(self, text: &str) -> Result<T, String> {
        match self {
            Format::Ron => ron::from_str(text).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(text).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

/// Locate `{base}.{ron,toml,json}` in `dir`. `Ok(None)` when absent.
pub fn locate(dir: &Path, base: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut hits = Format::ALL
        .into_iter()
        .map(|f| dir.join(format!("{base}.{}", f.extension())))
        .filter(|p| p.is_file());
    match (hits.next(), hits.next()) {
        (Some(first), Some(second)) => Err(DataLoadError::AmbiguousFile { first, second }),
        (first, _) => Ok(first),
    }
}

/// Like [`locate`], but the file must exist.
pub fn locate_required(dir: &Path, base: &'static str) -> Result<PathBuf, DataLoadError> {
    locate(dir, base)?.ok_or_else(|| DataLoadError::MissingFile {
        base,
        dir: dir.to_path_buf(),
    })
}

/// Read and decode a file in the format its extension names.
pub fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = Format::of(path)?;
    let text = std::fs::read_to_string(path)?;
    format.decode(&text).map_err(|message| DataLoadError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

// ===========================================================================
// Resolution
// ===========================================================================

/// Turn a parsed scenario file into a core scenario.
///
/// Node names must be unique, routes may only join declared nodes, and each
/// ordered pair carries at most one route. The result is built once so any
/// remaining structural problem surfaces here rather than at engine start.
pub fn resolve_scenario(data: ScenarioData, path: &Path) -> Result<Scenario, DataLoadError> {
    let name = data.name.clone().unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(SCENARIO_FILE)
            .to_string()
    });
    let mut scenario = Scenario::new(name);

    let mut declared = HashSet::new();
    for node in &data.nodes {
        if !declared.insert(node.name.as_str()) {
            return Err(DataLoadError::DuplicateNode {
                path: path.to_path_buf(),
                name: node.name.clone(),
            });
        }
        scenario.nodes.push(Node {
            id: node.name.as_str().into(),
            kind: node.kind,
            supplies: node.supplies,
            needs: node.needs,
            status: node.initial_status(),
        });
    }

    let mut joined = HashSet::new();
    for route in &data.routes {
        if let Some(missing) = [&route.from, &route.to]
            .into_iter()
            .find(|end| !declared.contains(end.as_str()))
        {
            return Err(DataLoadError::UnknownNode {
                path: path.to_path_buf(),
                name: missing.clone(),
            });
        }
        if !joined.insert((route.from.as_str(), route.to.as_str())) {
            return Err(DataLoadError::DuplicateRoute {
                path: path.to_path_buf(),
                from: route.from.clone(),
                to: route.to.clone(),
            });
        }
        scenario.routes.push(Edge::new(
            route.from.as_str(),
            route.to.as_str(),
            route.status,
            route.risk,
        ));
    }

    scenario.build()?;
    Ok(scenario)
}

// ===========================================================================
// Loading
// ===========================================================================

/// Load and resolve a scenario file.
pub fn load_scenario(path: &Path) -> Result<Scenario, DataLoadError> {
    let data: ScenarioData = read_file(path)?;
    let scenario = resolve_scenario(data, path)?;
    info!(
        file = %path.display(),
        scenario = %scenario.name,
        nodes = scenario.nodes.len(),
        routes = scenario.routes.len(),
        "scenario loaded"
    );
    Ok(scenario)
}

/// Load engine settings. Missing fields take their defaults.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig, DataLoadError> {
    let config: EngineConfig = read_file(path)?;
    config.validate().map_err(|err| DataLoadError::InvalidSetting {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    debug!(file = %path.display(), ?config, "engine settings loaded");
    Ok(config)
}

/// Everything needed to start an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RunData {
    pub scenario: Scenario,
    pub config: EngineConfig,
}

/// Load a data directory: a required `scenario` file and an optional
/// `engine` file, each in any supported format.
pub fn load_run_data(dir: &Path) -> Result<RunData, DataLoadError> {
    let scenario = load_scenario(&locate_required(dir, SCENARIO_FILE)?)?;
    let config = match locate(dir, ENGINE_FILE)? {
        Some(path) => load_engine_config(&path)?,
        None => EngineConfig::default(),
    };
    Ok(RunData { scenario, config })
}
