mod messages;
mod script;

use anyhow::Context;
use clap::{Parser, Subcommand};
use relief_core::config::EngineConfig;
use relief_core::engine::Engine;
use relief_core::scenario::Scenario;
use relief_data::{load_engine_config, load_run_data, load_scenario};
use script::Command;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relief", about = "Headless driver for the relief logistics simulation")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding scenario.{ron,toml,json} and an optional engine file
    #[arg(long, conflicts_with_all = ["scenario", "config"])]
    data: Option<PathBuf>,

    /// Scenario file (defaults to the built-in baseline)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Engine settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the RNG seed
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the initial world
    Show {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Replay an operation script
    Run {
        /// Script file, one command per line
        script: PathBuf,
        /// Print the event log after the run
        #[arg(long)]
        events: bool,
    },
    /// Dispatch supplies along one route
    Dispatch {
        source: String,
        target: String,
        amount: u32,
    },
    /// Destroy a route and isolate its target
    Collapse { source: String, target: String },
    /// Deliver aid from outside the graph
    Aid { target: String, amount: u32 },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut engine = build_engine(&cli)?;

    match cli.command {
        Commands::Show { json } => {
            let output = if json {
                apply(&mut engine, &Command::Snapshot)?
            } else {
                apply(&mut engine, &Command::Status)?
            };
            print!("{output}");
        }
        Commands::Run {
            script: path,
            events,
        } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading script {}", path.display()))?;
            let commands = script::parse_script(&text)
                .with_context(|| format!("parsing script {}", path.display()))?;
            for command in &commands {
                print!("{}", apply(&mut engine, command)?);
            }
            info!(
                commands = commands.len(),
                operations = engine.operation_count(),
                state_hash = engine.state_hash(),
                "script finished"
            );
            if events {
                for event in engine.events() {
                    println!("{}", serde_json::to_string(event)?);
                }
            }
        }
        Commands::Dispatch {
            source,
            target,
            amount,
        } => print!(
            "{}",
            apply(&mut engine, &Command::Dispatch { source, target, amount })?
        ),
        Commands::Collapse { source, target } => print!(
            "{}",
            apply(&mut engine, &Command::Collapse { source, target })?
        ),
        Commands::Aid { target, amount } => {
            print!("{}", apply(&mut engine, &Command::Aid { target, amount })?)
        }
    }

    Ok(())
}

/// Load the scenario and settings the flags point at and build an engine.
fn build_engine(cli: &Cli) -> anyhow::Result<Engine> {
    let (scenario, mut config) = match &cli.data {
        Some(dir) => {
            let data = load_run_data(dir)
                .with_context(|| format!("loading data directory {}", dir.display()))?;
            (data.scenario, data.config)
        }
        None => {
            let scenario = match &cli.scenario {
                Some(path) => load_scenario(path)
                    .with_context(|| format!("loading scenario {}", path.display()))?,
                None => Scenario::default(),
            };
            let config = match &cli.config {
                Some(path) => load_engine_config(path)
                    .with_context(|| format!("loading engine settings {}", path.display()))?,
                None => EngineConfig::default(),
            };
            (scenario, config)
        }
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    Engine::new(scenario, config).context("building engine")
}

/// Run one command and return the text to print.
fn apply(engine: &mut Engine, command: &Command) -> anyhow::Result<String> {
    let line = match command {
        Command::Dispatch {
            source,
            target,
            amount,
        } => messages::dispatch_message(&engine.dispatch(source, target, *amount)),
        Command::Collapse { source, target } => {
            messages::collapse_message(&engine.collapse_route(source, target))
        }
        Command::Aid { target, amount } => {
            messages::aid_message(&engine.deliver_external_aid(target, *amount))
        }
        Command::Reset => {
            engine.reset();
            "World reset to the initial scenario.".to_string()
        }
        Command::Status => {
            return Ok(messages::status_table(
                &engine.snapshot(),
                &engine.initial_snapshot(),
            ));
        }
        Command::Snapshot => engine.snapshot().to_json_pretty()?,
    };
    Ok(format!("{line}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use relief_core::snapshot::WorldSnapshot;

    fn engine() -> Engine {
        Engine::new(Scenario::default(), EngineConfig::default()).unwrap()
    }

    #[test]
    fn cli_parses_run() {
        let cli = Cli::try_parse_from(["relief", "-v", "--seed", "9", "run", "ops.txt", "--events"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.seed, Some(9));
        assert!(matches!(cli.command, Commands::Run { events: true, .. }));
    }

    #[test]
    fn cli_rejects_data_with_scenario() {
        let result = Cli::try_parse_from([
            "relief",
            "--data",
            "dir",
            "--scenario",
            "s.ron",
            "show",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn seed_flag_overrides_config() {
        let cli = Cli::try_parse_from(["relief", "--seed", "123", "show"]).unwrap();
        let engine = build_engine(&cli).unwrap();
        assert_eq!(engine.config().seed, 123);
        assert_eq!(engine.scenario(), &Scenario::default());
    }

    #[test]
    fn scripted_session() {
        let mut engine = engine();
        let commands = script::parse_script(
            "dispatch Warehouse_A Village_B 150\n\
             dispatch Warehouse_A Village_B 30\n\
             aid Camp_C 50\n\
             collapse Camp_C Zone_D\n",
        )
        .unwrap();
        let output: Vec<String> = commands
            .iter()
            .map(|c| apply(&mut engine, c).unwrap())
            .collect();
        assert_eq!(output[0], "Rejected: not enough supplies at the source.\n");
        assert_eq!(
            output[1],
            "Success: 30 units moved from Warehouse_A to Village_B.\n"
        );
        assert!(output[2].contains("remaining need 100"));
        assert!(output[3].starts_with("Rejected: no direct route"));

        let status = apply(&mut engine, &Command::Status).unwrap();
        // 30 delivered plus 50 aid against 430 starting need.
        assert!(status.contains("COVERAGE 18.6%"), "{status}");
    }

    #[test]
    fn bundled_script_ends_at_initial_state() {
        let mut engine = engine();
        let initial = engine.snapshot();
        let commands = script::parse_script(include_str!("../scripts/baseline.txt")).unwrap();
        for command in &commands {
            apply(&mut engine, command).unwrap();
        }
        assert_eq!(engine.snapshot(), initial);
        assert_eq!(engine.operation_count(), 9);
    }

    #[test]
    fn snapshot_command_prints_json() {
        let mut engine = engine();
        let json = apply(&mut engine, &Command::Snapshot).unwrap();
        assert_eq!(WorldSnapshot::from_json(&json).unwrap(), engine.snapshot());
    }
}
