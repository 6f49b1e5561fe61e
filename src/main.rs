use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tussock::{
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
    systems::{PlantSystem, SeasonSystem, SpatialIndexSystem},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Seasonal plant lifecycle simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/high_country.yaml")]
    scenario: PathBuf,

    /// Override tick count (defaults to one full season cycle)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override snapshot interval in ticks
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;
    let mut world = scenario.build_world()?;
    let ticks = scenario.ticks(cli.ticks);
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_ticks);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: cli.seed.unwrap_or(scenario.seed),
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
    };

    let mut engine = EngineBuilder::new(settings)
        .with_system(SeasonSystem::new())
        .with_system(PlantSystem::new())
        .with_system(SpatialIndexSystem::new())
        .build();

    engine.run(&mut world, ticks)?;
    let counts = world.plant_counts();
    println!(
        "Scenario '{}' completed for {} ticks in {}. Plants: {} growing, {} dormant, {} regrowing, {} withered",
        scenario.name,
        ticks,
        world.seasons().current().name,
        counts.growing,
        counts.dormant,
        counts.regrowing,
        counts.withered
    );
    Ok(())
}
