use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    rng::{RngManager, SystemRng},
    snapshot::SnapshotWriter,
    world::{PlantCounts, World},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            settings: self.settings,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        self.run_with_hook(world, ticks, |_| {})
    }

    /// Runs `ticks` ticks, handing `hook` a report after each one.
    pub fn run_with_hook<F>(&mut self, world: &mut World, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&TickReport),
    {
        info!(
            scenario = %self.settings.scenario_name,
            ticks,
            start_tick = world.tick(),
            "simulation run started"
        );
        for _ in 0..ticks {
            let report = self.step(world)?;
            hook(&report);
        }
        info!(
            scenario = %self.settings.scenario_name,
            tick = world.tick(),
            season = world.seasons().current_key(),
            "simulation run finished"
        );
        Ok(())
    }

    /// One tick: every system in registration order, then the clock, then the
    /// optional snapshot.
    fn step(&mut self, world: &mut World) -> Result<TickReport> {
        let ctx = SystemContext {
            tick: world.tick(),
            dt: world.dt(),
        };
        for system in &mut self.systems {
            let name = system.name().to_string();
            let mut rng = self.rng.stream(&name);
            system
                .run(&ctx, world, &mut rng)
                .with_context(|| format!("system '{name}' failed at tick {}", ctx.tick))?;
        }
        world.advance_time();
        self.snapshot_writer
            .maybe_write(world, &self.settings.scenario_name)?;
        Ok(TickReport::capture(world))
    }
}

/// Summary handed to run hooks after every tick.
#[derive(Clone, Debug)]
pub struct TickReport {
    pub tick: u64,
    pub season: String,
    pub season_changed: bool,
    pub transition_progress: f64,
    pub counts: PlantCounts,
}

impl TickReport {
    fn capture(world: &World) -> Self {
        let seasons = world.seasons();
        Self {
            tick: world.tick(),
            season: seasons.current_key().to_string(),
            season_changed: seasons.just_changed(),
            transition_progress: seasons.transition_progress(),
            counts: world.plant_counts(),
        }
    }
}

/// Read-only facts about the tick a system is running in.
pub struct SystemContext {
    pub tick: u64,
    pub dt: f64,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
