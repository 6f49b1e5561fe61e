use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    plant::{PlantCatalog, PlantType},
    season::{Season, SeasonError, SeasonManager, SEASON_COUNT},
    spatial::{SpatialError, SpatialGrid},
    terrain::{ElevationMap, FlatTerrain, Terrain, TerrainError},
    world::{World, WorldError},
};

fn default_season_duration() -> f64 {
    600.0
}

fn default_dt() -> f64 {
    1.0
}

fn default_snapshot_interval_ticks() -> u64 {
    0
}

fn default_cell_size() -> f64 {
    64.0
}

fn default_elevation() -> f64 {
    0.5
}

fn default_growth() -> f64 {
    1.0
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Season(#[from] SeasonError),
    #[error(transparent)]
    Spatial(#[from] SpatialError),
    #[error(transparent)]
    Terrain(#[from] TerrainError),
    #[error(transparent)]
    World(#[from] WorldError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_season_duration")]
    pub season_duration: f64,
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
    #[serde(default)]
    pub start_season: Option<String>,
    pub world: WorldBounds,
    #[serde(default)]
    pub terrain: TerrainConfig,
    #[serde(default)]
    pub seasons: Option<Vec<Season>>,
    #[serde(default)]
    pub plant_types: Option<PlantCatalog>,
    #[serde(default)]
    pub placeables: Vec<ScenarioPlaceable>,
    #[serde(default)]
    pub plants: Vec<ScenarioPlant>,
    #[serde(default)]
    pub scatter: Vec<PlantScatter>,
    #[serde(default)]
    pub fauna: Vec<ScenarioFauna>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldBounds {
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerrainConfig {
    Flat {
        #[serde(default = "default_elevation")]
        elevation: f64,
    },
    Sampled {
        spacing: f64,
        rows: Vec<Vec<f64>>,
    },
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig::Flat {
            elevation: default_elevation(),
        }
    }
}

impl TerrainConfig {
    pub fn build(&self) -> Result<Box<dyn Terrain>, TerrainError> {
        Ok(match self {
            TerrainConfig::Flat { elevation } => Box::new(FlatTerrain(*elevation)),
            TerrainConfig::Sampled { spacing, rows } => {
                Box::new(ElevationMap::from_rows(rows, *spacing)?)
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioPlaceable {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioPlant {
    pub kind: String,
    pub biome: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_growth")]
    pub growth: f64,
    /// Index into `placeables`; the plant grows at that placeable's position.
    #[serde(default)]
    pub placeable: Option<usize>,
}

/// `count` plants of one kind scattered uniformly over a rectangle.
#[derive(Debug, Clone, Deserialize)]
pub struct PlantScatter {
    pub kind: String,
    pub biome: String,
    pub count: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioFauna {
    pub species: String,
    pub x: f64,
    pub y: f64,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario = Scenario::from_yaml(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn catalog(&self) -> PlantCatalog {
        let mut catalog = PlantCatalog::defaults();
        if let Some(types) = &self.plant_types {
            for (key, plant_type) in types.iter() {
                catalog.insert(key.clone(), plant_type.clone());
            }
        }
        catalog
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.season_duration.is_finite() && self.season_duration > 0.0) {
            return Err(invalid(format!(
                "season_duration must be positive, got {}",
                self.season_duration
            )));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(invalid(format!("dt must be positive, got {}", self.dt)));
        }
        if !(self.world.cell_size.is_finite() && self.world.cell_size > 0.0) {
            return Err(invalid(format!(
                "cell_size must be positive, got {}",
                self.world.cell_size
            )));
        }

        if let Some(seasons) = &self.seasons {
            if seasons.len() != SEASON_COUNT {
                return Err(SeasonError::SeasonCount(seasons.len()).into());
            }
            for season in seasons {
                if !(0.0..=1.0).contains(&season.dormancy_chance) {
                    return Err(invalid(format!(
                        "season '{}' dormancy_chance must be within [0, 1]",
                        season.key
                    )));
                }
            }
        }

        let catalog = self.catalog();
        for (key, plant_type) in catalog.iter() {
            validate_plant_type(key, plant_type)?;
        }
        let kinds = self
            .plants
            .iter()
            .map(|plant| plant.kind.as_str())
            .chain(self.scatter.iter().map(|scatter| scatter.kind.as_str()));
        for kind in kinds {
            if !catalog.contains(kind) {
                return Err(invalid(format!("unknown plant type '{kind}'")));
            }
        }
        for plant in &self.plants {
            if let Some(index) = plant.placeable {
                if index >= self.placeables.len() {
                    return Err(invalid(format!(
                        "plant references unknown placeable {index}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn season_manager(&self) -> Result<SeasonManager, ScenarioError> {
        let seasons = self.seasons.clone().unwrap_or_else(Season::defaults);
        let mut manager = SeasonManager::with_seasons(self.season_duration, seasons)?;
        if let Some(key) = &self.start_season {
            manager = manager.starting_at(key)?;
        }
        Ok(manager)
    }

    pub fn build_world(&self) -> Result<World, ScenarioError> {
        let grid = SpatialGrid::new(self.world.width, self.world.height, self.world.cell_size)?;
        let mut world = World::new(
            self.season_manager()?,
            self.catalog(),
            self.terrain.build()?,
            grid,
            self.dt,
        );

        let placeables: Vec<_> = self
            .placeables
            .iter()
            .map(|p| world.add_placeable(p.x, p.y))
            .collect();

        for plant in &self.plants {
            let id = match plant.placeable {
                Some(index) => {
                    let placeable = placeables.get(index).copied().ok_or_else(|| {
                        invalid(format!("plant references unknown placeable {index}"))
                    })?;
                    world.spawn_plant_from(placeable, &plant.kind, &plant.biome)?
                }
                None => world.spawn_plant(&plant.kind, &plant.biome, plant.x, plant.y)?,
            };
            if let Some(spawned) = world.plant_mut(id) {
                spawned.set_growth(plant.growth);
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        for scatter in &self.scatter {
            for _ in 0..scatter.count {
                let x = scatter.x + rng.gen::<f64>() * scatter.width;
                let y = scatter.y + rng.gen::<f64>() * scatter.height;
                world.spawn_plant(&scatter.kind, &scatter.biome, x, y)?;
            }
        }

        for animal in &self.fauna {
            world.add_fauna(&animal.species, animal.x, animal.y);
        }
        world.rebuild_grid();
        Ok(world)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks
            .or(self.ticks)
            .unwrap_or((self.season_duration / self.dt * SEASON_COUNT as f64).ceil() as u64)
    }
}

fn validate_plant_type(key: &str, plant_type: &PlantType) -> Result<(), ScenarioError> {
    if plant_type.nutrition < 0.0 {
        return Err(invalid(format!("plant type '{key}' has negative nutrition")));
    }
    if !(plant_type.growth_time.is_finite() && plant_type.growth_time > 0.0) {
        return Err(invalid(format!(
            "plant type '{key}' growth_time must be positive"
        )));
    }
    Ok(())
}

fn invalid(message: String) -> ScenarioError {
    ScenarioError::Validation(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name: unit
seed: 11
season_duration: 20
world:
  width: 100
  height: 100
  cell_size: 10
"#;

    #[test]
    fn test_defaults_applied() {
        let scenario = Scenario::from_yaml(MINIMAL).unwrap();
        scenario.validate().unwrap();
        assert_eq!(scenario.dt, 1.0);
        assert_eq!(scenario.snapshot_interval_ticks, 0);
        assert_eq!(scenario.ticks(None), 80);
        assert_eq!(scenario.ticks(Some(3)), 3);
        let world = scenario.build_world().unwrap();
        assert_eq!(world.seasons().current_key(), "summer");
        assert_eq!(world.terrain().elevation_at(1.0, 1.0), 0.5);
    }

    #[test]
    fn test_rejects_unknown_plant_type() {
        let text = format!("{MINIMAL}plants:\n  - kind: kauri\n    biome: podocarp\n");
        let scenario = Scenario::from_yaml(&text).unwrap();
        let err = scenario.validate().unwrap_err();
        assert!(err.to_string().contains("kauri"));
    }

    #[test]
    fn test_rejects_bad_duration_and_season_tables() {
        let text = MINIMAL.replace("season_duration: 20", "season_duration: 0");
        assert!(Scenario::from_yaml(&text).unwrap().validate().is_err());

        let mut scenario = Scenario::from_yaml(MINIMAL).unwrap();
        let mut seasons = Season::defaults();
        seasons.truncate(2);
        scenario.seasons = Some(seasons);
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::Season(SeasonError::SeasonCount(2)))
        ));

        let mut scenario = Scenario::from_yaml(MINIMAL).unwrap();
        let mut seasons = Season::defaults();
        seasons[1].dormancy_chance = 1.5;
        scenario.seasons = Some(seasons);
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_custom_plant_types_and_placeables() {
        let text = format!(
            "{MINIMAL}plant_types:\n  kowhai:\n    nutrition: 12\n    color: \"#f5c400\"\n    size: 9\n    growth_time: 200\nplaceables:\n  - x: 40\n    y: 60\nplants:\n  - kind: kowhai\n    biome: podocarp\n    placeable: 0\n    growth: 0.5\n"
        );
        let scenario = Scenario::from_yaml(&text).unwrap();
        scenario.validate().unwrap();
        let world = scenario.build_world().unwrap();
        let id = world.plant_ids()[0];
        let plant = world.plant(id).unwrap();
        assert_eq!(plant.kind(), "kowhai");
        assert_eq!(plant.position(), (40.0, 60.0));
        assert!(plant.spawner().is_some());
        assert_eq!(plant.growth(), 0.5);
        assert!(world.catalog().contains("tussock"));
    }

    #[test]
    fn test_scatter_is_seeded() {
        let text = format!(
            "{MINIMAL}scatter:\n  - kind: fern\n    biome: podocarp\n    count: 5\n    x: 0\n    y: 0\n    width: 50\n    height: 50\n"
        );
        let scenario = Scenario::from_yaml(&text).unwrap();
        let a = scenario.build_world().unwrap();
        let b = scenario.build_world().unwrap();
        let positions = |world: &World| -> Vec<(f64, f64)> {
            world
                .plant_ids()
                .into_iter()
                .map(|id| world.plant(id).unwrap().position())
                .collect()
        };
        assert_eq!(positions(&a).len(), 5);
        assert_eq!(positions(&a), positions(&b));
        assert!(positions(&a)
            .iter()
            .all(|&(x, y)| (0.0..50.0).contains(&x) && (0.0..50.0).contains(&y)));
    }

    #[test]
    fn test_build_rejects_degenerate_cell_size() {
        let text = MINIMAL.replace("cell_size: 10", "cell_size: 0");
        let scenario = Scenario::from_yaml(&text).unwrap();
        assert!(matches!(
            scenario.build_world(),
            Err(ScenarioError::Spatial(SpatialError::InvalidCellSize(_)))
        ));
    }

    #[test]
    fn test_sampled_terrain() {
        let text = format!(
            "{MINIMAL}terrain:\n  kind: sampled\n  spacing: 100\n  rows:\n    - [0.0, 1.0]\n    - [0.0, 1.0]\n"
        );
        let scenario = Scenario::from_yaml(&text).unwrap();
        let world = scenario.build_world().unwrap();
        assert!((world.terrain().elevation_at(50.0, 0.0) - 0.5).abs() < 1e-12);
    }
}
