use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    plant::{DisplayTint, ParentState, Plant, PlantCatalog, PlantError},
    season::{FaunaInfo, MigrationMessage, SeasonManager},
    spatial::{Positioned, SpatialGrid},
    terrain::Terrain,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlaceableId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaunaId(pub u64);

#[derive(Debug, Error, PartialEq)]
pub enum WorldError {
    #[error(transparent)]
    Plant(#[from] PlantError),
    #[error("unknown placeable {0:?}")]
    UnknownPlaceable(PlaceableId),
}

/// Object placed in the world that plants may grow from.
#[derive(Debug, Clone, Serialize)]
pub struct Placeable {
    pub x: f64,
    pub y: f64,
    pub alive: bool,
}

/// Animal position and liveness; behaviour lives outside this crate.
#[derive(Debug, Clone, Serialize)]
pub struct Fauna {
    pub species: String,
    pub x: f64,
    pub y: f64,
    pub alive: bool,
}

impl FaunaInfo for Fauna {
    fn species(&self) -> &str {
        &self.species
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEntity {
    Plant(EntityId),
    Fauna(FaunaId),
}

/// Per-tick grid record; positions are copied so the grid holds no borrows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridEntry {
    pub entity: GridEntity,
    pub x: f64,
    pub y: f64,
}

impl Positioned for GridEntry {
    fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantCounts {
    pub growing: usize,
    pub dormant: usize,
    pub regrowing: usize,
    pub withered: usize,
}

#[derive(Debug, Serialize)]
pub struct PlantSnapshot {
    pub id: u64,
    pub kind: String,
    pub biome: String,
    pub x: f64,
    pub y: f64,
    pub alive: bool,
    pub dormant: bool,
    pub growth: f64,
    pub nutrition: f64,
    pub tint: DisplayTint,
}

#[derive(Debug, Serialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub tick: u64,
    pub season: String,
    pub next_season: String,
    pub transition_progress: f64,
    pub hunger_modifier: f64,
    pub counts: PlantCounts,
    pub migration: Vec<MigrationMessage>,
    pub plants: Vec<PlantSnapshot>,
}

pub struct World {
    next_entity: u64,
    tick: u64,
    dt: f64,
    catalog: PlantCatalog,
    terrain: Box<dyn Terrain>,
    pub(crate) seasons: SeasonManager,
    pub(crate) plants: BTreeMap<EntityId, Plant>,
    pub(crate) placeables: BTreeMap<PlaceableId, Placeable>,
    pub(crate) fauna: BTreeMap<FaunaId, Fauna>,
    pub(crate) grid: SpatialGrid<GridEntry>,
}

impl World {
    pub fn new(
        seasons: SeasonManager,
        catalog: PlantCatalog,
        terrain: Box<dyn Terrain>,
        grid: SpatialGrid<GridEntry>,
        dt: f64,
    ) -> Self {
        Self {
            next_entity: 0,
            tick: 0,
            dt,
            catalog,
            terrain,
            seasons,
            plants: BTreeMap::new(),
            placeables: BTreeMap::new(),
            fauna: BTreeMap::new(),
            grid,
        }
    }

    pub fn spawn_plant(
        &mut self,
        kind: &str,
        biome: &str,
        x: f64,
        y: f64,
    ) -> Result<EntityId, WorldError> {
        let plant = Plant::new(kind, biome, x, y, &self.catalog, self.terrain.as_ref())?;
        Ok(self.insert_plant(plant))
    }

    /// Plants `kind` at the placeable's position; it lives only as long as the placeable.
    pub fn spawn_plant_from(
        &mut self,
        placeable: PlaceableId,
        kind: &str,
        biome: &str,
    ) -> Result<EntityId, WorldError> {
        let (x, y) = self
            .placeables
            .get(&placeable)
            .map(|p| (p.x, p.y))
            .ok_or(WorldError::UnknownPlaceable(placeable))?;
        let plant = Plant::new(kind, biome, x, y, &self.catalog, self.terrain.as_ref())?
            .with_spawner(placeable);
        Ok(self.insert_plant(plant))
    }

    pub fn insert_plant(&mut self, plant: Plant) -> EntityId {
        let id = EntityId(self.allocate());
        self.plants.insert(id, plant);
        id
    }

    pub fn add_placeable(&mut self, x: f64, y: f64) -> PlaceableId {
        let id = PlaceableId(self.allocate());
        self.placeables.insert(id, Placeable { x, y, alive: true });
        id
    }

    /// Marks the placeable destroyed. Returns false for unknown ids.
    pub fn destroy_placeable(&mut self, id: PlaceableId) -> bool {
        match self.placeables.get_mut(&id) {
            Some(placeable) => {
                placeable.alive = false;
                true
            }
            None => false,
        }
    }

    pub fn add_fauna(&mut self, species: &str, x: f64, y: f64) -> FaunaId {
        let id = FaunaId(self.allocate());
        self.fauna.insert(
            id,
            Fauna {
                species: species.to_string(),
                x,
                y,
                alive: true,
            },
        );
        id
    }

    pub fn fauna(&self, id: FaunaId) -> Option<&Fauna> {
        self.fauna.get(&id)
    }

    pub fn fauna_mut(&mut self, id: FaunaId) -> Option<&mut Fauna> {
        self.fauna.get_mut(&id)
    }

    pub fn plant(&self, id: EntityId) -> Option<&Plant> {
        self.plants.get(&id)
    }

    pub fn plant_mut(&mut self, id: EntityId) -> Option<&mut Plant> {
        self.plants.get_mut(&id)
    }

    pub fn plant_ids(&self) -> Vec<EntityId> {
        self.plants.keys().copied().collect()
    }

    pub fn parent_state(&self, plant: &Plant) -> ParentState {
        resolve_parent(&self.placeables, plant)
    }

    /// Eats plant `id`, returning the nutrition gained (0 for unknown ids).
    pub fn consume_plant(&mut self, id: EntityId) -> f64 {
        self.plants
            .get_mut(&id)
            .map(Plant::consume)
            .unwrap_or(0.0)
    }

    /// Clears the spatial grid and reinserts every live plant and animal.
    pub fn rebuild_grid(&mut self) {
        self.grid.clear();
        for (id, plant) in &self.plants {
            if plant.is_alive() {
                let (x, y) = plant.position();
                self.grid.insert(GridEntry {
                    entity: GridEntity::Plant(*id),
                    x,
                    y,
                });
            }
        }
        for (id, animal) in &self.fauna {
            if animal.alive {
                self.grid.insert(GridEntry {
                    entity: GridEntity::Fauna(*id),
                    x: animal.x,
                    y: animal.y,
                });
            }
        }
    }

    pub fn grid(&self) -> &SpatialGrid<GridEntry> {
        &self.grid
    }

    /// Plants from the last grid rebuild within `radius` of `(x, y)`.
    pub fn plants_near(&self, x: f64, y: f64, radius: f64) -> Vec<EntityId> {
        self.grid
            .in_radius(x, y, radius)
            .into_iter()
            .filter_map(|entry| match entry.entity {
                GridEntity::Plant(id) => Some(id),
                GridEntity::Fauna(_) => None,
            })
            .collect()
    }

    pub fn fauna_near(&self, x: f64, y: f64, radius: f64) -> Vec<FaunaId> {
        self.grid
            .in_radius(x, y, radius)
            .into_iter()
            .filter_map(|entry| match entry.entity {
                GridEntity::Fauna(id) => Some(id),
                GridEntity::Plant(_) => None,
            })
            .collect()
    }

    pub fn seasons(&self) -> &SeasonManager {
        &self.seasons
    }

    pub fn catalog(&self) -> &PlantCatalog {
        &self.catalog
    }

    pub fn terrain(&self) -> &dyn Terrain {
        self.terrain.as_ref()
    }

    pub fn migration_messages(&self) -> Vec<MigrationMessage> {
        let fauna: Vec<&Fauna> = self.fauna.values().collect();
        self.seasons.migration_messages(&fauna)
    }

    pub fn migration_hint(&self) -> Option<String> {
        let fauna: Vec<&Fauna> = self.fauna.values().collect();
        self.seasons.migration_hint(&fauna)
    }

    pub fn plant_counts(&self) -> PlantCounts {
        let mut counts = PlantCounts::default();
        for plant in self.plants.values() {
            if plant.is_withered() {
                counts.withered += 1;
            } else if plant.is_dormant() {
                counts.dormant += 1;
            } else if plant.is_alive() {
                counts.growing += 1;
            } else {
                counts.regrowing += 1;
            }
        }
        counts
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn advance_time(&mut self) {
        self.tick += 1;
    }

    pub fn snapshot(&self, scenario: &str) -> WorldSnapshot {
        let plants = self
            .plants
            .iter()
            .map(|(id, plant)| {
                let (x, y) = plant.position();
                PlantSnapshot {
                    id: id.raw(),
                    kind: plant.kind().to_string(),
                    biome: plant.biome().to_string(),
                    x,
                    y,
                    alive: plant.is_alive(),
                    dormant: plant.is_dormant(),
                    growth: plant.growth(),
                    nutrition: plant.nutrition(),
                    tint: plant.tint(),
                }
            })
            .collect();
        WorldSnapshot {
            scenario: scenario.to_string(),
            tick: self.tick,
            season: self.seasons.current_key().to_string(),
            next_season: self.seasons.next_key().to_string(),
            transition_progress: self.seasons.transition_progress(),
            hunger_modifier: self.seasons.hunger_modifier(),
            counts: self.plant_counts(),
            migration: self.migration_messages(),
            plants,
        }
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_entity;
        self.next_entity += 1;
        id
    }
}

pub(crate) fn resolve_parent(
    placeables: &BTreeMap<PlaceableId, Placeable>,
    plant: &Plant,
) -> ParentState {
    match plant.spawner() {
        None => ParentState::Unparented,
        Some(id) => match placeables.get(&id) {
            Some(placeable) if placeable.alive => ParentState::Alive,
            _ => ParentState::Destroyed,
        },
    }
}
