//! Plant lifecycle: growth, seasonal dormancy, consumption and regrowth.
//!
//! A plant is updated once per tick from the [`SeasonManager`]. It never reads
//! another plant, so plants can be updated in any order.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{rng::RngExt, season::SeasonManager, terrain::Terrain, world::PlaceableId};

/// Modifier applied to plants growing from a living placeable.
pub const SPAWNED_MODIFIER: f64 = 1.2;
/// Growth gained per tick at modifier 1.0.
pub const GROWTH_RATE: f64 = 0.01;
/// Per-tick chance of stress dormancy while the modifier is very low.
pub const STRESS_DORMANCY_CHANCE: f64 = 0.01;
/// Per-tick chance a dormant plant wakes once conditions allow.
pub const WAKE_CHANCE: f64 = 0.02;

const STRESS_MODIFIER: f64 = 0.25;
const STRESS_MIN_GROWTH: f64 = 0.5;
const WAKE_MIN_MODIFIER: f64 = 0.5;
const MIN_REGROWTH_MODIFIER: f64 = 0.3;
const REGROWTH_GROWTH: f64 = 0.3;
const WAKE_GROWTH: f64 = 0.2;
const DORMANT_SHRINK: f64 = 0.3;
const DORMANT_MIN_GROWTH: f64 = 0.1;
const THRIVING_MODIFIER: f64 = 1.1;

#[derive(Debug, Error, PartialEq)]
pub enum PlantError {
    #[error("unknown plant type '{0}'")]
    UnknownType(String),
}

/// Static per-type baseline values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantType {
    pub nutrition: f64,
    pub color: String,
    pub size: f64,
    pub growth_time: f64,
}

impl PlantType {
    fn new(nutrition: f64, color: &str, size: f64, growth_time: f64) -> Self {
        Self {
            nutrition,
            color: color.to_string(),
            size,
            growth_time,
        }
    }
}

/// Plant type table keyed by type name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlantCatalog {
    types: HashMap<String, PlantType>,
}

impl PlantCatalog {
    pub fn defaults() -> Self {
        let mut catalog = Self::default();
        catalog.insert("tussock", PlantType::new(20.0, "#c2b280", 10.0, 300.0));
        catalog.insert("flax", PlantType::new(30.0, "#4f7942", 14.0, 450.0));
        catalog.insert("fern", PlantType::new(15.0, "#3a5f0b", 8.0, 240.0));
        catalog.insert("shrub", PlantType::new(40.0, "#6b8e23", 16.0, 600.0));
        catalog.insert("herb", PlantType::new(10.0, "#9acd32", 6.0, 180.0));
        catalog
    }

    pub fn insert(&mut self, key: impl Into<String>, plant_type: PlantType) {
        self.types.insert(key.into(), plant_type);
    }

    pub fn get(&self, key: &str) -> Option<&PlantType> {
        self.types.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PlantType)> {
        self.types.iter()
    }
}

/// Status of the placeable a plant grows from, resolved by the caller each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentState {
    Unparented,
    Alive,
    Destroyed,
}

/// Colour category a renderer may derive from plant state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayTint {
    Normal,
    Thriving,
    Wilted,
    Dormant,
}

#[derive(Debug, Clone)]
pub struct Plant {
    kind: String,
    biome: String,
    x: f64,
    y: f64,
    elevation: f64,
    base_nutrition: f64,
    color: String,
    size: f64,
    base_growth_time: f64,
    spawner: Option<PlaceableId>,
    withered: bool,

    alive: bool,
    dormant: bool,
    dormant_timer: f64,
    regrowth_timer: f64,
    growth: f64,
    seasonal_modifier: f64,
    max_nutrition: f64,
    nutrition: f64,
}

impl Plant {
    /// Creates a fully grown plant, sampling `terrain` once for its elevation.
    pub fn new(
        kind: &str,
        biome: &str,
        x: f64,
        y: f64,
        catalog: &PlantCatalog,
        terrain: &dyn Terrain,
    ) -> Result<Self, PlantError> {
        let plant_type = catalog
            .get(kind)
            .ok_or_else(|| PlantError::UnknownType(kind.to_string()))?;
        Ok(Self {
            kind: kind.to_string(),
            biome: biome.to_string(),
            x,
            y,
            elevation: terrain.elevation_at(x, y),
            base_nutrition: plant_type.nutrition,
            color: plant_type.color.clone(),
            size: plant_type.size,
            base_growth_time: plant_type.growth_time,
            spawner: None,
            withered: false,
            alive: true,
            dormant: false,
            dormant_timer: 0.0,
            regrowth_timer: 0.0,
            growth: 1.0,
            seasonal_modifier: 1.0,
            max_nutrition: plant_type.nutrition,
            nutrition: plant_type.nutrition,
        })
    }

    /// Links the plant to the placeable it grows from.
    pub fn with_spawner(mut self, spawner: PlaceableId) -> Self {
        self.spawner = Some(spawner);
        self
    }

    pub fn with_growth(mut self, growth: f64) -> Self {
        self.set_growth(growth);
        self
    }

    /// Overrides growth and rescales nutrition to match. Ignored while dormant or regrowing.
    pub fn set_growth(&mut self, growth: f64) {
        if self.dormant || !self.alive {
            return;
        }
        self.growth = growth.clamp(0.0, 1.0);
        self.nutrition = self.max_nutrition * self.growth;
    }

    /// Advances the plant by one tick.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        seasons: &SeasonManager,
        parent: ParentState,
        rng: &mut R,
    ) {
        if self.withered {
            return;
        }
        match parent {
            ParentState::Destroyed => {
                self.wither();
                return;
            }
            ParentState::Alive => {
                self.seasonal_modifier = SPAWNED_MODIFIER;
                self.grow();
                return;
            }
            ParentState::Unparented => {}
        }

        self.seasonal_modifier = seasons.plant_modifier(&self.biome);
        if !self.dormant {
            self.check_dormancy(seasons, rng);
        }
        if self.dormant {
            self.rest(seasons, rng);
            return;
        }
        self.grow();
    }

    /// Eats the plant. Returns the nutrition gained; dormant, regrowing and
    /// withered plants are left untouched and yield 0.
    pub fn consume(&mut self) -> f64 {
        if self.dormant || !self.alive {
            return 0.0;
        }
        let eaten = self.nutrition;
        self.alive = false;
        self.growth = 0.0;
        self.nutrition = 0.0;
        self.regrowth_timer = 0.0;
        eaten
    }

    fn check_dormancy<R: Rng + ?Sized>(&mut self, seasons: &SeasonManager, rng: &mut R) {
        if !seasons.should_plant_be_dormant(self.elevation, &self.biome) {
            return;
        }
        let seasonal = seasons.just_changed() && rng.chance(seasons.dormancy_chance());
        let stressed = self.seasonal_modifier < STRESS_MODIFIER
            && self.growth > STRESS_MIN_GROWTH
            && rng.chance(STRESS_DORMANCY_CHANCE);
        if seasonal || stressed {
            self.dormant = true;
            self.dormant_timer = 0.0;
            self.growth = (self.growth * DORMANT_SHRINK).max(DORMANT_MIN_GROWTH);
            self.nutrition = 0.0;
            debug!(
                kind = %self.kind,
                biome = %self.biome,
                elevation = self.elevation,
                stressed,
                "plant entered dormancy"
            );
        }
    }

    fn rest<R: Rng + ?Sized>(&mut self, seasons: &SeasonManager, rng: &mut R) {
        self.max_nutrition = self.base_nutrition * self.seasonal_modifier;
        self.nutrition = 0.0;
        self.dormant_timer += 1.0;

        let in_zone = seasons.should_plant_be_dormant(self.elevation, &self.biome);
        if !in_zone && self.seasonal_modifier > WAKE_MIN_MODIFIER && rng.chance(WAKE_CHANCE) {
            self.dormant = false;
            self.growth = WAKE_GROWTH;
            debug!(
                kind = %self.kind,
                dormant_ticks = self.dormant_timer,
                "plant woke from dormancy"
            );
        }
    }

    fn grow(&mut self) {
        let modifier = self.seasonal_modifier;
        self.max_nutrition = self.base_nutrition * modifier;

        if !self.alive {
            self.regrowth_timer += modifier;
            if self.regrowth_timer < self.regrowth_time() {
                self.nutrition = 0.0;
                return;
            }
            self.alive = true;
            self.growth = REGROWTH_GROWTH;
            self.regrowth_timer = 0.0;
            self.nutrition = (self.max_nutrition * self.growth * modifier).min(self.max_nutrition);
            debug!(kind = %self.kind, x = self.x, y = self.y, "plant regrew");
            return;
        }

        let nutrition = if self.growth < 1.0 {
            self.growth = (self.growth + GROWTH_RATE * modifier).min(1.0);
            self.max_nutrition * self.growth * modifier
        } else {
            self.max_nutrition * modifier
        };
        self.nutrition = nutrition.clamp(0.0, self.max_nutrition.max(0.0));
    }

    fn wither(&mut self) {
        self.withered = true;
        self.alive = false;
        self.dormant = false;
        self.growth = 0.0;
        self.nutrition = 0.0;
        self.regrowth_timer = 0.0;
    }

    /// Accumulated regrowth needed before a consumed plant returns.
    pub fn regrowth_time(&self) -> f64 {
        self.base_growth_time / self.seasonal_modifier.max(MIN_REGROWTH_MODIFIER)
    }

    pub fn tint(&self) -> DisplayTint {
        if self.dormant {
            DisplayTint::Dormant
        } else if self.seasonal_modifier >= THRIVING_MODIFIER {
            DisplayTint::Thriving
        } else if self.seasonal_modifier < WAKE_MIN_MODIFIER {
            DisplayTint::Wilted
        } else {
            DisplayTint::Normal
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn biome(&self) -> &str {
        &self.biome
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn spawner(&self) -> Option<PlaceableId> {
        self.spawner
    }

    /// Spawned plant whose placeable was destroyed; it will never regrow.
    pub fn is_withered(&self) -> bool {
        self.withered
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_dormant(&self) -> bool {
        self.dormant
    }

    pub fn dormant_timer(&self) -> f64 {
        self.dormant_timer
    }

    pub fn regrowth_timer(&self) -> f64 {
        self.regrowth_timer
    }

    pub fn growth(&self) -> f64 {
        self.growth
    }

    pub fn seasonal_modifier(&self) -> f64 {
        self.seasonal_modifier
    }

    pub fn max_nutrition(&self) -> f64 {
        self.max_nutrition
    }

    pub fn nutrition(&self) -> f64 {
        self.nutrition
    }
}
