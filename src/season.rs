//! Seasonal cycle and the per-biome environmental modifiers it drives.
//!
//! The manager walks a fixed cyclic order of four [`Season`] records. During the
//! final stretch of each season the exposed values are blended linearly towards
//! the upcoming season so plants and fauna never see a hard step at rollover.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Fraction of a season after which blending towards the next season begins.
pub const TRANSITION_START: f64 = 0.85;

/// Number of seasons in one cycle.
pub const SEASON_COUNT: usize = 4;

/// Modifier used for biomes a season does not list.
pub const NEUTRAL_MODIFIER: f64 = 1.0;

#[derive(Debug, Error, PartialEq)]
pub enum SeasonError {
    #[error("season duration must be positive, got {0}")]
    InvalidDuration(f64),
    #[error("expected exactly four seasons, got {0}")]
    SeasonCount(usize),
    #[error("unknown season '{0}'")]
    UnknownSeason(String),
}

/// Normalised elevation band (0 = sea level, 1 = peaks).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationRange {
    pub min: f64,
    pub max: f64,
}

impl ElevationRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn lerp(self, other: ElevationRange, t: f64) -> Self {
        Self {
            min: lerp(self.min, other.min, t),
            max: lerp(self.max, other.max, t),
        }
    }

    pub fn contains(&self, elevation: f64) -> bool {
        elevation >= self.min && elevation <= self.max
    }
}

/// Side of the dormancy threshold on which plants shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DormancyZone {
    Above,
    Below,
}

fn default_dormancy_zone() -> DormancyZone {
    DormancyZone::Above
}

/// Static description of one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub plant_modifiers: HashMap<String, f64>,
    pub preferred_elevation: ElevationRange,
    pub migration_strength: f64,
    pub hunger: f64,
    #[serde(default)]
    pub dormancy_elevation: Option<f64>,
    #[serde(default)]
    pub dormancy_chance: f64,
    #[serde(default = "default_dormancy_zone")]
    pub dormancy_zone: DormancyZone,
}

impl Season {
    /// Growth modifier for `biome`, neutral when the biome is not listed.
    pub fn plant_modifier(&self, biome: &str) -> f64 {
        self.plant_modifiers
            .get(biome)
            .copied()
            .unwrap_or(NEUTRAL_MODIFIER)
    }

    /// The built-in cycle: summer, autumn, winter, spring.
    pub fn defaults() -> Vec<Season> {
        vec![
            season(
                "summer",
                "Summer",
                &[
                    ("coastal", 0.9),
                    ("grassland", 0.3),
                    ("podocarp", 1.0),
                    ("montane", 1.2),
                    ("subalpine", 1.3),
                ],
                ElevationRange::new(0.5, 0.9),
                0.6,
                1.0,
                Some((0.15, 0.2, DormancyZone::Below)),
            ),
            season(
                "autumn",
                "Autumn",
                &[
                    ("coastal", 1.0),
                    ("grassland", 1.0),
                    ("podocarp", 1.1),
                    ("montane", 0.7),
                    ("subalpine", 0.5),
                ],
                ElevationRange::new(0.3, 0.7),
                0.4,
                1.1,
                Some((0.8, 0.3, DormancyZone::Above)),
            ),
            season(
                "winter",
                "Winter",
                &[
                    ("coastal", 0.8),
                    ("grassland", 0.6),
                    ("podocarp", 0.5),
                    ("montane", 0.2),
                    ("subalpine", 0.1),
                ],
                ElevationRange::new(0.0, 0.4),
                0.8,
                1.4,
                Some((0.6, 0.7, DormancyZone::Above)),
            ),
            season(
                "spring",
                "Spring",
                &[
                    ("coastal", 1.1),
                    ("grassland", 1.2),
                    ("podocarp", 1.1),
                    ("montane", 0.8),
                    ("subalpine", 0.6),
                ],
                ElevationRange::new(0.2, 0.6),
                0.5,
                0.9,
                None,
            ),
        ]
    }
}

fn season(
    key: &str,
    name: &str,
    modifiers: &[(&str, f64)],
    preferred_elevation: ElevationRange,
    migration_strength: f64,
    hunger: f64,
    dormancy: Option<(f64, f64, DormancyZone)>,
) -> Season {
    let (dormancy_elevation, dormancy_chance, dormancy_zone) = match dormancy {
        Some((elevation, chance, zone)) => (Some(elevation), chance, zone),
        None => (None, 0.0, DormancyZone::Above),
    };
    Season {
        key: key.to_string(),
        name: name.to_string(),
        plant_modifiers: modifiers
            .iter()
            .map(|(biome, value)| (biome.to_string(), *value))
            .collect(),
        preferred_elevation,
        migration_strength,
        hunger,
        dormancy_elevation,
        dormancy_chance,
        dormancy_zone,
    }
}

/// Read-only view of a fauna entity for migration guidance.
pub trait FaunaInfo {
    fn species(&self) -> &str;
    fn is_alive(&self) -> bool;
}

impl<T: FaunaInfo + ?Sized> FaunaInfo for &T {
    fn species(&self) -> &str {
        (**self).species()
    }

    fn is_alive(&self) -> bool {
        (**self).is_alive()
    }
}

#[derive(Debug, Clone, Copy)]
struct SeasonGuidance {
    season: &'static str,
    current: &'static str,
    upcoming: &'static str,
    hint: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct MigrationPattern {
    species: &'static str,
    guidance: &'static [SeasonGuidance],
}

const MIGRATION_PATTERNS: &[MigrationPattern] = &[
    MigrationPattern {
        species: "moa",
        guidance: &[
            SeasonGuidance {
                season: "summer",
                current: "Moa browse the cool uplands while lowland grass dries out.",
                upcoming: "Autumn will draw the moa down towards the forest margins.",
                hint: "Stay high",
            },
            SeasonGuidance {
                season: "autumn",
                current: "Moa work through the podocarp forest for fallen fruit.",
                upcoming: "Winter snow will push the moa into the lowlands.",
                hint: "Head downhill",
            },
            SeasonGuidance {
                season: "winter",
                current: "Moa shelter in the lowlands and coastal scrub.",
                upcoming: "Spring growth will pull the moa back up the valleys.",
                hint: "Stay low",
            },
            SeasonGuidance {
                season: "spring",
                current: "Moa follow fresh growth up the river valleys.",
                upcoming: "Summer heat will send the moa to the high country.",
                hint: "Head uphill",
            },
        ],
    },
    MigrationPattern {
        species: "takahe",
        guidance: &[
            SeasonGuidance {
                season: "summer",
                current: "Takahe graze snow tussock in the alpine basins.",
                upcoming: "Autumn frosts will move the takahe to the bush edge.",
                hint: "Alpine tussock",
            },
            SeasonGuidance {
                season: "autumn",
                current: "Takahe gather at the bush line as the tussock hardens.",
                upcoming: "Winter will drive the takahe under the forest canopy.",
                hint: "Bush line",
            },
            SeasonGuidance {
                season: "winter",
                current: "Takahe dig fern rhizomes under the forest canopy.",
                upcoming: "Spring thaw will reopen the tussock basins.",
                hint: "Forest floor",
            },
            SeasonGuidance {
                season: "spring",
                current: "Takahe return to the basins for new tussock shoots.",
                upcoming: "Summer will see the takahe settled in the high basins.",
                hint: "Climb to the basins",
            },
        ],
    },
];

/// Seasonal guidance for one species.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationMessage {
    pub species: String,
    pub current: &'static str,
    pub upcoming: &'static str,
    pub hint: &'static str,
}

/// Cyclic season state machine with smoothed transitions.
#[derive(Debug, Clone)]
pub struct SeasonManager {
    seasons: Vec<Season>,
    index: usize,
    timer: f64,
    duration: f64,
    transition_progress: f64,
    just_changed: bool,
}

impl SeasonManager {
    /// Manager over the built-in season table, starting in summer.
    pub fn new(duration: f64) -> Result<Self, SeasonError> {
        Self::with_seasons(duration, Season::defaults())
    }

    pub fn with_seasons(duration: f64, seasons: Vec<Season>) -> Result<Self, SeasonError> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(SeasonError::InvalidDuration(duration));
        }
        if seasons.len() != SEASON_COUNT {
            return Err(SeasonError::SeasonCount(seasons.len()));
        }
        Ok(Self {
            seasons,
            index: 0,
            timer: 0.0,
            duration,
            transition_progress: 0.0,
            just_changed: false,
        })
    }

    /// Moves the cycle to start at the season keyed `key`.
    pub fn starting_at(mut self, key: &str) -> Result<Self, SeasonError> {
        self.index = self
            .seasons
            .iter()
            .position(|season| season.key == key)
            .ok_or_else(|| SeasonError::UnknownSeason(key.to_string()))?;
        Ok(self)
    }

    /// Advances the season timer by `dt` and returns true when the season rolled over.
    pub fn update(&mut self, dt: f64) -> bool {
        self.just_changed = false;
        self.timer += dt.max(0.0);

        let start = self.duration * TRANSITION_START;
        self.transition_progress = if self.timer < start {
            0.0
        } else {
            ((self.timer - start) / (self.duration - start)).min(1.0)
        };

        if self.timer >= self.duration {
            self.timer = 0.0;
            self.index = (self.index + 1) % self.seasons.len();
            self.transition_progress = 0.0;
            self.just_changed = true;
            return true;
        }
        false
    }

    /// Advances by a single tick.
    pub fn tick(&mut self) -> bool {
        self.update(1.0)
    }

    pub fn current(&self) -> &Season {
        &self.seasons[self.index]
    }

    pub fn current_key(&self) -> &str {
        &self.current().key
    }

    pub fn next(&self) -> &Season {
        &self.seasons[(self.index + 1) % self.seasons.len()]
    }

    pub fn next_key(&self) -> &str {
        &self.next().key
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn timer(&self) -> f64 {
        self.timer
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn transition_progress(&self) -> f64 {
        self.transition_progress
    }

    /// True only for the update call that rolled the season over.
    pub fn just_changed(&self) -> bool {
        self.just_changed
    }

    pub fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    fn blend(&self, field: impl Fn(&Season) -> f64) -> f64 {
        let current = field(self.current());
        if self.transition_progress <= 0.0 {
            return current;
        }
        lerp(current, field(self.next()), self.transition_progress)
    }

    pub fn plant_modifier(&self, biome: &str) -> f64 {
        self.blend(|season| season.plant_modifier(biome))
    }

    pub fn hunger_modifier(&self) -> f64 {
        self.blend(|season| season.hunger)
    }

    pub fn migration_strength(&self) -> f64 {
        self.blend(|season| season.migration_strength)
    }

    pub fn preferred_elevation(&self) -> ElevationRange {
        let current = self.current().preferred_elevation;
        if self.transition_progress <= 0.0 {
            return current;
        }
        current.lerp(self.next().preferred_elevation, self.transition_progress)
    }

    /// Whether `elevation` falls inside the blended preferred band for fauna.
    pub fn prefers_elevation(&self, elevation: f64) -> bool {
        self.preferred_elevation().contains(elevation)
    }

    /// Whether `elevation` lies in the current season's dormancy zone.
    ///
    /// `_biome` does not influence the decision yet; it is kept so callers
    /// already pass the plant's biome.
    pub fn should_plant_be_dormant(&self, elevation: f64, _biome: &str) -> bool {
        let season = self.current();
        let Some(threshold) = season.dormancy_elevation else {
            return false;
        };
        if season.dormancy_chance <= 0.0 {
            return false;
        }
        match season.dormancy_zone {
            DormancyZone::Above => elevation > threshold,
            DormancyZone::Below => elevation < threshold,
        }
    }

    pub fn dormancy_chance(&self) -> f64 {
        self.current().dormancy_chance.max(0.0)
    }

    /// Guidance for every distinct living species with a known migration pattern.
    pub fn migration_messages<F: FaunaInfo>(&self, fauna: &[F]) -> Vec<MigrationMessage> {
        let mut species: Vec<&str> = Vec::new();
        for animal in fauna.iter().filter(|animal| animal.is_alive()) {
            if !species.contains(&animal.species()) {
                species.push(animal.species());
            }
        }

        let season_key = self.current_key();
        species
            .into_iter()
            .filter_map(|name| {
                let pattern = MIGRATION_PATTERNS.iter().find(|p| p.species == name)?;
                let guidance = pattern.guidance.iter().find(|g| g.season == season_key)?;
                Some(MigrationMessage {
                    species: name.to_string(),
                    current: guidance.current,
                    upcoming: guidance.upcoming,
                    hint: guidance.hint,
                })
            })
            .collect()
    }

    /// Short one-line hint, e.g. `moa: Head downhill`.
    pub fn migration_hint<F: FaunaInfo>(&self, fauna: &[F]) -> Option<String> {
        let hints: Vec<String> = self
            .migration_messages(fauna)
            .into_iter()
            .map(|message| format!("{}: {}", message.species, message.hint))
            .collect();
        if hints.is_empty() {
            None
        } else {
            Some(hints.join(", "))
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
