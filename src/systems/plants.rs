use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::{resolve_parent, World},
};

/// Advances every plant once per tick, in id order so seeded runs replay exactly.
pub struct PlantSystem;

impl PlantSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlantSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for PlantSystem {
    fn name(&self) -> &str {
        "plants"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let World {
            seasons,
            plants,
            placeables,
            ..
        } = world;
        for plant in plants.values_mut() {
            let parent = resolve_parent(placeables, plant);
            plant.update(seasons, parent, rng);
        }
        Ok(())
    }
}
