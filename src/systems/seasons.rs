use anyhow::Result;
use tracing::info;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

pub struct SeasonSystem;

impl SeasonSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SeasonSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for SeasonSystem {
    fn name(&self) -> &str {
        "seasons"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if world.seasons.update(ctx.dt) {
            let seasons = &world.seasons;
            info!(
                tick = ctx.tick,
                season = seasons.current_key(),
                next = seasons.next_key(),
                hunger = seasons.hunger_modifier(),
                "season changed"
            );
            if let Some(hint) = world.migration_hint() {
                info!(tick = ctx.tick, %hint, "migration");
            }
        }
        Ok(())
    }
}
